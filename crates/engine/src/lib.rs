pub mod error;
pub mod processor;

pub use error::EngineError;
pub use processor::SqlProcessor;

use backends::{create_backend, BackendEnv, DispatchedBackend};
use common::utils::resolve_file;
use etl_core::config::{BackendType, EtlConfig};
use std::collections::HashMap;

/// Dispatch a backend for the configuration and run the script through it.
///
/// The backend is acquired once and released exactly once, whether the run
/// succeeds or fails.
pub fn execute(
    config: &EtlConfig,
    backend_env: &BackendEnv,
    vars: HashMap<String, String>,
    dry_run: bool,
) -> Result<(), EngineError> {
    let backend = create_backend(config, backend_env)?;

    let mut variables = HashMap::new();
    if config.backend == BackendType::BigQuery {
        if let Some(temp_schema) = backend.temp_schema() {
            variables.insert("temp_db".to_string(), temp_schema);
        }
    }
    // user-supplied variables win over the pre-defined ones
    variables.extend(vars);

    run_and_release(backend, config, variables, dry_run)
}

/// Run the main processing phase, then release the backend on every path.
pub fn run_and_release(
    mut backend: DispatchedBackend,
    config: &EtlConfig,
    variables: HashMap<String, String>,
    dry_run: bool,
) -> Result<(), EngineError> {
    let result = run_with_vars(&mut backend, config, variables, dry_run);
    backend.clean();
    result
}

fn run_with_vars(
    backend: &mut DispatchedBackend,
    config: &EtlConfig,
    variables: HashMap<String, String>,
    dry_run: bool,
) -> Result<(), EngineError> {
    let scala_udf_initializer = config.tool_conf.scala_udf_initializer.clone();
    let udf_file = config.tool_conf.udf_file_path.clone();
    let func_file = config.tool_conf.func_file_path.clone();

    let mut processor = SqlProcessor::new(backend, &config.sql, variables, scala_udf_initializer);
    if let Some(path) = udf_file {
        processor.register_udfs_from_file(&registration_path(&path)?)?;
    }
    if let Some(path) = func_file {
        processor.register_funcs_from_file(&registration_path(&path)?)?;
    }
    processor.run(dry_run)
}

/// Paths with directory components are resolved on disk; bare module names
/// are handed to the engine as-is.
fn registration_path(path: &str) -> Result<String, EngineError> {
    if path.contains('/') {
        Ok(resolve_file(path, false)?)
    } else {
        Ok(path.to_string())
    }
}
