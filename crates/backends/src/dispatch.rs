use crate::adapters::{create_db_adapter, DatabaseAdapter};
use crate::error::BackendError;
use crate::flink::FlinkBackend;
use crate::maxcompute::{MaxComputeBackend, MaxComputeParams};
use crate::rdb::RdbBackend;
use crate::spark::SparkBackend;
use crate::Backend;
use common::utils::resolve_file;
use etl_core::config::{BackendType, EtlConfig, EtlType};
use etl_core::parser;
use std::env;
use std::path::Path;
use tracing::info;

/// Connection material read from the process environment, once, at the
/// boundary. The dispatcher itself never touches the environment.
#[derive(Debug, Clone, Default)]
pub struct BackendEnv {
    pub pg_url: Option<String>,
    pub clickhouse_url: Option<String>,
    pub bigquery_credential_file: Option<String>,
}

impl BackendEnv {
    pub fn from_env() -> Self {
        Self {
            pg_url: env::var("PG_URL").ok(),
            clickhouse_url: env::var("CLICKHOUSE_URL").ok(),
            bigquery_credential_file: env::var("BIGQUERY_CREDENTIAL_FILE").ok(),
        }
    }
}

enum StatementChannel {
    Backend,
    Direct(Box<dyn DatabaseAdapter>),
}

/// The exclusively-owned backend handle for one run, plus the channel its
/// preparatory statements are bound to.
///
/// For most backends the channel is the backend itself; a flink run with a
/// table catalog and declared tables binds statements to a direct database
/// connection instead.
pub struct DispatchedBackend {
    backend: Box<dyn Backend>,
    channel: StatementChannel,
}

impl std::fmt::Debug for DispatchedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchedBackend").finish_non_exhaustive()
    }
}

impl DispatchedBackend {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            channel: StatementChannel::Backend,
        }
    }

    pub fn with_direct_channel(
        backend: Box<dyn Backend>,
        adapter: Box<dyn DatabaseAdapter>,
    ) -> Self {
        Self {
            backend,
            channel: StatementChannel::Direct(adapter),
        }
    }

    /// Run a native statement through the bound channel.
    pub fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError> {
        match &mut self.channel {
            StatementChannel::Backend => self.backend.exec_native_sql(sql),
            StatementChannel::Direct(adapter) => {
                adapter.execute(sql)?;
                Ok(())
            }
        }
    }

    pub fn temp_schema(&self) -> Option<String> {
        self.backend.temp_schema()
    }

    /// Release the backend and any direct connection. Called exactly once
    /// per run, on every exit path.
    pub fn clean(&mut self) {
        if let StatementChannel::Direct(adapter) = &mut self.channel {
            adapter.close();
        }
        self.backend.clean();
    }
}

/// Select, construct and prepare the backend for a run.
///
/// The factory maps the configured backend type onto its implementation,
/// then executes every `-- prepare-sql:` statement in file order through
/// the bound channel. If preparation fails the backend is released before
/// the error surfaces.
pub fn create_backend(
    config: &EtlConfig,
    backend_env: &BackendEnv,
) -> Result<DispatchedBackend, BackendError> {
    let dispatched = match config.backend {
        BackendType::Spark => {
            let task_name = config.task_name()?;
            DispatchedBackend::new(Box::new(SparkBackend::new(&task_name)))
        }
        BackendType::Flink => flink_backend(config)?,
        BackendType::MaxCompute => {
            DispatchedBackend::new(Box::new(MaxComputeBackend::new(MaxComputeParams::default())))
        }
        BackendType::Postgres => {
            let url = require_env(&backend_env.pg_url, "PG_URL", "postgres")?;
            DispatchedBackend::new(Box::new(RdbBackend::from_url(url)?))
        }
        BackendType::Clickhouse => {
            let url = require_env(&backend_env.clickhouse_url, "CLICKHOUSE_URL", "clickhouse")?;
            DispatchedBackend::new(Box::new(RdbBackend::from_url(url)?))
        }
        BackendType::BigQuery => {
            let credential_file = require_env(
                &backend_env.bigquery_credential_file,
                "BIGQUERY_CREDENTIAL_FILE",
                "bigquery",
            )?;
            DispatchedBackend::new(Box::new(RdbBackend::bigquery(credential_file)?))
        }
    };

    prepared(dispatched, &config.sql)
}

/// Flink runs bind statements to a direct database connection when a table
/// catalog is declared alongside input/output tables; the declared tables
/// are registered with the backend either way.
fn flink_backend(config: &EtlConfig) -> Result<DispatchedBackend, BackendError> {
    let batch = config.tool_conf.etl_type == EtlType::Batch;
    let mut backend = FlinkBackend::new(batch);

    let Some(tables_file) = &config.tool_conf.flink_tables_file_path else {
        return Ok(DispatchedBackend::new(Box::new(backend)));
    };
    let resolved = resolve_file(tables_file, true)?;
    let catalog_path = Path::new(&resolved);

    let adapter = if config.tables.is_empty() {
        None
    } else {
        catalog::connection_url(catalog_path, &config.tables)?
            .map(|url| create_db_adapter(&url))
            .transpose()?
    };
    backend.register_tables(catalog_path, &config.tables)?;

    Ok(match adapter {
        Some(adapter) => DispatchedBackend::with_direct_channel(Box::new(backend), adapter),
        None => DispatchedBackend::new(Box::new(backend)),
    })
}

fn require_env<'a>(
    value: &'a Option<String>,
    var: &str,
    backend: &str,
) -> Result<&'a str, BackendError> {
    value
        .as_deref()
        .ok_or_else(|| BackendError::missing_env_var(var, backend))
}

fn prepared(
    mut dispatched: DispatchedBackend,
    sql: &str,
) -> Result<DispatchedBackend, BackendError> {
    if let Err(err) = run_prepare_statements(&mut dispatched, sql) {
        dispatched.clean();
        return Err(err);
    }
    Ok(dispatched)
}

fn run_prepare_statements(
    dispatched: &mut DispatchedBackend,
    sql: &str,
) -> Result<(), BackendError> {
    for statement in parser::prepare_statements(sql) {
        info!("executing prepare-sql statement");
        dispatched.exec_native_sql(&statement)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        statements: Vec<String>,
        clean_calls: usize,
        fail_on: Option<String>,
    }

    struct MockBackend {
        recorder: Arc<Mutex<Recorder>>,
    }

    impl MockBackend {
        fn new(recorder: Arc<Mutex<Recorder>>) -> Box<Self> {
            Box::new(Self { recorder })
        }
    }

    impl Backend for MockBackend {
        fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError> {
            let mut recorder = self.recorder.lock().unwrap();
            if recorder.fail_on.as_deref() == Some(sql) {
                return Err(BackendError::failed_to_execute(format!(
                    "statement rejected: {sql}"
                )));
            }
            recorder.statements.push(sql.to_string());
            Ok(())
        }

        fn clean(&mut self) {
            self.recorder.lock().unwrap().clean_calls += 1;
        }
    }

    #[test]
    fn prepare_statements_run_in_file_order_before_returning() {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let sql = "\
-- prepare-sql: drop table if exists t1
select 1;
-- prepare-sql: create table t1 as select 2
";
        let dispatched = DispatchedBackend::new(MockBackend::new(recorder.clone()));
        prepared(dispatched, sql).unwrap();

        let recorder = recorder.lock().unwrap();
        assert_eq!(
            recorder.statements,
            vec![
                "drop table if exists t1".to_string(),
                "create table t1 as select 2".to_string(),
            ]
        );
        assert_eq!(recorder.clean_calls, 0);
    }

    #[test]
    fn failed_preparation_releases_the_backend_once() {
        let recorder = Arc::new(Mutex::new(Recorder {
            fail_on: Some("create table t1 as select 2".to_string()),
            ..Recorder::default()
        }));
        let sql = "\
-- prepare-sql: drop table if exists t1
-- prepare-sql: create table t1 as select 2
";
        let dispatched = DispatchedBackend::new(MockBackend::new(recorder.clone()));
        let err = prepared(dispatched, sql).unwrap_err();
        assert!(matches!(err, BackendError::FailedToExecute { .. }));

        let recorder = recorder.lock().unwrap();
        assert_eq!(recorder.statements, vec!["drop table if exists t1"]);
        assert_eq!(recorder.clean_calls, 1);
    }

    #[test]
    fn missing_env_var_names_the_exact_variable() {
        let cases = [
            ("postgres", "PG_URL"),
            ("clickhouse", "CLICKHOUSE_URL"),
            ("bigquery", "BIGQUERY_CREDENTIAL_FILE"),
        ];
        for (backend, var) in cases {
            let sql = format!("-- backend: {backend}\nselect 1;\n");
            let config = EtlConfig::from_sql_text(&sql).unwrap();
            let err = create_backend(&config, &BackendEnv::default()).unwrap_err();
            assert!(matches!(err, BackendError::MissingEnvVar { .. }));
            assert!(
                err.to_string().contains(var),
                "error for {backend} should name {var}: {err}"
            );
        }
    }

    #[test]
    fn flink_without_catalog_binds_statements_to_the_backend() {
        let config = EtlConfig::from_sql_text("-- backend: flink\nselect 1;\n").unwrap();
        let dispatched = create_backend(&config, &BackendEnv::default()).unwrap();
        assert!(matches!(dispatched.channel, StatementChannel::Backend));
    }
}
