use crate::error::EngineError;
use backends::DispatchedBackend;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("variable grammar"));

/// Executes the transformation statements of one sql script against a
/// dispatched backend.
///
/// Variables are substituted as `${name}`; unknown variables are left in
/// place. Directive and comment lines never reach the backend.
pub struct SqlProcessor<'a> {
    backend: &'a mut DispatchedBackend,
    sql: String,
    variables: HashMap<String, String>,
    scala_udf_initializer: Option<String>,
    udf_files: Vec<String>,
    func_files: Vec<String>,
}

impl<'a> SqlProcessor<'a> {
    pub fn new(
        backend: &'a mut DispatchedBackend,
        sql: &str,
        variables: HashMap<String, String>,
        scala_udf_initializer: Option<String>,
    ) -> Self {
        Self {
            backend,
            sql: sql.to_string(),
            variables,
            scala_udf_initializer,
            udf_files: Vec::new(),
            func_files: Vec::new(),
        }
    }

    pub fn register_udfs_from_file(&mut self, path: &str) -> Result<(), EngineError> {
        Self::check_registration_file(path)?;
        info!("registering UDFs from {path}");
        self.udf_files.push(path.to_string());
        Ok(())
    }

    pub fn register_funcs_from_file(&mut self, path: &str) -> Result<(), EngineError> {
        Self::check_registration_file(path)?;
        info!("registering functions from {path}");
        self.func_files.push(path.to_string());
        Ok(())
    }

    fn check_registration_file(path: &str) -> Result<(), EngineError> {
        if !Path::new(path).exists() {
            return Err(EngineError::registration(format!(
                "registration file not found: {path}"
            )));
        }
        Ok(())
    }

    pub fn run(&mut self, dry_run: bool) -> Result<(), EngineError> {
        if let Some(initializer) = &self.scala_udf_initializer {
            debug!("scala udf initializer: {initializer}");
        }
        if !self.udf_files.is_empty() || !self.func_files.is_empty() {
            debug!(
                "shipping registrations: udfs={:?} funcs={:?}",
                self.udf_files, self.func_files
            );
        }
        for statement in self.statements() {
            if dry_run {
                info!("dry run, skipping: {statement}");
                continue;
            }
            self.backend.exec_native_sql(&statement)?;
        }
        Ok(())
    }

    fn statements(&self) -> Vec<String> {
        let body: Vec<&str> = self
            .sql
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect();
        let substituted = substitute_variables(&body.join("\n"), &self.variables);
        substituted
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

fn substitute_variables(sql: &str, variables: &HashMap<String, String>) -> String {
    VARIABLE
        .replace_all(sql, |caps: &regex::Captures<'_>| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_substituted() {
        let variables = HashMap::from([
            ("data_date".to_string(), "2024-01-01".to_string()),
            ("temp_db".to_string(), "tmp".to_string()),
        ]);
        let substituted = substitute_variables(
            "insert into ${temp_db}.t select * from src where dt = '${data_date}'",
            &variables,
        );
        assert_eq!(
            substituted,
            "insert into tmp.t select * from src where dt = '2024-01-01'"
        );
    }

    #[test]
    fn unknown_variables_are_left_in_place() {
        let substituted = substitute_variables("select ${unknown}", &HashMap::new());
        assert_eq!(substituted, "select ${unknown}");
    }
}
