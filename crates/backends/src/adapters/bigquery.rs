use crate::adapters::{AdapterError, DatabaseAdapter};
use crate::process::SqlTool;
use std::path::Path;

/// Statement execution through the `bq` command-line client, authenticated
/// with a service-account credential file.
#[derive(Debug)]
pub struct BigQueryAdapter {
    tool: SqlTool,
}

impl BigQueryAdapter {
    pub fn new(credential_file: &str) -> Result<Self, AdapterError> {
        if !Path::new(credential_file).exists() {
            return Err(AdapterError::config(format!(
                "bigquery credential file not found: {credential_file}"
            )));
        }
        let tool = SqlTool::new("bq")
            .env("GOOGLE_APPLICATION_CREDENTIALS", credential_file)
            .arg("query")
            .arg("--nouse_legacy_sql");
        Ok(Self { tool })
    }
}

impl DatabaseAdapter for BigQueryAdapter {
    fn execute(&mut self, sql: &str) -> Result<(), AdapterError> {
        self.tool.run(&[sql])?;
        Ok(())
    }
}
