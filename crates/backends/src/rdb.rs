use crate::adapters::{bigquery::BigQueryAdapter, create_db_adapter, DatabaseAdapter};
use crate::error::BackendError;
use crate::Backend;

/// Relational backend over a live database adapter. Covers postgres,
/// clickhouse and bigquery, which connect directly from within the process
/// instead of going through a submit tool.
pub struct RdbBackend {
    adapter: Box<dyn DatabaseAdapter>,
    temp_schema: Option<String>,
}

impl RdbBackend {
    pub fn from_url(url: &str) -> Result<Self, BackendError> {
        Ok(Self {
            adapter: create_db_adapter(url)?,
            temp_schema: None,
        })
    }

    pub fn bigquery(credential_file: &str) -> Result<Self, BackendError> {
        let adapter = Box::new(BigQueryAdapter::new(credential_file)?);
        let temp_schema = format!("temp_{}", chrono::Local::now().format("%Y%m%d"));
        Ok(Self {
            adapter,
            temp_schema: Some(temp_schema),
        })
    }
}

impl Backend for RdbBackend {
    fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError> {
        self.adapter.execute(sql)?;
        Ok(())
    }

    fn clean(&mut self) {
        self.adapter.close();
    }

    fn temp_schema(&self) -> Option<String> {
        self.temp_schema.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn bigquery_backend_exposes_a_temp_schema() {
        let dir = TempDir::new().unwrap();
        let credential = dir.path().join("credential.json");
        fs::write(&credential, "{}").unwrap();

        let backend = RdbBackend::bigquery(credential.to_str().unwrap()).unwrap();
        let temp_schema = backend.temp_schema().unwrap();
        assert!(temp_schema.starts_with("temp_"));
    }
}
