use crate::error::BackendError;
use crate::process::SqlTool;
use crate::Backend;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Streaming backend. Statements are staged as one-shot scripts for the
/// flink sql client, pinned to the run's execution mode.
pub struct FlinkBackend {
    batch: bool,
    tool: SqlTool,
    registered: Vec<(PathBuf, Vec<String>)>,
}

impl FlinkBackend {
    pub fn new(batch: bool) -> Self {
        Self {
            batch,
            tool: SqlTool::new("sql-client.sh"),
            registered: Vec::new(),
        }
    }

    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// Record the declared tables against the catalog file, checking each
    /// one is actually present in the document.
    pub fn register_tables(
        &mut self,
        catalog_path: &Path,
        tables: &[String],
    ) -> Result<(), BackendError> {
        if tables.is_empty() {
            return Ok(());
        }
        let document = catalog::load(catalog_path)?;
        for qualified in tables {
            let bare = qualified
                .trim()
                .split_once('.')
                .map(|(_, rest)| rest)
                .unwrap_or(qualified.trim());
            if !document.databases.iter().any(|db| db.table(bare).is_some()) {
                warn!(
                    "table {qualified} is not declared in {}",
                    catalog_path.display()
                );
            }
        }
        info!(
            "registered {} tables from {}",
            tables.len(),
            catalog_path.display()
        );
        self.registered
            .push((catalog_path.to_path_buf(), tables.to_vec()));
        Ok(())
    }

    pub fn registered_tables(&self) -> &[(PathBuf, Vec<String>)] {
        &self.registered
    }

    fn stage_script(&self, sql: &str) -> Result<NamedTempFile, BackendError> {
        let mode = if self.batch { "batch" } else { "streaming" };
        let mut file = NamedTempFile::new()
            .map_err(|e| BackendError::io("failed to stage flink statement", e))?;
        writeln!(file, "SET 'execution.runtime-mode' = '{mode}';")
            .and_then(|_| writeln!(file, "{sql};"))
            .map_err(|e| BackendError::io("failed to stage flink statement", e))?;
        Ok(file)
    }
}

impl Backend for FlinkBackend {
    fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError> {
        let script = self.stage_script(sql)?;
        let path = script.path().to_str().ok_or_else(|| {
            BackendError::config("staged flink script path is not valid utf-8")
        })?;
        self.tool.run(&["-f", path])?;
        Ok(())
    }

    fn clean(&mut self) {
        debug!("flink backend released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "databases": [
            {
                "name": "db1",
                "tables": [{"name": "t1", "connector": {"name": "c1"}}],
                "connectors": [
                    {
                        "name": "c1",
                        "options": {
                            "connector": "jdbc",
                            "url": "jdbc://host:5432/db",
                            "username": "u",
                            "password": "p"
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn staged_script_pins_the_runtime_mode() {
        let backend = FlinkBackend::new(true);
        let script = backend.stage_script("select 1").unwrap();
        let contents = fs::read_to_string(script.path()).unwrap();
        assert_eq!(
            contents,
            "SET 'execution.runtime-mode' = 'batch';\nselect 1;\n"
        );

        let streaming = FlinkBackend::new(false);
        let script = streaming.stage_script("select 2").unwrap();
        let contents = fs::read_to_string(script.path()).unwrap();
        assert!(contents.starts_with("SET 'execution.runtime-mode' = 'streaming';"));
    }

    #[test]
    fn register_tables_records_the_catalog_and_names() {
        let dir = TempDir::new().unwrap();
        let catalog_path = dir.path().join("tables.json");
        fs::write(&catalog_path, CATALOG).unwrap();

        let mut backend = FlinkBackend::new(true);
        backend
            .register_tables(&catalog_path, &["db1.t1".to_string()])
            .unwrap();

        assert_eq!(backend.registered_tables().len(), 1);
        assert_eq!(backend.registered_tables()[0].1, vec!["db1.t1"]);
    }

    #[test]
    fn registering_no_tables_skips_the_catalog_read() {
        let mut backend = FlinkBackend::new(true);
        backend
            .register_tables(Path::new("/no/such/catalog.json"), &[])
            .unwrap();
        assert!(backend.registered_tables().is_empty());
    }
}
