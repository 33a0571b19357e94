use crate::error::BackendError;
use crate::process::SqlTool;
use crate::Backend;
use tracing::debug;

/// Batch-compute backend. Native statements run through the `spark-sql`
/// command-line shell under the job's application name.
pub struct SparkBackend {
    tool: SqlTool,
}

impl SparkBackend {
    pub fn new(task_name: &str) -> Self {
        let tool = SqlTool::new("spark-sql")
            .arg("--conf")
            .arg(format!("spark.app.name={task_name}"));
        Self { tool }
    }
}

impl Backend for SparkBackend {
    fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError> {
        self.tool.run(&["-e", sql])?;
        Ok(())
    }

    fn clean(&mut self) {
        debug!("spark backend released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_is_configured_with_the_task_name() {
        let backend = SparkBackend::new("sales_count_20240101000000");
        assert_eq!(backend.tool.program(), "spark-sql");
    }
}
