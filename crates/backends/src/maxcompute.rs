use crate::error::BackendError;
use crate::process::SqlTool;
use crate::Backend;
use tracing::debug;

/// Connection parameters for the columnar warehouse. Deployments construct
/// these explicitly; the defaults are placeholders.
#[derive(Debug, Clone)]
pub struct MaxComputeParams {
    pub access_id: String,
    pub access_key: String,
    pub project: String,
    pub endpoint: String,
}

impl Default for MaxComputeParams {
    fn default() -> Self {
        Self {
            access_id: "xx".to_string(),
            access_key: "xx".to_string(),
            project: "xx".to_string(),
            endpoint: "xx".to_string(),
        }
    }
}

/// Columnar-warehouse backend. Native statements run through the `odpscmd`
/// client bound to the configured project and endpoint.
pub struct MaxComputeBackend {
    tool: SqlTool,
}

impl MaxComputeBackend {
    pub fn new(params: MaxComputeParams) -> Self {
        let tool = SqlTool::new("odpscmd")
            .arg("-u")
            .arg(params.access_id)
            .arg("-p")
            .arg(params.access_key)
            .arg(format!("--project={}", params.project))
            .arg(format!("--endpoint={}", params.endpoint));
        Self { tool }
    }
}

impl Backend for MaxComputeBackend {
    fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError> {
        self.tool.run(&["-e", sql])?;
        Ok(())
    }

    fn clean(&mut self) {
        debug!("maxcompute backend released");
    }
}
