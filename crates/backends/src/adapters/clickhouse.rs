use crate::adapters::{AdapterError, DatabaseAdapter, DbUrl};
use tokio::runtime::Runtime;

const DEFAULT_HTTP_PORT: u16 = 8123;

/// Statement execution over the ClickHouse HTTP interface.
pub struct ClickhouseAdapter {
    runtime: Runtime,
    client: reqwest::Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
}

impl ClickhouseAdapter {
    pub fn connect(url: &DbUrl) -> Result<Self, AdapterError> {
        let runtime = Runtime::new()
            .map_err(|e| AdapterError::io("failed to start database runtime", e))?;
        let endpoint = format!(
            "http://{}:{}/",
            url.host,
            url.port.unwrap_or(DEFAULT_HTTP_PORT)
        );
        Ok(Self {
            runtime,
            client: reqwest::Client::new(),
            endpoint,
            username: url.username.clone(),
            password: url.password.clone(),
            database: url.database.clone(),
        })
    }
}

impl DatabaseAdapter for ClickhouseAdapter {
    fn execute(&mut self, sql: &str) -> Result<(), AdapterError> {
        let mut request = self.client.post(&self.endpoint).body(sql.to_string());
        if let Some(database) = &self.database {
            request = request.query(&[("database", database)]);
        }
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|e| AdapterError::unexpected(format!("clickhouse request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = self
                .runtime
                .block_on(response.text())
                .unwrap_or_else(|_| String::new());
            let message = format!("clickhouse returned {status}: {body}");
            return Err(if status.is_client_error() {
                AdapterError::syntax(message)
            } else {
                AdapterError::unexpected(message)
            });
        }
        Ok(())
    }
}
