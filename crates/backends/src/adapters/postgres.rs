use crate::adapters::{AdapterError, DatabaseAdapter, DbUrl};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};
use tracing::error;

impl From<tokio_postgres::Error> for AdapterError {
    #[track_caller]
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let code = db_err.code();
            if code == &SqlState::CONNECTION_DOES_NOT_EXIST {
                AdapterError::invalid_connection(db_err.to_string())
            } else if code == &SqlState::SYNTAX_ERROR {
                AdapterError::syntax(db_err.to_string())
            } else {
                AdapterError::unexpected(db_err.to_string())
            }
        } else {
            AdapterError::unexpected(err.to_string())
        }
    }
}

/// Blocking postgres connection over an owned runtime.
pub struct PostgresAdapter {
    runtime: Runtime,
    client: Client,
    driver: JoinHandle<()>,
}

impl PostgresAdapter {
    /// Connect and spawn the connection driver in the background.
    pub fn connect(url: &DbUrl) -> Result<Self, AdapterError> {
        let runtime = Runtime::new()
            .map_err(|e| AdapterError::io("failed to start database runtime", e))?;
        let conn_str = conn_string(url);
        let (client, connection) = runtime.block_on(tokio_postgres::connect(&conn_str, NoTls))?;
        // Drive the connection I/O for as long as the adapter lives.
        let driver = runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!("postgres driver task exited: {e}");
            }
        });
        Ok(Self {
            runtime,
            client,
            driver,
        })
    }
}

fn conn_string(url: &DbUrl) -> String {
    let mut conn_str = format!(
        "host={} port={} user={}",
        url.host,
        url.port.unwrap_or(5432),
        url.username.as_deref().unwrap_or("postgres"),
    );
    if let Some(password) = &url.password {
        conn_str.push_str(&format!(" password={password}"));
    }
    if let Some(database) = &url.database {
        conn_str.push_str(&format!(" dbname={database}"));
    }
    conn_str
}

impl DatabaseAdapter for PostgresAdapter {
    fn execute(&mut self, sql: &str) -> Result<(), AdapterError> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }

    fn close(&mut self) {
        self.driver.abort();
    }
}
