pub mod adapters;
pub mod dispatch;
pub mod error;
pub mod flink;
pub mod maxcompute;
pub mod process;
pub mod rdb;
pub mod spark;

pub use dispatch::{create_backend, BackendEnv, DispatchedBackend};
pub use error::BackendError;

/// A pluggable execution target for native sql statements.
///
/// One implementation exists per supported backend type; the dispatcher
/// selects and constructs it once per run. The handle is exclusively owned
/// by the invocation that built it.
pub trait Backend {
    /// Execute a statement through the backend's native sql channel.
    fn exec_native_sql(&mut self, sql: &str) -> Result<(), BackendError>;

    /// Release everything the backend holds. Invoked exactly once per run,
    /// on success and on failure alike.
    fn clean(&mut self);

    /// Schema for temporary objects, when the backend maintains one.
    fn temp_schema(&self) -> Option<String> {
        None
    }
}
