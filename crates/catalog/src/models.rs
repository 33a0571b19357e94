use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

/// The external table-catalog document: databases, each declaring tables
/// and the connectors those tables route through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCatalog {
    pub databases: Vec<DatabaseEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableEntry>,
    #[serde(default)]
    pub connectors: Vec<ConnectorEntry>,
}

impl DatabaseEntry {
    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn connector(&self, name: &str) -> Option<&ConnectorEntry> {
        self.connectors.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    /// Reference to one of the database's declared connectors. Tables
    /// without a connector cannot be routed to a direct connection.
    #[serde(default)]
    pub connector: Option<ConnectorRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorRef {
    pub name: String,
}

/// Connector options are an open map in the document; the well-known keys
/// (`connector`, `url`, `username`, `password`) are pulled out on demand so
/// a missing one can be reported precisely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorEntry {
    pub name: String,
    #[serde(default)]
    pub options: HashMap<String, Json>,
}

impl ConnectorEntry {
    pub fn str_option(&self, option: &str) -> Result<&str, CatalogError> {
        self.options
            .get(option)
            .and_then(Json::as_str)
            .ok_or_else(|| CatalogError::missing_option(&self.name, option))
    }
}
