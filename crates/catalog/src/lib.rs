pub mod error;
pub mod models;

pub use error::CatalogError;
pub use models::*;

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Valid scheme shape once split at the `://` boundary. Compound schemes
/// like `jdbc:postgresql` are allowed.
static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.:-]*$").expect("scheme grammar"));

/// Parse a catalog document from disk.
pub fn load(catalog_path: &Path) -> Result<TableCatalog, CatalogError> {
    let raw = fs::read_to_string(catalog_path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Resolve a direct database connection URL for the declared tables.
///
/// A missing catalog file yields `Ok(None)` rather than an error. Only the
/// first declared table is consulted: routing picks a single connection for
/// the whole run. The walk is first database, table named by the part of
/// the qualified name after its first `.`, the table's connector by name;
/// the connector must be of the jdbc kind. Credentials from the connector
/// options are injected into its URL.
pub fn connection_url(
    catalog_path: &Path,
    tables: &[String],
) -> Result<Option<String>, CatalogError> {
    if !catalog_path.exists() {
        return Ok(None);
    }
    let catalog = load(catalog_path)?;

    let database = catalog
        .databases
        .first()
        .ok_or_else(|| CatalogError::inconsistent("catalog declares no databases"))?;

    let qualified = tables
        .first()
        .ok_or_else(|| CatalogError::inconsistent("no tables declared for catalog lookup"))?;
    let table_name = qualified
        .trim()
        .split_once('.')
        .map(|(_, rest)| rest)
        .ok_or_else(|| {
            CatalogError::inconsistent(format!("table name '{qualified}' is not qualified"))
        })?;

    let table = database.table(table_name).ok_or_else(|| {
        CatalogError::inconsistent(format!("table '{table_name}' not found in catalog"))
    })?;
    let connector_name = table
        .connector
        .as_ref()
        .map(|c| c.name.as_str())
        .ok_or_else(|| {
            CatalogError::inconsistent(format!(
                "table '{table_name}' declares no connector reference"
            ))
        })?;
    let connector = database.connector(connector_name).ok_or_else(|| {
        CatalogError::inconsistent(format!("connector '{connector_name}' not found in catalog"))
    })?;

    let kind = connector.str_option("connector")?;
    if kind != "jdbc" {
        return Err(CatalogError::unsupported(format!(
            "connector '{connector_name}' has kind '{kind}', expected jdbc"
        )));
    }

    let url = connector.str_option("url")?;
    let username = connector.str_option("username")?;
    let password = connector.str_option("password")?;
    Ok(Some(inject_credentials(url, username, password)?))
}

/// Rewrite `<scheme>://<rest>` as `<scheme>://<user>:<password>@<rest>`.
///
/// This is a credential-injection transform, not general URL parsing; it
/// assumes the source URL carries no credentials of its own.
fn inject_credentials(url: &str, username: &str, password: &str) -> Result<String, CatalogError> {
    let (scheme, rest) = url.split_once("://").ok_or_else(|| {
        CatalogError::inconsistent(format!("connector url '{url}' has no scheme"))
    })?;
    if !SCHEME.is_match(scheme) {
        return Err(CatalogError::inconsistent(format!(
            "connector url '{url}' has a malformed scheme"
        )));
    }
    Ok(format!("{scheme}://{username}:{password}@{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("tables.json");
        fs::write(&path, contents).unwrap();
        path
    }

    const ONE_TABLE: &str = r#"{
        "databases": [
            {
                "name": "db1",
                "tables": [
                    {"name": "t1", "connector": {"name": "c1"}}
                ],
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
    fn resolves_a_connection_url_with_injected_credentials() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, ONE_TABLE);

        let url = connection_url(&path, &["db1.t1".to_string()]).unwrap();
        assert_eq!(url.as_deref(), Some("jdbc://u:p@host:5432/db"));
    }

    #[test]
    fn compound_scheme_is_preserved() {
        let dir = TempDir::new().unwrap();
        let catalog = ONE_TABLE.replace("jdbc://host:5432/db", "jdbc:postgresql://host:5432/db");
        let path = write_catalog(&dir, &catalog);

        let url = connection_url(&path, &["db1.t1".to_string()]).unwrap();
        assert_eq!(
            url.as_deref(),
            Some("jdbc:postgresql://u:p@host:5432/db")
        );
    }

    #[test]
    fn missing_catalog_file_is_not_an_error() {
        let url = connection_url(Path::new("/no/such/catalog.json"), &["db1.t1".into()]).unwrap();
        assert_eq!(url, None);
    }

    #[test]
    fn only_the_first_table_is_consulted() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, ONE_TABLE);

        let url = connection_url(
            &path,
            &["db1.t1".to_string(), "db1.missing".to_string()],
        )
        .unwrap();
        assert!(url.is_some());
    }

    #[test]
    fn missing_table_is_a_fatal_inconsistency() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, ONE_TABLE);

        let err = connection_url(&path, &["db1.unknown".to_string()]).unwrap_err();
        assert!(matches!(err, CatalogError::Inconsistent { .. }));
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn missing_connector_is_a_fatal_inconsistency() {
        let dir = TempDir::new().unwrap();
        let catalog = ONE_TABLE.replace(r#""connector": {"name": "c1"}"#, r#""connector": {"name": "c2"}"#);
        let path = write_catalog(&dir, &catalog);

        let err = connection_url(&path, &["db1.t1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("c2"));
    }

    #[test]
    fn non_jdbc_connector_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let catalog = ONE_TABLE.replace(r#""connector": "jdbc""#, r#""connector": "kafka""#);
        let path = write_catalog(&dir, &catalog);

        let err = connection_url(&path, &["db1.t1".to_string()]).unwrap_err();
        assert!(matches!(err, CatalogError::Unsupported { .. }));
    }

    #[test]
    fn missing_option_names_the_connector_and_option() {
        let dir = TempDir::new().unwrap();
        let catalog = ONE_TABLE.replace(r#""username": "u","#, "");
        let path = write_catalog(&dir, &catalog);

        let err = connection_url(&path, &["db1.t1".to_string()]).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("c1"));
        assert!(rendered.contains("username"));
    }

    #[test]
    fn unqualified_table_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, ONE_TABLE);

        let err = connection_url(&path, &["t1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not qualified"));
    }
}
