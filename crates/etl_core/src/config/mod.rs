use crate::error::ConfigError;
use crate::parser;
use common::utils::resolve_file;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// All execution targets a sql script may select with `-- backend:`.
pub const SUPPORTED_BACKENDS: &[&str] = &[
    "spark",
    "postgres",
    "clickhouse",
    "maxcompute",
    "bigquery",
    "flink",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Spark,
    Postgres,
    Clickhouse,
    MaxCompute,
    BigQuery,
    Flink,
}

impl FromStr for BackendType {
    type Err = ConfigError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "spark" => Ok(Self::Spark),
            "postgres" => Ok(Self::Postgres),
            "clickhouse" => Ok(Self::Clickhouse),
            "maxcompute" => Ok(Self::MaxCompute),
            "bigquery" => Ok(Self::BigQuery),
            "flink" => Ok(Self::Flink),
            other => Err(ConfigError::unsupported_backend(other, SUPPORTED_BACKENDS)),
        }
    }
}

impl Display for BackendType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spark => "spark",
            Self::Postgres => "postgres",
            Self::Clickhouse => "clickhouse",
            Self::MaxCompute => "maxcompute",
            Self::BigQuery => "bigquery",
            Self::Flink => "flink",
        };
        f.write_str(name)
    }
}

/// A raw `key=value` setting forwarded to the backend's submission layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Split `raw` at its first `=`. Anything without a separator is a fatal
    /// configuration error.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.split_once('=') {
            Some((key, value)) => Ok(Self::new(key.trim(), value.trim())),
            None => Err(ConfigError::malformed_override(raw)),
        }
    }
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Flink execution mode, selected with `easy_sql.etl_type`.
///
/// `batch` selects batch mode; every other value selects streaming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EtlType {
    #[default]
    Batch,
    Streaming,
}

impl EtlType {
    pub fn from_value(value: &str) -> Self {
        if value.trim() == "batch" {
            Self::Batch
        } else {
            Self::Streaming
        }
    }
}

/// A `config:` override consumed by this tool itself rather than forwarded
/// to the backend. Classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOverride {
    UdfFilePath(String),
    FuncFilePath(String),
    FlinkTablesFilePath(String),
    ScalaUdfInitializer(String),
    EtlType(String),
    SparkSubmit(String),
    FlinkRun(String),
}

impl ToolOverride {
    /// Map a `key=value` pair from the reserved namespace onto a named
    /// field. Unknown keys yield `None` and are reported by the caller.
    pub fn from_key_value(kv: &KeyValue) -> Option<Self> {
        let value = kv.value.clone();
        match kv.key.as_str() {
            "udf_file_path" => Some(Self::UdfFilePath(value)),
            "func_file_path" => Some(Self::FuncFilePath(value)),
            "flink_tables_file_path" => Some(Self::FlinkTablesFilePath(value)),
            "scala_udf_initializer" => Some(Self::ScalaUdfInitializer(value)),
            "etl_type" => Some(Self::EtlType(value)),
            "spark_submit" => Some(Self::SparkSubmit(value)),
            "flink_run" => Some(Self::FlinkRun(value)),
            _ => None,
        }
    }
}

/// The named tool-side settings. The last directive for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolConf {
    pub udf_file_path: Option<String>,
    pub func_file_path: Option<String>,
    pub flink_tables_file_path: Option<String>,
    pub scala_udf_initializer: Option<String>,
    pub etl_type: EtlType,
    spark_submit: Option<String>,
    flink_run: Option<String>,
}

impl ToolConf {
    pub fn apply(&mut self, tool_override: ToolOverride) {
        match tool_override {
            ToolOverride::UdfFilePath(v) => self.udf_file_path = Some(v),
            ToolOverride::FuncFilePath(v) => self.func_file_path = Some(v),
            ToolOverride::FlinkTablesFilePath(v) => self.flink_tables_file_path = Some(v),
            ToolOverride::ScalaUdfInitializer(v) => self.scala_udf_initializer = Some(v),
            ToolOverride::EtlType(v) => self.etl_type = EtlType::from_value(&v),
            ToolOverride::SparkSubmit(v) => self.spark_submit = Some(v),
            ToolOverride::FlinkRun(v) => self.flink_run = Some(v),
        }
    }

    /// Submit binary for spark jobs; the directive override takes precedence
    /// over the binary found on PATH.
    pub fn spark_submit(&self) -> &str {
        self.spark_submit.as_deref().unwrap_or("spark-submit")
    }

    /// Binary used for `flink run` submissions.
    pub fn flink_run(&self) -> &str {
        self.flink_run.as_deref().unwrap_or("flink")
    }
}

/// Configuration derived from one directive scan over a sql source.
///
/// Built once per invocation and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub sql_file: Option<PathBuf>,
    pub sql: String,
    pub backend: BackendType,
    pub tables: Vec<String>,
    pub engine_conf: Vec<KeyValue>,
    pub tool_conf: ToolConf,
}

impl EtlConfig {
    /// Build a configuration from a sql file on disk.
    pub fn from_file(sql_file: &str) -> Result<Self, ConfigError> {
        if !sql_file.ends_with(".sql") {
            return Err(ConfigError::invalid_sql_file(format!(
                "sql file must end with .sql, found `{sql_file}`"
            )));
        }
        let resolved = resolve_file(sql_file, false)?;
        let sql = fs::read_to_string(&resolved)?;
        Self::build(Some(PathBuf::from(resolved)), sql)
    }

    /// Build a configuration from inline sql text. Operations that need a
    /// backing file ([`EtlConfig::task_name`], the submit helpers) will fail
    /// on the result.
    pub fn from_sql_text(sql: &str) -> Result<Self, ConfigError> {
        Self::build(None, sql.to_string())
    }

    fn build(sql_file: Option<PathBuf>, sql: String) -> Result<Self, ConfigError> {
        let backend = parser::parse_backend(&sql)?;
        let tables = parser::parse_tables(&sql);
        let (engine_conf, tool_conf) = parser::parse_config_directives(&sql)?;
        Ok(Self {
            sql_file,
            sql,
            backend,
            tables,
            engine_conf,
            tool_conf,
        })
    }

    pub(crate) fn sql_file_str(&self) -> Result<&str, ConfigError> {
        self.sql_file
            .as_deref()
            .and_then(|p| p.to_str())
            .ok_or_else(|| ConfigError::missing_sql_file("this operation"))
    }

    /// Job name: sql file stem plus a submission timestamp.
    pub fn task_name(&self) -> Result<String, ConfigError> {
        let stem = self
            .sql_file
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::missing_sql_file("task_name"))?;
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        Ok(format!("{stem}_{stamp}"))
    }
}
