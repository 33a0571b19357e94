use crate::config::{BackendType, KeyValue, ToolConf, ToolOverride};
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Grammar for directive lines. A line is a directive only if, after
/// trimming, it starts with two hyphens, optional whitespace and a known
/// keyword; keyword matching is case-sensitive and nothing may precede the
/// hyphens.
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^--\s*(backend|inputs|outputs|config|prepare-sql):(.*)$")
        .expect("directive grammar")
});

/// Namespace of overrides consumed by this tool instead of the backend.
const TOOL_NAMESPACE: &str = "easy_sql.";

/// One recognized comment line, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Backend(String),
    Inputs(String),
    Outputs(String),
    Config(String),
    PrepareSql(String),
}

/// Scan the sql text for directive lines. Pure function of the text.
pub fn scan(sql: &str) -> Vec<Directive> {
    sql.lines()
        .filter_map(|line| {
            let caps = DIRECTIVE.captures(line.trim())?;
            let value = caps[2].trim().to_string();
            let directive = match &caps[1] {
                "backend" => Directive::Backend(value),
                "inputs" => Directive::Inputs(value),
                "outputs" => Directive::Outputs(value),
                "config" => Directive::Config(value),
                "prepare-sql" => Directive::PrepareSql(value),
                _ => unreachable!("keyword restricted by the grammar"),
            };
            Some(directive)
        })
        .collect()
}

/// The backend selected by the first `backend:` directive, `spark` when the
/// script declares none. Only the first whitespace-delimited token counts;
/// trailing annotations on the line are ignored.
pub fn parse_backend(sql: &str) -> Result<BackendType, ConfigError> {
    for directive in scan(sql) {
        if let Directive::Backend(value) = directive {
            let token = value.split_whitespace().next().unwrap_or("");
            return token.parse();
        }
    }
    Ok(BackendType::Spark)
}

/// All qualified table names declared via `inputs:`/`outputs:`, deduplicated.
pub fn parse_tables(sql: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for directive in scan(sql) {
        let value = match directive {
            Directive::Inputs(value) | Directive::Outputs(value) => value,
            _ => continue,
        };
        for table in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tables.iter().any(|t| t == table) {
                tables.push(table.to_string());
            }
        }
    }
    tables
}

/// Collect every `config:` directive, classifying each value into an engine
/// override (forwarded as-is) or a named tool override.
pub fn parse_config_directives(sql: &str) -> Result<(Vec<KeyValue>, ToolConf), ConfigError> {
    let mut engine_conf = Vec::new();
    let mut tool_conf = ToolConf::default();

    for directive in scan(sql) {
        let Directive::Config(value) = directive else {
            continue;
        };
        if value.to_lowercase().starts_with(TOOL_NAMESPACE) {
            let kv = KeyValue::parse(&value[TOOL_NAMESPACE.len()..])?;
            match ToolOverride::from_key_value(&kv) {
                Some(tool_override) => tool_conf.apply(tool_override),
                None => warn!("ignoring unknown tool config key `{}`", kv.key),
            }
        } else {
            engine_conf.push(KeyValue::parse(&value)?);
        }
    }

    Ok((engine_conf, tool_conf))
}

/// Statements declared with `-- prepare-sql:`, in file order. They run
/// through the dispatched backend before the main processing phase.
pub fn prepare_statements(sql: &str) -> Vec<String> {
    scan(sql)
        .into_iter()
        .filter_map(|directive| match directive {
            Directive::PrepareSql(statement) => Some(statement),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EtlConfig, EtlType};

    const SAMPLE: &str = "\
-- backend: flink streaming-annotation
-- inputs: db1.orders, db1.customers
-- outputs: dm.sales_count
--  config: spark.executor.memory=2g
-- config: easy_sql.udf_file_path=udfs/math.py
-- config: easy_sql.etl_type=streaming
select * from db1.orders;
";

    #[test]
    fn parsing_is_idempotent() {
        let first = EtlConfig::from_sql_text(SAMPLE).unwrap();
        let second = EtlConfig::from_sql_text(SAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn backend_takes_the_first_token_only() {
        assert_eq!(parse_backend(SAMPLE).unwrap(), BackendType::Flink);
    }

    #[test]
    fn backend_defaults_to_spark() {
        assert_eq!(
            parse_backend("select 1 from t1").unwrap(),
            BackendType::Spark
        );
    }

    #[test]
    fn first_backend_directive_wins() {
        let sql = "-- backend: postgres\n-- backend: clickhouse\n";
        assert_eq!(parse_backend(sql).unwrap(), BackendType::Postgres);
    }

    #[test]
    fn every_unsupported_backend_token_fails() {
        for token in ["hive", "presto", "sparks", "SPARK", ""] {
            let sql = format!("-- backend: {token}\n");
            assert!(
                parse_backend(&sql).is_err(),
                "token `{token}` should be rejected"
            );
        }
    }

    #[test]
    fn directives_must_start_the_line() {
        let sql = "select 1; -- backend: postgres";
        assert_eq!(parse_backend(sql).unwrap(), BackendType::Spark);
    }

    #[test]
    fn keyword_matching_is_case_sensitive() {
        let sql = "-- Backend: postgres\n";
        assert_eq!(parse_backend(sql).unwrap(), BackendType::Spark);
    }

    #[test]
    fn tables_are_merged_and_deduplicated() {
        let sql = "\
-- inputs: a.b, a.c
-- outputs: a.c, a.d
";
        let mut tables = parse_tables(sql);
        tables.sort();
        assert_eq!(tables, vec!["a.b", "a.c", "a.d"]);
    }

    #[test]
    fn empty_table_entries_are_dropped() {
        let tables = parse_tables("-- inputs: a.b,, ,a.c\n");
        assert_eq!(tables, vec!["a.b", "a.c"]);
    }

    #[test]
    fn config_values_are_classified_at_parse_time() {
        let (engine_conf, tool_conf) = parse_config_directives(SAMPLE).unwrap();
        assert_eq!(
            engine_conf,
            vec![KeyValue::new("spark.executor.memory", "2g")]
        );
        assert_eq!(tool_conf.udf_file_path.as_deref(), Some("udfs/math.py"));
        assert_eq!(tool_conf.etl_type, EtlType::Streaming);
    }

    #[test]
    fn last_tool_override_wins() {
        let sql = "\
-- config: easy_sql.spark_submit=/opt/spark2/bin/spark-submit
-- config: easy_sql.spark_submit=/opt/spark3/bin/spark-submit
";
        let (_, tool_conf) = parse_config_directives(sql).unwrap();
        assert_eq!(tool_conf.spark_submit(), "/opt/spark3/bin/spark-submit");
    }

    #[test]
    fn engine_overrides_keep_order_and_duplicates() {
        let sql = "\
-- config: spark.files=/a.sql
-- config: spark.master=local[4]
-- config: spark.files=/b.sql
";
        let (engine_conf, _) = parse_config_directives(sql).unwrap();
        let keys: Vec<&str> = engine_conf.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["spark.files", "spark.master", "spark.files"]);
    }

    #[test]
    fn override_without_separator_is_fatal() {
        let err = parse_config_directives("-- config: spark.master\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOverride { .. }));

        let err = parse_config_directives("-- config: easy_sql.etl_type\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOverride { .. }));
    }

    #[test]
    fn prepare_statements_keep_file_order() {
        let sql = "\
-- prepare-sql: drop table if exists t1
select 1;
-- prepare-sql: create table t1 as select 2
";
        assert_eq!(
            prepare_statements(sql),
            vec![
                "drop table if exists t1".to_string(),
                "create table t1 as select 2".to_string(),
            ]
        );
    }
}
