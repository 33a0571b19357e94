use crate::config::{BackendType, EtlConfig, KeyValue};
use crate::error::ConfigError;
use common::utils::resolve_file;
use std::collections::BTreeSet;
use std::path::Path;

/// Keys whose values are comma-separated file lists. A user override for one
/// of these is unioned with the default instead of replacing it.
const SPARK_LIST_KEYS: &[&str] = &["spark.files", "spark.jars", "spark.submit.pyFiles"];
const FLINK_LIST_KEYS: &[&str] = &["jarfile", "pyFiles"];

/// Merged `--conf key=value` arguments for a spark-submit invocation.
pub fn spark_conf_args(config: &EtlConfig) -> Result<Vec<String>, ConfigError> {
    let defaults = spark_default_conf(config)?;
    merge_conf_args(&defaults, &config.engine_conf, SPARK_LIST_KEYS, true, |kv| {
        format!("--conf {}={}", kv.key, kv.value)
    })
}

/// Merged `--key value` arguments for a flink run invocation.
pub fn flink_conf_args(config: &EtlConfig) -> Result<Vec<String>, ConfigError> {
    let defaults = flink_default_conf(config)?;
    merge_conf_args(&defaults, &config.engine_conf, FLINK_LIST_KEYS, false, |kv| {
        format!("--{} {}", kv.key, kv.value)
    })
}

/// Compose the full submit command for externally-submitted backends.
///
/// Only spark and flink run through a submit tool; asking for a shell
/// command on any other backend is an error.
pub fn shell_command(
    config: &EtlConfig,
    runner: &Path,
    vars: Option<&str>,
    dry_run: &str,
) -> Result<String, ConfigError> {
    let sql_file = config.sql_file_str()?;
    let vars_part = vars
        .map(|v| format!(" -v {v}"))
        .unwrap_or_default();

    match config.backend {
        BackendType::Spark => {
            let args = spark_conf_args(config)?;
            Ok(format!(
                "{} {} \"{}\" -f {} --dry-run {}{}",
                config.tool_conf.spark_submit(),
                args.join(" "),
                runner.display(),
                sql_file,
                dry_run,
                vars_part,
            ))
        }
        BackendType::Flink => {
            let args = flink_conf_args(config)?;
            Ok(format!(
                "{} run {} \"{}\" -f {} --dry-run {}{}",
                config.tool_conf.flink_run(),
                args.join(" "),
                runner.display(),
                sql_file,
                dry_run,
                vars_part,
            ))
        }
        other => Err(ConfigError::not_a_submit_backend(other)),
    }
}

fn spark_default_conf(config: &EtlConfig) -> Result<Vec<KeyValue>, ConfigError> {
    Ok(vec![
        KeyValue::new("spark.master", "local[2]"),
        KeyValue::new("spark.submit.deployMode", "client"),
        KeyValue::new("spark.app.name", config.task_name()?),
        KeyValue::new("spark.sql.warehouse.dir", "/tmp/spark-warehouse-localdw"),
        KeyValue::new(
            "spark.driver.extraJavaOptions",
            "\"-Dderby.system.home=/tmp/spark-warehouse-metastore \
             -Dderby.stream.error.file=/tmp/spark-warehouse-metastore.log\"",
        ),
        KeyValue::new("spark.files", format!("\"{}\"", shipped_files(config)?)),
    ])
}

fn flink_default_conf(config: &EtlConfig) -> Result<Vec<KeyValue>, ConfigError> {
    Ok(vec![
        KeyValue::new("parallelism", "1"),
        KeyValue::new("pyFiles", shipped_files(config)?),
    ])
}

/// The sql script plus any declared UDF/function files, absolutized, as the
/// default ship-with-the-job list.
fn shipped_files(config: &EtlConfig) -> Result<String, ConfigError> {
    let mut files = vec![resolve_file(config.sql_file_str()?, true)?];
    if let Some(udf) = &config.tool_conf.udf_file_path {
        files.push(resolve_file(udf, true)?);
    }
    if let Some(func) = &config.tool_conf.func_file_path {
        files.push(resolve_file(func, true)?);
    }
    Ok(files.join(","))
}

/// Reconcile the default settings with the user's overrides.
///
/// Defaults keep their fixed order; a user setting with a matching key
/// replaces the default (or is unioned into it for list-valued keys) and is
/// consumed; whatever the user supplied beyond the defaults is appended in
/// its original order. Every key appears exactly once in the output.
fn merge_conf_args<F>(
    defaults: &[KeyValue],
    user_conf: &[KeyValue],
    list_keys: &[&str],
    quote_lists: bool,
    emit: F,
) -> Result<Vec<String>, ConfigError>
where
    F: Fn(&KeyValue) -> String,
{
    let mut remaining: Vec<KeyValue> = user_conf.to_vec();
    let mut args = Vec::with_capacity(defaults.len() + remaining.len());

    for default in defaults {
        match remaining.iter().position(|kv| kv.key == default.key) {
            None => args.push(emit(default)),
            Some(pos) => {
                let user_kv = remaining.remove(pos);
                if list_keys.contains(&default.key.as_str()) {
                    let merged = union_file_values(&default.value, &user_kv.value)?;
                    let value = if quote_lists {
                        format!("\"{merged}\"")
                    } else {
                        merged
                    };
                    args.push(emit(&KeyValue::new(default.key.clone(), value)));
                } else {
                    args.push(emit(&user_kv));
                }
            }
        }
    }

    for leftover in remaining {
        args.push(emit(&leftover));
    }
    Ok(args)
}

/// Set union of two comma-separated file lists. Defaults are already
/// absolute; user-supplied entries are absolutized before the union.
fn union_file_values(default_value: &str, user_value: &str) -> Result<String, ConfigError> {
    let mut values: BTreeSet<String> = default_value
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    for value in user_value
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        values.insert(resolve_file(value, true)?);
    }
    Ok(values.into_iter().collect::<Vec<_>>().join(","))
}
