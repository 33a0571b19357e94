use backends::BackendEnv;
use clap::Args;
use common::error::RunnerError;
use etl_core::config::EtlConfig;
use etl_core::submit;
use std::collections::HashMap;
use std::env;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the sql script (must end with .sql)
    #[arg(long = "sql-file", short = 'f', value_name = "FILE")]
    pub sql_file: String,

    /// Comma-separated key=value variables passed to the engine
    #[arg(long, short = 'v', value_name = "VARS")]
    pub vars: Option<String>,

    /// One of [true, 1, false, 0]
    #[arg(long = "dry-run", value_name = "BOOL")]
    pub dry_run: Option<String>,

    /// Print the submit command instead of executing the script
    #[arg(long = "print-command", short = 'p')]
    pub print_command: bool,
}

pub fn handle_run(args: &RunArgs) -> Result<(), RunnerError> {
    let dry_run = args.dry_run.as_deref().unwrap_or("0");
    let config = EtlConfig::from_file(&args.sql_file).map_err(RunnerError::config)?;

    if args.print_command {
        let runner = env::current_exe().map_err(RunnerError::config)?;
        let command = submit::shell_command(&config, &runner, args.vars.as_deref(), dry_run)
            .map_err(RunnerError::config)?;
        println!("{command}");
        return Ok(());
    }

    let is_dry_run = matches!(dry_run, "true" | "1");
    let variables = parse_vars(args.vars.as_deref())?;
    let backend_env = BackendEnv::from_env();
    engine::execute(&config, &backend_env, variables, is_dry_run).map_err(RunnerError::run)
}

fn parse_vars(vars: Option<&str>) -> Result<HashMap<String, String>, RunnerError> {
    let mut parsed = HashMap::new();
    let Some(vars) = vars else {
        return Ok(parsed);
    };
    for entry in vars.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            RunnerError::config_msg(format!("variable `{entry}` must be of the form key=value"))
        })?;
        parsed.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vars_parse_into_a_map() {
        let parsed = parse_vars(Some("data_date=2024-01-01, env=prod")).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["data_date"], "2024-01-01");
        assert_eq!(parsed["env"], "prod");
    }

    #[test]
    fn empty_var_entries_are_skipped() {
        let parsed = parse_vars(Some("a=1,,")).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn no_vars_is_an_empty_map() {
        assert!(parse_vars(None).unwrap().is_empty());
    }

    #[test]
    fn malformed_var_is_a_config_error() {
        let err = parse_vars(Some("data_date")).unwrap_err();
        assert!(err.to_string().contains("data_date"));
    }
}
