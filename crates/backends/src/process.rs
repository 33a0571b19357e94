use std::io;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error(
        "{program} exited with failure (code {code:?})\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}"
    )]
    Failed {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// A sql command-line tool invoked once per statement.
///
/// Output is captured and only surfaced on failure; backends built on this
/// run synchronously and block until the tool exits.
#[derive(Debug, Clone)]
pub struct SqlTool {
    program: String,
    base_args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl SqlTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.base_args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn run(&self, extra_args: &[&str]) -> Result<(), ToolError> {
        debug!("running {} {:?} {:?}", self.program, self.base_args, extra_args);
        let output = Command::new(&self.program)
            .args(&self.base_args)
            .args(extra_args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .map_err(|source| ToolError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        debug!("{} finished: {}", self.program, output.status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_launch_error() {
        let tool = SqlTool::new("definitely-not-a-real-sql-tool");
        let err = tool.run(&["-e", "select 1"]).unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_surfaces_exit_code_and_output() {
        let tool = SqlTool::new("sh").arg("-c").arg("echo out; echo err >&2; exit 3");
        match tool.run(&[]).unwrap_err() {
            ToolError::Failed {
                code,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(code, Some(3));
                assert!(stdout.contains("out"));
                assert!(stderr.contains("err"));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_tool_returns_ok() {
        let tool = SqlTool::new("true");
        tool.run(&[]).unwrap();
    }
}
