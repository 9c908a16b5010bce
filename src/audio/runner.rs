use std::process::Command;

use tracing::debug;

use crate::error::{ArchiveError, Result};

/// Exit status and captured streams of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs to completion.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
}

/// Runs programs with [`std::process::Command`], blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ArchiveError::ExternalTool {
                tool: program.to_string(),
                code: None,
                stderr: format!("Failed to run {program}: {e}"),
            })?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `program` and turn a non-zero exit into [`ArchiveError::ExternalTool`].
pub fn run_checked(
    runner: &dyn ProcessRunner,
    program: &str,
    args: &[String],
) -> Result<ProcessOutput> {
    debug!("Running {} {}", program, args.join(" "));

    let output = runner.run(program, args)?;
    if !output.success() {
        return Err(ArchiveError::ExternalTool {
            tool: program.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}
