use std::fmt;

use crate::error::ProviderError;

/// Captured result of one external process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A fully built invocation: program plus argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The subcommand, e.g. `createvm`.
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes invocations. The process-backed runner is the only production
/// implementation; tests substitute a recording fake.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait CommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProviderError>;
}

pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProviderError> {
        tracing::debug!(command = %invocation, "running");

        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .await
            .map_err(|e| ProviderError::Io {
                context: format!("running {}", invocation.program),
                source: e,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run an invocation and turn a non-zero exit into an error carrying stderr.
pub async fn run_checked<R: CommandRunner>(
    runner: &R,
    invocation: &Invocation,
) -> Result<CommandOutput, ProviderError> {
    let output = runner.run(invocation).await?;
    if !output.success() {
        let status = match output.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        return Err(ProviderError::ExternalCommand {
            command: format!("{} {}", invocation.program, invocation.subcommand()),
            status,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}
