//! Runs translated commands through the native command interpreter.
//!
//! The child inherits the terminal's stdin, stdout, and stderr, so output
//! streams as it is produced. The session directory becomes the child's
//! working directory.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{error, info};

/// The interpreter and its "run one command and exit" switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpreter {
    pub program: &'static str,
    pub flag: &'static str,
}

impl Interpreter {
    /// `cmd /C` on Windows, `sh -c` elsewhere.
    pub const fn native() -> Self {
        if cfg!(windows) {
            Self { program: "cmd", flag: "/C" }
        } else {
            Self { program: "sh", flag: "-c" }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::native()
    }
}

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Runs `command` through `interpreter` in `dir` and waits for it to finish.
    fn run(&self, interpreter: &Interpreter, command: &str, dir: &Path) -> Result<ExitStatus>;

    /// Checks if a program exists in PATH.
    fn program_exists(&self, program: &str) -> bool;
}

/// Default process runner using std::process::Command.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, interpreter: &Interpreter, command: &str, dir: &Path) -> Result<ExitStatus> {
        let mut cmd = Command::new(interpreter.program);
        cmd.arg(interpreter.flag);

        // cmd.exe does its own parsing of the command line; pass it untouched.
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.raw_arg(command);
        }
        #[cfg(not(windows))]
        cmd.arg(command);

        cmd.current_dir(dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        Ok(cmd.status()?)
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

// =============================================================================
// Executor Implementation
// =============================================================================

/// Executes finalized command strings.
///
/// # Example
///
/// ```ignore
/// let executor = Executor::new();
/// executor.execute("dir /w", session.current_dir())?;
/// ```
pub struct Executor {
    interpreter: Interpreter,
    runner: Box<dyn ProcessRunner>,
}

impl Executor {
    pub fn new() -> Self {
        Self::with_runner(Interpreter::native(), Box::new(SystemProcessRunner))
    }

    /// Creates an executor with injected dependencies (for testing).
    pub fn with_runner(interpreter: Interpreter, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            interpreter,
            runner,
        }
    }

    /// Runs `command` with `dir` as the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The command is empty
    /// - The interpreter is not on PATH
    /// - The process cannot be spawned
    /// - The command exits with a non-zero status
    pub fn execute(&self, command: &str, dir: &Path) -> Result<()> {
        let command = command.trim();
        if command.is_empty() {
            return Err(anyhow!("No command provided"));
        }

        let program = self.interpreter.program;
        if !self.runner.program_exists(program) {
            return Err(anyhow!("Command interpreter `{}` not found in PATH", program));
        }

        info!(
            "Executing `{} {} {}` in {}",
            program,
            self.interpreter.flag,
            command,
            dir.display()
        );

        let status = self
            .runner
            .run(&self.interpreter, command, dir)
            .with_context(|| format!("Failed to run `{}`", command))?;

        if status.success() {
            Ok(())
        } else {
            error!("Command failed with status: {}", status);
            Err(anyhow!("Command exited with {}", status))
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}
