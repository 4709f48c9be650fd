//! Built-in commands handled without the AI translator.
//!
//! Each handler receives the session by reference plus the argument tokens
//! that followed the verb. Path arguments are the remaining tokens rejoined
//! with single spaces, so `mkdir my folder` creates `my folder`.

use crate::command_router::Flow;
use crate::session::Session;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors reported by built-in commands. The verb is part of every message.
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("{verb}: path required")]
    MissingPath { verb: &'static str },

    #[error("{verb}: {cause}")]
    Io { verb: &'static str, cause: io::Error },
}

impl BuiltinError {
    fn io(verb: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |cause| BuiltinError::Io { verb, cause }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            BuiltinError::MissingPath { verb } | BuiltinError::Io { verb, .. } => verb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
    Ls,
    Mkdir,
    Rm,
    Exit,
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Cd,
        Builtin::Pwd,
        Builtin::Ls,
        Builtin::Mkdir,
        Builtin::Rm,
        Builtin::Exit,
    ];

    /// Exact, case-sensitive lookup of a verb.
    pub fn parse(verb: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == verb)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Pwd => "pwd",
            Builtin::Ls => "ls",
            Builtin::Mkdir => "mkdir",
            Builtin::Rm => "rm",
            Builtin::Exit => "exit",
        }
    }

    /// Runs the built-in against the session, writing any output to `out`.
    pub fn run<W: Write>(
        self,
        args: &[&str],
        session: &mut Session,
        out: &mut W,
    ) -> Result<Flow, BuiltinError> {
        info!("Running built-in: {} {:?}", self.name(), args);
        let verb = self.name();

        match self {
            Builtin::Cd => {
                let path = required_path(verb, args)?;
                session.change_dir(&path).map_err(BuiltinError::io(verb))?;
            }
            Builtin::Pwd => {
                writeln!(out, "{}", session.display_dir().green()).map_err(BuiltinError::io(verb))?;
            }
            Builtin::Ls => {
                for name in list_dir(session.current_dir()).map_err(BuiltinError::io(verb))? {
                    writeln!(out, "{}", name.cyan()).map_err(BuiltinError::io(verb))?;
                }
            }
            Builtin::Mkdir => {
                let path = required_path(verb, args)?;
                make_dir(&session.resolve(&path)).map_err(BuiltinError::io(verb))?;
            }
            Builtin::Rm => {
                let path = required_path(verb, args)?;
                remove_entry(&session.resolve(&path)).map_err(BuiltinError::io(verb))?;
            }
            Builtin::Exit => {
                writeln!(out, "{}", "Exiting ShellHit AI Terminal...".magenta())
                    .map_err(BuiltinError::io(verb))?;
                return Ok(Flow::Exit);
            }
        }

        Ok(Flow::Continue)
    }
}

fn required_path(verb: &'static str, args: &[&str]) -> Result<String, BuiltinError> {
    if args.is_empty() {
        return Err(BuiltinError::MissingPath { verb });
    }
    Ok(args.join(" "))
}

/// Entry names of `dir`, sorted.
pub fn list_dir(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

fn make_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// Removes a file, or a directory only when it is empty.
fn remove_entry(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}
