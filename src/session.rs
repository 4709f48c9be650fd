//! Per-run session state.
//!
//! The session owns the shell's working directory. It is passed by reference
//! to every handler instead of living in a global, and the process working
//! directory is never changed: child processes receive the session directory
//! explicitly.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// The shell's current working directory.
///
/// Every value stored here has been canonicalized by the filesystem and
/// confirmed to be a directory.
#[derive(Debug, Clone)]
pub struct Session {
    current_dir: PathBuf,
}

impl Session {
    /// Creates a session rooted at the directory the OS reports for this process.
    pub fn from_process() -> io::Result<Self> {
        Self::new(std::env::current_dir()?)
    }

    /// Creates a session rooted at `dir`, which must exist and be a directory.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            current_dir: validate_dir(dir.as_ref())?,
        })
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Resolves `path` against the session directory. Absolute paths are returned as-is.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }

    /// Changes the session directory. On error the session is left untouched.
    pub fn change_dir(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let target = validate_dir(&self.resolve(path))?;
        self.current_dir = target;
        Ok(())
    }

    /// The directory as shown to the user (prompt and `pwd`).
    pub fn display_dir(&self) -> String {
        display_path(&self.current_dir)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_dir())
    }
}

fn validate_dir(path: &Path) -> io::Result<PathBuf> {
    let canonical = path.canonicalize()?;
    if !canonical.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("not a directory: {}", display_path(&canonical)),
        ));
    }
    Ok(canonical)
}

/// Renders a canonical path without the Windows `\\?\` verbatim prefix.
pub fn display_path(path: &Path) -> String {
    let shown = path.display().to_string();
    match shown.strip_prefix(r"\\?\") {
        Some(rest) if !rest.starts_with("UNC") => rest.to_string(),
        _ => shown,
    }
}
