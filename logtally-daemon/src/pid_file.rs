//! Pidfile handling.
//!
//! The pidfile holds a single decimal pid followed by a newline. It is the
//! only state shared between a running daemon and later `start`/`stop`
//! invocations.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::DaemonError;

/// Read the pid recorded in `path`.
///
/// Returns `None` when the file is missing or unreadable, and also when its
/// content is not a positive decimal pid (a warning is logged in that case so
/// the next start can overwrite it).
pub fn read_pid(path: &Path) -> Option<i32> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "pidfile not readable");
            return None;
        }
    };

    match content.trim().parse::<i32>() {
        Ok(pid) if pid > 0 => Some(pid),
        _ => {
            tracing::warn!(
                path = %path.display(),
                content = %content.trim(),
                "pidfile does not hold a valid pid, treating daemon as not running"
            );
            None
        }
    }
}

/// Remove the pidfile, treating an already-missing file as success.
pub fn remove_pid_file(path: &Path) -> Result<(), DaemonError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "pidfile removed");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DaemonError::PidFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Pidfile owned by the running daemon.
///
/// Writes the current pid on [`acquire`](Self::acquire) and removes the file
/// again when dropped, so an orderly return or an unwinding panic out of the
/// tally loop never leaves a pidfile behind.
#[derive(Debug)]
pub struct PidFileGuard {
    path: PathBuf,
}

impl PidFileGuard {
    /// Write the current process id to `path`, replacing any previous content.
    ///
    /// The parent directory is created if needed. The opened path must be a
    /// regular file.
    pub fn acquire(path: &Path) -> Result<Self, DaemonError> {
        let pid_err = |source: std::io::Error| DaemonError::PidFile {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(pid_err)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let mut file = options.open(path).map_err(pid_err)?;

        if !file.metadata().map_err(pid_err)?.is_file() {
            return Err(pid_err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        let pid = std::process::id();
        writeln!(file, "{pid}").map_err(pid_err)?;
        file.flush().map_err(pid_err)?;

        tracing::info!(pid, path = %path.display(), "pidfile written");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the owned pidfile.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Err(e) = remove_pid_file(&self.path) {
            tracing::warn!(error = %e, "failed to remove pidfile");
        }
    }
}
