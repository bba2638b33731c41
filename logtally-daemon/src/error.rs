//! Daemon error types and exit code mapping.

use std::path::PathBuf;

use logtally_core::error::LogtallyError;
use logtally_log_pipeline::LogPipelineError;

/// Process lifecycle error.
///
/// Each variant carries enough context for the message printed to the
/// invoking terminal (before detaching) or to the diagnostic log (after).
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// A pidfile holding a live-looking pid already exists.
    #[error("pidfile {} found with pid {pid}, daemon already running?", path.display())]
    AlreadyRunning { path: PathBuf, pid: i32 },

    /// `fork(2)` failed during the detach sequence.
    #[error("{stage} fork failed: {source}")]
    Fork {
        stage: &'static str,
        source: std::io::Error,
    },

    /// A standard stream could not be redirected after detaching.
    #[error("failed to redirect {stream} to {}: {source}", path.display())]
    Redirect {
        stream: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The pidfile could not be written or removed.
    #[error("pidfile {}: {source}", path.display())]
    PidFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Sending the termination signal failed for a reason other than
    /// "no such process".
    #[error("failed to signal pid {pid}: {source}")]
    Signal { pid: i32, source: std::io::Error },

    /// The termination hook could not be installed.
    #[error("failed to install termination hook: {0}")]
    ExitHook(String),

    /// Wrapped domain error from logtally-core.
    #[error(transparent)]
    Core(#[from] LogtallyError),
}

impl DaemonError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                      |
    /// |------|----------------------------------------------|
    /// | 0    | Success                                      |
    /// | 1    | Refused start, fork failure, runtime failure |
    /// | 2    | Configuration error                          |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(LogtallyError::Config(_)) => 2,
            _ => 1,
        }
    }
}

impl From<LogPipelineError> for DaemonError {
    fn from(e: LogPipelineError) -> Self {
        Self::Core(e.into())
    }
}
