//! Detaching from the controlling terminal.
//!
//! [`Daemonizer`] runs the classic double-fork sequence; [`Foreground`] keeps
//! the process attached (useful under a service manager and in tests). Both
//! install the same termination hook unless told otherwise.
//!
//! No thread may exist when [`Detach::detach`] is called: only the forking
//! thread survives `fork(2)`. The tracing writer is therefore blocking, and
//! the metrics exporter and the termination hook are installed afterwards.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, chdir, fork, setsid};

use crate::error::DaemonError;
use crate::pid_file;

/// Detach strategy used by [`Lifecycle`](crate::lifecycle::Lifecycle).
pub trait Detach {
    /// Leave the invoking terminal. Returns in the process that goes on to
    /// run the daemon; any intermediate process exits with status 0.
    fn detach(&self) -> Result<(), DaemonError>;

    /// Arrange for the pidfile to be removed when a termination signal
    /// (SIGINT, SIGTERM, SIGHUP) arrives. Called once, after the pidfile is
    /// written.
    fn register_exit_hook(&self, pid_file: &Path) -> Result<(), DaemonError> {
        install_termination_hook(pid_file)
    }
}

/// Install the process-wide termination hook.
///
/// The hook removes the pidfile and exits with status 0. The in-progress
/// aggregation window is not flushed.
pub fn install_termination_hook(pid_file: &Path) -> Result<(), DaemonError> {
    let path = pid_file.to_path_buf();
    ctrlc::set_handler(move || {
        tracing::info!("termination signal received, removing pidfile");
        if let Err(e) = pid_file::remove_pid_file(&path) {
            tracing::warn!(error = %e, "failed to remove pidfile on termination");
        }
        std::process::exit(0);
    })
    .map_err(|e| DaemonError::ExitHook(e.to_string()))
}

/// Double-fork daemonizer.
#[derive(Debug, Clone)]
pub struct Daemonizer {
    output_file: PathBuf,
    error_file: PathBuf,
}

impl Daemonizer {
    /// Create a daemonizer that sends stdout to `output_file` and stderr to
    /// `error_file` once detached. Both paths should be absolute since the
    /// working directory becomes `/`.
    pub fn new(output_file: impl Into<PathBuf>, error_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
            error_file: error_file.into(),
        }
    }

    fn redirect_streams(&self) -> Result<(), DaemonError> {
        let stdin = open_stream("stdin", Path::new("/dev/null"), OpenOptions::new().read(true))?;
        let stdout = open_stream(
            "stdout",
            &self.output_file,
            OpenOptions::new().append(true).create(true).mode(0o644),
        )?;
        let stderr = open_stream(
            "stderr",
            &self.error_file,
            OpenOptions::new().append(true).create(true).mode(0o644),
        )?;

        dup_onto("stdin", &stdin, libc::STDIN_FILENO, Path::new("/dev/null"))?;
        dup_onto("stdout", &stdout, libc::STDOUT_FILENO, &self.output_file)?;
        dup_onto("stderr", &stderr, libc::STDERR_FILENO, &self.error_file)?;
        Ok(())
    }
}

impl Detach for Daemonizer {
    fn detach(&self) -> Result<(), DaemonError> {
        fork_and_exit_parent("first")?;

        umask(Mode::empty());
        if let Err(e) = setsid() {
            tracing::error!(error = %e, "setsid failed, continuing");
        }
        if let Err(e) = chdir("/") {
            tracing::error!(error = %e, "chdir to / failed, continuing");
        }

        // The session leader exits so the daemon can never reacquire a terminal.
        fork_and_exit_parent("second")?;

        let pid = std::process::id();
        {
            let mut out = std::io::stdout().lock();
            // The terminal may already be gone; nothing to report to in that case.
            let _ = writeln!(out, "PID is {pid}");
            let _ = out.flush();
        }
        let _ = std::io::stderr().flush();

        self.redirect_streams()?;
        tracing::info!(pid, "daemon detached");
        Ok(())
    }
}

/// Stay attached to the invoking terminal.
#[derive(Debug, Clone, Copy)]
pub struct Foreground {
    trap_signals: bool,
}

impl Foreground {
    /// Foreground mode that still removes the pidfile on SIGINT/SIGTERM/SIGHUP.
    pub fn new() -> Self {
        Self { trap_signals: true }
    }

    /// Foreground mode that installs no signal handler.
    ///
    /// The handler is process-wide and can be installed only once, so tests
    /// that start several lifecycles in one process use this.
    pub fn untrapped() -> Self {
        Self {
            trap_signals: false,
        }
    }
}

impl Default for Foreground {
    fn default() -> Self {
        Self::new()
    }
}

impl Detach for Foreground {
    fn detach(&self) -> Result<(), DaemonError> {
        tracing::info!(pid = std::process::id(), "running in foreground");
        Ok(())
    }

    fn register_exit_hook(&self, pid_file: &Path) -> Result<(), DaemonError> {
        if self.trap_signals {
            install_termination_hook(pid_file)
        } else {
            Ok(())
        }
    }
}

fn fork_and_exit_parent(stage: &'static str) -> Result<(), DaemonError> {
    // SAFETY: called before any thread is spawned, so the child inherits a
    // consistent single-threaded address space.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            tracing::debug!(stage, child = child.as_raw(), "fork parent exiting");
            std::process::exit(0);
        }
        Ok(ForkResult::Child) => Ok(()),
        Err(errno) => {
            tracing::error!(stage, error = %errno, "fork failed");
            Err(DaemonError::Fork {
                stage,
                source: errno.into(),
            })
        }
    }
}

fn open_stream(
    stream: &'static str,
    path: &Path,
    options: &OpenOptions,
) -> Result<File, DaemonError> {
    options.open(path).map_err(|source| DaemonError::Redirect {
        stream,
        path: path.to_path_buf(),
        source,
    })
}

fn dup_onto(
    stream: &'static str,
    file: &File,
    target: libc::c_int,
    path: &Path,
) -> Result<(), DaemonError> {
    // SAFETY: both descriptors are valid for the duration of the call; dup2
    // atomically replaces `target`, and `file` stays owned by the caller.
    let rc = unsafe { libc::dup2(file.as_raw_fd(), target) };
    if rc == -1 {
        return Err(DaemonError::Redirect {
            stream,
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}
