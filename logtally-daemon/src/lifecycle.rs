//! Process lifecycle: start, stop, restart.
//!
//! A single pidfile enforces one running instance per monitored log file.
//! `start` refuses when the pidfile names a pid, otherwise detaches, writes
//! the pidfile and hands control to a [`Runnable`]. `stop` signals the
//! recorded pid until it is gone and then removes the pidfile.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use logtally_core::pipeline::Runnable;

use crate::detach::Detach;
use crate::error::DaemonError;
use crate::pid_file::{self, PidFileGuard};

/// Default sleep between termination signals in [`Lifecycle::stop`].
pub const DEFAULT_STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle settings.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Pidfile path; must be unique per monitored log file.
    pub pid_file: PathBuf,
    /// Sleep between repeated termination signals.
    pub stop_poll_interval: Duration,
}

impl LifecycleConfig {
    /// Settings with the default stop poll interval.
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            stop_poll_interval: DEFAULT_STOP_POLL_INTERVAL,
        }
    }
}

/// Result of a `stop` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The recorded process was signalled until it exited.
    Stopped { pid: i32 },
    /// No pidfile (or no valid pid in it); nothing was done.
    NotRunning,
}

/// Lifecycle manager, generic over how the process detaches.
pub struct Lifecycle<D: Detach> {
    config: LifecycleConfig,
    detacher: D,
}

impl<D: Detach> Lifecycle<D> {
    /// Create a lifecycle manager.
    pub fn new(config: LifecycleConfig, detacher: D) -> Self {
        Self { config, detacher }
    }

    /// Pidfile path.
    pub fn pid_file(&self) -> &Path {
        &self.config.pid_file
    }

    /// Start the daemon and run `task` until it returns.
    ///
    /// Under normal operation `task` never returns, so neither does this.
    /// If the pidfile already names a pid the request is refused and the
    /// named process is left untouched.
    pub fn start<R: Runnable + ?Sized>(&self, task: &mut R) -> Result<(), DaemonError> {
        let path = &self.config.pid_file;

        if let Some(pid) = pid_file::read_pid(path) {
            eprintln!("Pidfile {} found. Daemon already running?", path.display());
            tracing::error!(
                path = %path.display(),
                pid,
                "pidfile found, daemon already running?"
            );
            return Err(DaemonError::AlreadyRunning {
                path: path.clone(),
                pid,
            });
        }

        self.detacher.detach()?;

        let _guard = PidFileGuard::acquire(path)?;
        self.detacher.register_exit_hook(path)?;

        tracing::info!(pid = std::process::id(), "daemon running");
        task.run()?;
        Ok(())
    }

    /// Stop the daemon recorded in the pidfile.
    ///
    /// Sends SIGTERM repeatedly, sleeping between attempts, until the process
    /// no longer exists. There is no timeout: a process that ignores SIGTERM
    /// keeps this call blocked.
    pub fn stop(&self) -> Result<StopOutcome, DaemonError> {
        let path = &self.config.pid_file;

        let Some(pid) = pid_file::read_pid(path) else {
            eprintln!("Pidfile {} not found. Daemon not running", path.display());
            tracing::warn!(path = %path.display(), "pidfile not found, daemon not running");
            return Ok(StopOutcome::NotRunning);
        };

        tracing::info!(pid, "stopping daemon");
        let target = Pid::from_raw(pid);
        loop {
            match kill(target, Signal::SIGTERM) {
                Ok(()) => std::thread::sleep(self.config.stop_poll_interval),
                Err(Errno::ESRCH) => break,
                Err(errno) => {
                    tracing::error!(pid, error = %errno, "failed to signal daemon");
                    return Err(DaemonError::Signal {
                        pid,
                        source: errno.into(),
                    });
                }
            }
        }

        // The daemon's own termination hook usually got there first.
        pid_file::remove_pid_file(path)?;
        tracing::info!(pid, "daemon stopped");
        Ok(StopOutcome::Stopped { pid })
    }

    /// Stop the running daemon (if any), then start a new one.
    pub fn restart<R: Runnable + ?Sized>(&self, task: &mut R) -> Result<(), DaemonError> {
        self.stop()?;
        self.start(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detach::Foreground;
    use logtally_core::error::LogtallyError;

    fn lifecycle(dir: &Path) -> Lifecycle<Foreground> {
        let mut config = LifecycleConfig::new(dir.join("d.pid"));
        config.stop_poll_interval = Duration::from_millis(20);
        Lifecycle::new(config, Foreground::untrapped())
    }

    #[test]
    fn test_default_stop_poll_interval() {
        let config = LifecycleConfig::new("/tmp/x.pid");
        assert_eq!(config.stop_poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_start_runs_task_with_pidfile_present() {
        let dir = tempfile::tempdir().unwrap();
        let lc = lifecycle(dir.path());
        let pid_path = lc.pid_file().to_path_buf();

        let mut seen = None;
        let mut task = || -> Result<(), LogtallyError> {
            seen = pid_file::read_pid(&pid_path);
            Ok(())
        };
        lc.start(&mut task).unwrap();

        assert_eq!(seen, Some(std::process::id() as i32));
        assert!(!pid_path.exists(), "pidfile should be removed after task returns");
    }

    #[test]
    fn test_stop_without_pidfile_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(lifecycle(dir.path()).stop().unwrap(), StopOutcome::NotRunning);
    }
}
