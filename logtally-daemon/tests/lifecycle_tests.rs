//! Lifecycle tests: refused start, stop against dead/live/missing processes,
//! and a foreground start running the real tally pipeline.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use logtally_core::error::{LogtallyError, PipelineError};
use logtally_daemon::detach::Foreground;
use logtally_daemon::error::DaemonError;
use logtally_daemon::lifecycle::{Lifecycle, LifecycleConfig, StopOutcome};
use logtally_daemon::pid_file;
use logtally_log_pipeline::{TallyConfigBuilder, TallyPipelineBuilder};

fn lifecycle(pid_path: &Path) -> Lifecycle<Foreground> {
    let mut config = LifecycleConfig::new(pid_path);
    config.stop_poll_interval = Duration::from_millis(20);
    Lifecycle::new(config, Foreground::untrapped())
}

#[test]
fn test_start_refused_when_pidfile_names_a_pid() {
    // Given: A pidfile holding a pid
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");
    fs::write(&pid_path, "4242\n").expect("should write pidfile");

    // When: Starting
    let mut ran = false;
    let mut task = || -> Result<(), LogtallyError> {
        ran = true;
        Ok(())
    };
    let err = lifecycle(&pid_path).start(&mut task).unwrap_err();

    // Then: Refused with exit code 1, task never ran, pidfile untouched
    assert!(matches!(err, DaemonError::AlreadyRunning { pid: 4242, .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(!ran, "task must not run when start is refused");
    assert_eq!(fs::read_to_string(&pid_path).unwrap(), "4242\n");
}

#[test]
fn test_start_overwrites_pidfile_with_invalid_content() {
    // Given: A pidfile with garbage
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");
    fs::write(&pid_path, "garbage\n").expect("should write pidfile");

    // When: Starting
    let mut recorded = None;
    let mut task = || -> Result<(), LogtallyError> {
        recorded = pid_file::read_pid(&pid_path);
        Ok(())
    };
    lifecycle(&pid_path).start(&mut task).expect("start should proceed");

    // Then: Our pid was written while running, and removed afterwards
    assert_eq!(recorded, Some(std::process::id() as i32));
    assert!(!pid_path.exists());
}

#[test]
fn test_task_error_propagates_and_removes_pidfile() {
    // Given: A task that fails
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");
    let mut task = || -> Result<(), LogtallyError> {
        Err(PipelineError::Output("closed".to_owned()).into())
    };

    // When: Starting
    let err = lifecycle(&pid_path).start(&mut task).unwrap_err();

    // Then: Error surfaces and pidfile is gone
    assert!(matches!(err, DaemonError::Core(LogtallyError::Pipeline(_))));
    assert!(!pid_path.exists());
}

#[test]
fn test_stop_without_pidfile_reports_not_running() {
    // Given: No pidfile
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");

    // When: Stopping
    let outcome = lifecycle(&pid_path).stop().expect("stop should not fail");

    // Then: No-op
    assert_eq!(outcome, StopOutcome::NotRunning);
}

#[test]
fn test_stop_dead_pid_removes_pidfile() {
    // Given: A pidfile naming a process that already exited and was reaped
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");
    let mut child = Command::new("true").spawn().expect("should spawn true");
    let pid = child.id() as i32;
    child.wait().expect("should reap child");
    fs::write(&pid_path, format!("{pid}\n")).expect("should write pidfile");

    // When: Stopping
    let outcome = lifecycle(&pid_path).stop().expect("stop should succeed");

    // Then: Pidfile removed
    assert_eq!(outcome, StopOutcome::Stopped { pid });
    assert!(!pid_path.exists());
}

#[test]
fn test_stop_live_process_blocks_until_it_exits() {
    // Given: A live child recorded in the pidfile, reaped by a helper thread
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");
    let mut child = Command::new("sleep").arg("30").spawn().expect("should spawn sleep");
    let pid = child.id() as i32;
    fs::write(&pid_path, format!("{pid}\n")).expect("should write pidfile");
    let reaper = std::thread::spawn(move || child.wait());

    // When: Stopping
    let started = Instant::now();
    let outcome = lifecycle(&pid_path).stop().expect("stop should succeed");

    // Then: The child died from SIGTERM well before its 30s sleep ended
    assert_eq!(outcome, StopOutcome::Stopped { pid });
    assert!(started.elapsed() < Duration::from_secs(10));
    let status = reaper.join().unwrap().expect("wait should succeed");
    assert!(!status.success());
    assert!(!pid_path.exists());
}

#[test]
fn test_restart_with_nothing_running_starts() {
    // Given: No pidfile
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("logtally.pid");

    // When: Restarting
    let mut runs = 0;
    let mut task = || -> Result<(), LogtallyError> {
        runs += 1;
        Ok(())
    };
    lifecycle(&pid_path).restart(&mut task).expect("restart should succeed");

    // Then: The task ran once
    assert_eq!(runs, 1);
}

#[test]
fn test_foreground_start_runs_pipeline_until_output_fails() {
    // Given: A log file and a pipeline whose output stream is closed
    struct Closed;
    impl std::io::Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let temp_dir = TempDir::new().expect("should create temp dir");
    let log_path = temp_dir.path().join("access.log");
    let pid_path = temp_dir.path().join("logtally.pid");
    fs::write(&log_path, "1.2.3.4\tGET /\t200\t100\n").expect("should write log");

    let config = TallyConfigBuilder::new()
        .log_file(&log_path)
        .poll_interval_ms(20)
        .report_interval_secs(1)
        .build()
        .expect("valid config");
    let mut pipeline = TallyPipelineBuilder::new()
        .config(config)
        .output(Closed)
        .build()
        .expect("pipeline should build");

    // When: Starting in the foreground
    let err = lifecycle(&pid_path).start(&mut pipeline).unwrap_err();

    // Then: The first report write fails, start returns, pidfile is cleaned up
    assert!(matches!(
        err,
        DaemonError::Core(LogtallyError::Pipeline(PipelineError::Output(_)))
    ));
    assert!(!pid_path.exists());
}
