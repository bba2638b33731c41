//! logtally daemon library.
//!
//! This library exposes the lifecycle pieces for integration testing.
//! In production, `logtally-daemon` is used as a binary (main.rs).
//!
//! The detach sequence and signal handling are Unix-only.

pub mod cli;
#[cfg(unix)]
pub mod detach;
pub mod error;
#[cfg(unix)]
pub mod lifecycle;
pub mod logging;
pub mod metrics_server;
pub mod pid_file;
