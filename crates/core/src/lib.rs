#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogtallyError, PipelineError};

// 설정
pub use config::LogtallyConfig;

// 실행 trait
pub use pipeline::Runnable;
