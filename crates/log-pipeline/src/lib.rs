#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 로테이션을 감지하는 로그 파일 추적기와 커서
//! - [`matcher`]: `경로 \t 상태코드 \t 바이트` 라인 패턴 매처
//! - [`aggregate`]: 키별 카운트 윈도우 집계
//! - [`report`]: 리포트 텍스트 렌더링
//! - [`pipeline`]: 전체 루프 오케스트레이션 (Runnable trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정에서 변환)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileTailer -> LineMatcher -> Aggregator -> Report -> output stream
//!     |              |              |
//!  rotation       regex        windowed counts
//! ```

pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod report;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{StepSummary, TallyPipeline, TallyPipelineBuilder};

// 설정
pub use config::{TallyConfig, TallyConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 추적기
pub use collector::{FileIdentity, FileTailer, LogCursor, RetryBackoff, TailBatch};

// 매처
pub use matcher::{LineMatcher, ParsedLogEntry};

// 집계/리포트
pub use aggregate::Aggregator;
pub use report::{Render, Report};
