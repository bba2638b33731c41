//! 집계 파이프라인 설정
//!
//! [`TallyConfig`]는 core의 [`LogtallyConfig`](logtally_core::config::LogtallyConfig)에서
//! 추적(tail)과 리포트 섹션을 모아 파이프라인 전용 설정으로 만듭니다.
//!
//! # 사용 예시
//! ```ignore
//! use logtally_core::config::LogtallyConfig;
//! use logtally_log_pipeline::config::TallyConfig;
//!
//! let core_config = LogtallyConfig::default();
//! let config = TallyConfig::from_core(&core_config);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use logtally_core::config::LogtallyConfig;

use crate::error::LogPipelineError;

/// 집계 파이프라인 설정
#[derive(Debug, Clone)]
pub struct TallyConfig {
    /// 감시할 로그 파일 경로
    pub log_file: PathBuf,
    /// 루프 반복 사이 대기 시간 (밀리초, 0이면 대기 없음)
    pub poll_interval_ms: u64,
    /// 파일 열기 실패 후 첫 재시도 대기 시간 (밀리초)
    pub retry_initial_ms: u64,
    /// 재시도 대기 시간 상한 (밀리초)
    pub retry_max_ms: u64,
    /// 리포트 간격 (초)
    pub report_interval_secs: u64,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::new(),
            poll_interval_ms: 500,
            retry_initial_ms: 50,
            retry_max_ms: 5_000,
            report_interval_secs: 10,
        }
    }
}

impl TallyConfig {
    /// core의 `LogtallyConfig`에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &LogtallyConfig) -> Self {
        Self {
            log_file: PathBuf::from(&core.tail.log_file),
            poll_interval_ms: core.tail.poll_interval_ms,
            retry_initial_ms: core.tail.retry_initial_ms,
            retry_max_ms: core.tail.retry_max_ms,
            report_interval_secs: core.report.interval_secs,
        }
    }

    /// 루프 반복 사이 대기 시간
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 리포트 간격
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.log_file.as_os_str().is_empty() {
            return Err(LogPipelineError::Config {
                field: "log_file".to_owned(),
                reason: "a log file to tail must be given".to_owned(),
            });
        }

        if self.report_interval_secs == 0 {
            return Err(LogPipelineError::Config {
                field: "report_interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.retry_initial_ms == 0 {
            return Err(LogPipelineError::Config {
                field: "retry_initial_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.retry_max_ms < self.retry_initial_ms {
            return Err(LogPipelineError::Config {
                field: "retry_max_ms".to_owned(),
                reason: format!("must be at least {}", self.retry_initial_ms),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct TallyConfigBuilder {
    config: TallyConfig,
}

impl TallyConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시할 로그 파일을 설정합니다.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = path.into();
        self
    }

    /// 루프 반복 사이 대기 시간(밀리초)을 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 파일 열기 재시도 대기 범위(밀리초)를 설정합니다.
    pub fn retry_backoff_ms(mut self, initial: u64, max: u64) -> Self {
        self.config.retry_initial_ms = initial;
        self.config.retry_max_ms = max;
        self
    }

    /// 리포트 간격(초)을 설정합니다.
    pub fn report_interval_secs(mut self, secs: u64) -> Self {
        self.config.report_interval_secs = secs;
        self
    }

    /// 설정을 검증하고 `TallyConfig`를 생성합니다.
    pub fn build(self) -> Result<TallyConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_requires_log_file() {
        let err = TallyConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("log_file"));
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = LogtallyConfig::default();
        core.tail.log_file = "/var/log/nginx/access.log".to_owned();
        core.tail.poll_interval_ms = 0;
        core.report.interval_secs = 60;

        let config = TallyConfig::from_core(&core);
        assert_eq!(config.log_file, PathBuf::from("/var/log/nginx/access.log"));
        assert_eq!(config.poll_interval(), Duration::ZERO);
        assert_eq!(config.report_interval(), Duration::from_secs(60));
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_report_interval() {
        let config = TallyConfig {
            log_file: PathBuf::from("/tmp/access.log"),
            report_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = TallyConfigBuilder::new()
            .log_file("/tmp/access.log")
            .poll_interval_ms(10)
            .retry_backoff_ms(1, 20)
            .report_interval_secs(3)
            .build()
            .unwrap();
        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.retry_max_ms, 20);
        assert_eq!(config.report_interval_secs, 3);
    }

    #[test]
    fn builder_rejects_inverted_backoff() {
        let result = TallyConfigBuilder::new()
            .log_file("/tmp/access.log")
            .retry_backoff_ms(100, 10)
            .build();
        assert!(result.is_err());
    }
}
