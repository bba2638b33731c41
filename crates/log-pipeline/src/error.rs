//! 로그 집계 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for LogtallyError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logtally_core::error::{ConfigError, LogtallyError, PipelineError};

/// 로그 집계 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 감시 파일 접근 실패 (일시적, 재시도 대상)
    #[error("file access error: {path}: {source}")]
    FileAccess {
        /// 감시 파일 경로
        path: String,
        /// 원인 I/O 에러
        source: std::io::Error,
    },

    /// 리포트 출력 스트림 쓰기 실패
    #[error("report output error: {0}")]
    Output(std::io::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogPipelineError> for LogtallyError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Config { field, reason } => {
                LogtallyError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Output(e) => {
                LogtallyError::Pipeline(PipelineError::Output(e.to_string()))
            }
            LogPipelineError::Io(e) => LogtallyError::Io(e),
            other => LogtallyError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_access_error_display() {
        let err = LogPipelineError::FileAccess {
            path: "/var/log/access.log".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/access.log"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn config_error_converts_to_config() {
        let err = LogPipelineError::Config {
            field: "report_interval".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        let top: LogtallyError = err.into();
        assert!(matches!(
            top,
            LogtallyError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn output_error_converts_to_pipeline_output() {
        let err = LogPipelineError::Output(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        ));
        let top: LogtallyError = err.into();
        assert!(matches!(
            top,
            LogtallyError::Pipeline(PipelineError::Output(_))
        ));
    }
}
