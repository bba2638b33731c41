//! 설정 관리: logtally.toml 파싱 및 런타임 설정
//!
//! [`LogtallyConfig`]는 데몬과 집계 파이프라인의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGTALLY_GENERAL_PID_FILE=/run/x.pid` 형식)
//! 3. 설정 파일 (`logtally.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), logtally_core::error::LogtallyError> {
//! use logtally_core::config::LogtallyConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogtallyConfig::load("logtally.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogtallyConfig::parse("[report]\ninterval_secs = 30")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogtallyError};

/// 허용되는 로그 레벨
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// 허용되는 로그 형식
const VALID_LOG_FORMATS: &[&str] = &["json", "pretty"];

/// logtally 통합 설정
///
/// `logtally.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 컴포넌트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogtallyConfig {
    /// 일반 설정 (진단 로그, 출력 파일, pid 파일)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 추적(tail) 설정
    #[serde(default)]
    pub tail: TailConfig,
    /// 집계 리포트 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogtallyConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogtallyError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    ///
    /// 검증하지 않습니다. 이후 단계(환경변수, CLI)의 오버라이드가 파일 값을
    /// 바로잡을 수 있으므로, 모든 계층을 합친 뒤 [`validate`](Self::validate)를 한 번 호출합니다.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LogtallyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogtallyError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogtallyError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogtallyError> {
        toml::from_str(toml_str).map_err(|e| {
            LogtallyError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGTALLY_{SECTION}_{FIELD}`
    /// 예: `LOGTALLY_REPORT_INTERVAL_SECS=30`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGTALLY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGTALLY_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.daemon_log, "LOGTALLY_GENERAL_DAEMON_LOG");
        override_string(&mut self.general.output_file, "LOGTALLY_GENERAL_OUTPUT_FILE");
        override_string(&mut self.general.error_file, "LOGTALLY_GENERAL_ERROR_FILE");
        override_string(&mut self.general.pid_file, "LOGTALLY_GENERAL_PID_FILE");

        // Tail
        override_string(&mut self.tail.log_file, "LOGTALLY_TAIL_LOG_FILE");
        override_u64(
            &mut self.tail.poll_interval_ms,
            "LOGTALLY_TAIL_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.tail.retry_initial_ms,
            "LOGTALLY_TAIL_RETRY_INITIAL_MS",
        );
        override_u64(&mut self.tail.retry_max_ms, "LOGTALLY_TAIL_RETRY_MAX_MS");

        // Report
        override_u64(
            &mut self.report.interval_secs,
            "LOGTALLY_REPORT_INTERVAL_SECS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGTALLY_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "LOGTALLY_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "LOGTALLY_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// `tail.log_file`은 `start`/`restart`에서만 필요하므로 여기서는 검증하지 않습니다.
    pub fn validate(&self) -> Result<(), LogtallyError> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            }
            .into());
        }

        for (field, value) in [
            ("general.daemon_log", &self.general.daemon_log),
            ("general.output_file", &self.general.output_file),
            ("general.error_file", &self.general.error_file),
            ("general.pid_file", &self.general.pid_file),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "path must not be empty".to_owned(),
                }
                .into());
            }
        }

        if self.tail.retry_initial_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tail.retry_initial_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.tail.retry_max_ms < self.tail.retry_initial_ms {
            return Err(ConfigError::InvalidValue {
                field: "tail.retry_max_ms".to_owned(),
                reason: format!(
                    "must be at least retry_initial_ms ({})",
                    self.tail.retry_initial_ms
                ),
            }
            .into());
        }

        if self.report.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.listen_addr.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "metrics.listen_addr".to_owned(),
                reason: "listen_addr must not be empty when metrics are enabled".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 진단 로그 파일 경로
    pub daemon_log: String,
    /// 리포트 출력 파일 경로 (데몬의 stdout)
    pub output_file: String,
    /// 데몬의 stderr 리다이렉트 경로
    pub error_file: String,
    /// PID 파일 경로 (감시 로그 파일마다 달라야 함)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            daemon_log: "/tmp/logtally.log".to_owned(),
            output_file: "/tmp/logtally_output.txt".to_owned(),
            error_file: "/dev/null".to_owned(),
            pid_file: "/tmp/logtally.pid".to_owned(),
        }
    }
}

/// 로그 추적 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// 감시할 로그 파일 경로
    pub log_file: String,
    /// 루프 반복 사이 대기 시간 (밀리초, 0이면 대기 없음)
    pub poll_interval_ms: u64,
    /// 파일 열기 실패 후 첫 재시도 대기 시간 (밀리초)
    pub retry_initial_ms: u64,
    /// 재시도 대기 시간 상한 (밀리초)
    pub retry_max_ms: u64,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            log_file: String::new(),
            poll_interval_ms: 500,
            retry_initial_ms: 50,
            retry_max_ms: 5_000,
        }
    }
}

/// 집계 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 리포트 간격 (초). 경과 시간이 이 값을 초과하면 플러시합니다.
    pub interval_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9102,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
