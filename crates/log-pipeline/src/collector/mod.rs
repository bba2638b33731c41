//! 로그 파일 추적(tail) 엔진
//!
//! 감시 파일을 매 폴링마다 처음부터 다시 읽고, 커서에 기록된 라인 수 이후의
//! 새 라인만 돌려줍니다. 파일 식별자(device + inode)가 바뀌면 로테이션으로 보고
//! 새 파일의 0번째 라인부터 다시 셉니다.
//!
//! # 제약
//! 로테이션은 경로의 파일을 *교체*하는 방식(rename 후 새 파일 생성)일 때만 정확합니다.
//! 같은 파일을 제자리에서 truncate하면 식별자가 그대로이므로 라인이 누락될 수 있습니다.

pub mod file;

pub use file::{FileTailer, LogCursor, TailBatch};

use std::fs::Metadata;
use std::time::Duration;

/// 경로와 무관한 물리적 파일 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    /// 열린 파일의 메타데이터에서 식별자를 얻습니다.
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    /// inode 개념이 없는 플랫폼에서는 상수로 고정됩니다.
    #[cfg(not(unix))]
    pub fn from_metadata(_meta: &Metadata) -> Self {
        Self { dev: 0, ino: 0 }
    }
}

impl std::fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}

/// 파일 열기 재시도 대기 시간 계산기
///
/// 실패할 때마다 대기 시간을 두 배로 늘리되 상한을 넘지 않습니다.
/// 재시도 횟수에는 제한이 없습니다.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl RetryBackoff {
    /// 새 계산기를 생성합니다.
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// 다음 대기 시간을 돌려주고 내부 값을 늘립니다.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// 성공 후 초기 대기 시간으로 되돌립니다.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
