//! 파일 기반 로그 추적기
//!
//! `tail -f`와 비슷하지만 바이트 오프셋 대신 *라인 수*로 진행 위치를 기억합니다.
//! 매 폴링마다 파일 전체를 다시 읽어 커서 이후 라인만 잘라냅니다.
//!
//! 로테이션은 같은 경로에 *새 파일*이 생기는 경우만 감지합니다. 같은 파일을 제자리에서
//! 잘라내면(truncate) 식별자가 그대로이므로 커서는 줄어들지 않고, 이후 추가된 라인은
//! 파일이 이전 라인 수를 넘어설 때까지 건너뜁니다. 알려진 제약입니다.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{FileIdentity, RetryBackoff};
use crate::error::LogPipelineError;

/// 추적 진행 상태
///
/// 마지막으로 본 파일 식별자와 이미 소비한 라인 수를 기억합니다.
/// 프로세스 재시작 시 보존되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCursor {
    identity: Option<FileIdentity>,
    lines_consumed: usize,
}

impl LogCursor {
    /// 아무것도 읽지 않은 커서를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 마지막으로 본 파일 식별자
    pub fn identity(&self) -> Option<FileIdentity> {
        self.identity
    }

    /// 현재 파일에서 이미 소비한 라인 수
    pub fn lines_consumed(&self) -> usize {
        self.lines_consumed
    }

    /// 폴링 결과를 커서에 반영합니다.
    ///
    /// 식별자가 같으면 새로 읽은 라인 수만큼 커서를 전진시키고, 바뀌었으면 새 파일에서
    /// 읽은 라인 수로 다시 셉니다. 식별자가 같은 동안 커서는 줄어들지 않습니다.
    ///
    /// 식별자가 바뀐 경우 `true`를 반환합니다 (최초 폴링은 제외).
    pub fn commit(&mut self, batch: &TailBatch) -> bool {
        let rotated = self.identity.is_some_and(|prev| prev != batch.identity);
        if rotated {
            tracing::info!(
                previous = %self.identity.map(|id| id.to_string()).unwrap_or_default(),
                current = %batch.identity,
                "log file rotated, counting from line 0"
            );
            metrics::counter!(logtally_core::metrics::TAIL_ROTATIONS_TOTAL).increment(1);
        }
        if self.identity == Some(batch.identity) {
            self.lines_consumed += batch.lines.len();
        } else {
            self.lines_consumed = batch.lines.len();
        }
        self.identity = Some(batch.identity);
        rotated
    }
}

/// 한 번의 폴링 결과
#[derive(Debug, Clone)]
pub struct TailBatch {
    /// 새로 나타난 라인 (개행 문자 제외)
    pub lines: Vec<String>,
    identity: FileIdentity,
    total_lines: usize,
}

impl TailBatch {
    /// 읽은 파일의 식별자
    pub fn identity(&self) -> FileIdentity {
        self.identity
    }

    /// 읽은 파일의 전체 라인 수
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }
}

/// 단일 경로 로그 추적기
pub struct FileTailer {
    path: PathBuf,
    backoff: RetryBackoff,
}

impl FileTailer {
    /// 새 추적기를 생성합니다.
    pub fn new(path: impl Into<PathBuf>, retry_initial: Duration, retry_max: Duration) -> Self {
        Self {
            path: path.into(),
            backoff: RetryBackoff::new(retry_initial, retry_max),
        }
    }

    /// 감시 중인 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 커서 이후의 새 라인을 읽습니다.
    ///
    /// 파일을 열거나 읽지 못하면 성공할 때까지 대기 시간을 늘려가며 재시도합니다.
    /// 이 호출은 포기하지 않습니다.
    pub fn poll(&mut self, cursor: &LogCursor) -> TailBatch {
        loop {
            match self.try_poll(cursor) {
                Ok(batch) => {
                    self.backoff.reset();
                    return batch;
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    tracing::debug!(error = %e, delay_ms = delay.as_millis() as u64, "retrying log file open");
                    metrics::counter!(logtally_core::metrics::TAIL_OPEN_RETRIES_TOTAL)
                        .increment(1);
                    std::thread::sleep(delay);
                }
            }
        }
    }

    /// 재시도 없이 한 번만 읽습니다.
    pub fn try_poll(&self, cursor: &LogCursor) -> Result<TailBatch, LogPipelineError> {
        let access_err = |source: std::io::Error| LogPipelineError::FileAccess {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = File::open(&self.path).map_err(access_err)?;
        // 같은 핸들에서 식별자를 얻어야 읽은 내용과 식별자가 일치합니다
        let identity = FileIdentity::from_metadata(&file.metadata().map_err(access_err)?);

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(access_err)?;

        let all_lines = split_lines(&buf);
        let total_lines = all_lines.len();

        let start = if cursor.identity == Some(identity) {
            cursor.lines_consumed.min(total_lines)
        } else {
            0
        };

        let lines: Vec<String> = all_lines[start..]
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();

        if !lines.is_empty() {
            metrics::counter!(logtally_core::metrics::TAIL_LINES_READ_TOTAL)
                .increment(lines.len() as u64);
        }

        Ok(TailBatch {
            lines,
            identity,
            total_lines,
        })
    }
}

/// 버퍼를 라인 단위로 나눕니다.
///
/// 개행으로 끝나지 않는 마지막 조각도 한 라인으로 셉니다. `\r\n`의 `\r`은 제거합니다.
fn split_lines(buf: &[u8]) -> Vec<&[u8]> {
    if buf.is_empty() {
        return Vec::new();
    }
    let body = buf.strip_suffix(b"\n").unwrap_or(buf);
    body.split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}
