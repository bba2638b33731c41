//! 라인 패턴 매처
//!
//! 탭으로 구분된 `경로 \t 상태코드 \t 응답바이트` 조각을 라인 어디에서든 찾아냅니다.
//! 앵커가 없으므로 앞뒤에 다른 필드(IP, 메서드 등)가 붙어 있어도 매칭됩니다.
//!
//! 경로는 `/` 뒤에 ASCII 단어 문자(`[A-Za-z0-9_]`)만 0개 이상 오는 형태입니다.
//! `/a/b`처럼 슬래시가 여러 개인 경로는 마지막 조각(`/b`)만 경로로 잡힙니다.

use regex::Regex;

use crate::error::LogPipelineError;

/// 라인 패턴
const LINE_PATTERN: &str = r"(/[A-Za-z0-9_]*)\t([0-9]+)\t([0-9]+)";

/// 매칭된 라인에서 추출한 필드
///
/// 모든 필드는 원본 라인의 텍스트를 그대로 빌려옵니다 (숫자 정규화 없음).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLogEntry<'a> {
    /// 요청 경로 (`/`로 시작)
    pub route: &'a str,
    /// 상태 코드 텍스트
    pub status: &'a str,
    /// 응답 바이트 수 텍스트 (집계에는 쓰이지 않음)
    pub response_bytes: &'a str,
}

impl ParsedLogEntry<'_> {
    /// 집계 키를 만듭니다: `경로 + "\t" + 상태코드`
    pub fn key(&self) -> String {
        let mut key = String::with_capacity(self.route.len() + 1 + self.status.len());
        key.push_str(self.route);
        key.push('\t');
        key.push_str(self.status);
        key
    }
}

/// 정규식 기반 라인 매처
///
/// 정규식은 생성 시 한 번만 컴파일됩니다.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    regex: Regex,
}

impl LineMatcher {
    /// 새 매처를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        Ok(Self {
            regex: Regex::new(LINE_PATTERN)?,
        })
    }

    /// 라인에서 첫 번째 매칭을 찾습니다.
    ///
    /// 매칭되지 않으면 `None`을 반환합니다.
    pub fn parse<'a>(&self, line: &'a str) -> Option<ParsedLogEntry<'a>> {
        let caps = self.regex.captures(line)?;
        Some(ParsedLogEntry {
            route: caps.get(1)?.as_str(),
            status: caps.get(2)?.as_str(),
            response_bytes: caps.get(3)?.as_str(),
        })
    }
}
