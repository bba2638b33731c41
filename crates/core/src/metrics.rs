//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 컴포넌트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 매크로 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logtally_`
//! - 컴포넌트명: `tail_`, `matcher_`, `report_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logtally_core::metrics::TAIL_LINES_READ_TOTAL).increment(1);
//! ```

// ─── Log Tail Engine 메트릭 ─────────────────────────────────────────

/// Tail: 읽어들인 새 라인 수 (counter)
pub const TAIL_LINES_READ_TOTAL: &str = "logtally_tail_lines_read_total";

/// Tail: 파일 열기 재시도 수 (counter)
pub const TAIL_OPEN_RETRIES_TOTAL: &str = "logtally_tail_open_retries_total";

/// Tail: 감지된 로테이션 수 (counter)
pub const TAIL_ROTATIONS_TOTAL: &str = "logtally_tail_rotations_total";

// ─── Pattern Matcher 메트릭 ─────────────────────────────────────────

/// Matcher: 패턴에 매칭된 라인 수 (counter)
pub const MATCHER_LINES_MATCHED_TOTAL: &str = "logtally_matcher_lines_matched_total";

/// Matcher: 패턴에 매칭되지 않은 라인 수 (counter)
pub const MATCHER_LINES_UNMATCHED_TOTAL: &str = "logtally_matcher_lines_unmatched_total";

// ─── Aggregator & Reporter 메트릭 ───────────────────────────────────

/// Report: 출력된 리포트 수 (counter)
pub const REPORT_FLUSHES_TOTAL: &str = "logtally_report_flushes_total";

/// Report: 현재 윈도우의 고유 키 수 (gauge)
pub const REPORT_WINDOW_KEYS: &str = "logtally_report_window_keys";

/// 모든 메트릭 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        TAIL_LINES_READ_TOTAL,
        "Total number of new lines read from the tailed log file"
    );
    describe_counter!(
        TAIL_OPEN_RETRIES_TOTAL,
        "Total number of failed attempts to open the tailed log file"
    );
    describe_counter!(
        TAIL_ROTATIONS_TOTAL,
        "Total number of detected log file rotations (file identity changes)"
    );
    describe_counter!(
        MATCHER_LINES_MATCHED_TOTAL,
        "Total number of lines that matched the route/status/bytes pattern"
    );
    describe_counter!(
        MATCHER_LINES_UNMATCHED_TOTAL,
        "Total number of lines that did not match the pattern"
    );
    describe_counter!(
        REPORT_FLUSHES_TOTAL,
        "Total number of report stanzas written to the output stream"
    );
    describe_gauge!(
        REPORT_WINDOW_KEYS,
        "Distinct aggregation keys in the current report window"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        TAIL_LINES_READ_TOTAL,
        TAIL_OPEN_RETRIES_TOTAL,
        TAIL_ROTATIONS_TOTAL,
        MATCHER_LINES_MATCHED_TOTAL,
        MATCHER_LINES_UNMATCHED_TOTAL,
        REPORT_FLUSHES_TOTAL,
        REPORT_WINDOW_KEYS,
    ];

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더가 없어도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn all_metrics_start_with_logtally_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("logtally_"),
                "Metric '{}' does not start with 'logtally_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in ALL_METRIC_NAMES.iter().filter(|n| **n != REPORT_WINDOW_KEYS) {
            assert!(name.ends_with("_total"), "counter '{}' lacks _total", name);
        }
    }

    #[test]
    fn metric_names_are_unique() {
        let mut names = ALL_METRIC_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_METRIC_NAMES.len());
    }
}
