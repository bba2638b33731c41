//! 리포트 렌더링
//!
//! 리포트 한 묶음(stanza)의 텍스트 형식:
//!
//! ```text
//!
//! Mon Oct 19 14:03:07 2026
//! ========================================
//! /\t200\t0.2
//! /library\t404\t0.1
//! total\t3
//! ```
//!
//! 키별 값은 원시 카운트를 [`SCALE_DIVISOR`]로 나눈 값이고,
//! `total`은 나누지 않은 원시 카운트의 합입니다. 두 값의 단위가 다르다는 점은
//! 기존 리포트 소비자와의 호환을 위해 그대로 유지합니다.

use std::io::Write;

use chrono::{DateTime, Local};

/// 키별 값을 출력할 때 나누는 값
pub const SCALE_DIVISOR: f64 = 10.0;

/// 헤더 타임스탬프 형식 (예: `Mon Oct 19 14:03:07 2026`)
const HEADER_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// 구분선 길이
const RULE_WIDTH: usize = 40;

/// 텍스트 출력 trait
pub trait Render {
    /// 사람이 읽을 수 있는 텍스트 형식으로 출력합니다.
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// 한 집계 윈도우의 리포트
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// 리포트 생성 시각
    pub generated_at: DateTime<Local>,
    /// 키별 원시 카운트 (키 순 정렬)
    pub counts: Vec<(String, u64)>,
}

impl Report {
    /// 윈도우의 원시 카운트 합계
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| *count).sum()
    }
}

impl Render for Report {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w)?;
        writeln!(w, "{}", self.generated_at.format(HEADER_FORMAT))?;
        writeln!(w, "{}", "=".repeat(RULE_WIDTH))?;
        for (key, count) in &self.counts {
            writeln!(w, "{key}\t{}", format_scaled(*count))?;
        }
        writeln!(w, "total\t{}", self.total())?;
        Ok(())
    }
}

/// 원시 카운트를 나눈 값을 소수 형태로 씁니다.
///
/// 정수로 떨어지면 `1.0`처럼 소수점 한 자리를 붙이고,
/// 그렇지 않으면 가장 짧은 왕복 가능 표현(`0.2`, `12.3`)을 씁니다.
pub fn format_scaled(count: u64) -> String {
    let value = count as f64 / SCALE_DIVISOR;
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 14, 3, 7).single().unwrap()
    }

    fn render(report: &Report) -> String {
        let mut buf = Vec::new();
        report.render_text(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn format_scaled_matches_float_style() {
        assert_eq!(format_scaled(0), "0.0");
        assert_eq!(format_scaled(1), "0.1");
        assert_eq!(format_scaled(2), "0.2");
        assert_eq!(format_scaled(3), "0.3");
        assert_eq!(format_scaled(10), "1.0");
        assert_eq!(format_scaled(125), "12.5");
        assert_eq!(format_scaled(1000), "100.0");
    }

    #[test]
    fn renders_stanza_layout() {
        let report = Report {
            generated_at: fixed_time(),
            counts: vec![
                ("/\t200".to_owned(), 2),
                ("/library\t404".to_owned(), 1),
            ],
        };

        let text = render(&report);
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Mon Oct 19 14:03:07 2026");
        assert_eq!(lines[2], "=".repeat(40));
        assert_eq!(lines[3], "/\t200\t0.2");
        assert_eq!(lines[4], "/library\t404\t0.1");
        assert_eq!(lines[5], "total\t3");
        assert_eq!(lines[6], "");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn empty_window_still_renders_total() {
        let report = Report {
            generated_at: fixed_time(),
            counts: Vec::new(),
        };
        let text = render(&report);
        assert!(text.ends_with(&format!("{}\ntotal\t0\n", "=".repeat(40))));
    }

    #[test]
    fn total_is_unscaled_sum() {
        let report = Report {
            generated_at: fixed_time(),
            counts: vec![("/a\t200".to_owned(), 7), ("/b\t500".to_owned(), 13)],
        };
        assert_eq!(report.total(), 20);
        assert!(render(&report).contains("total\t20\n"));
    }
}
