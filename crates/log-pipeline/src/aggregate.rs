//! 윈도우 집계기
//!
//! 매칭된 키별 카운트를 누적하다가 리포트 간격이 *초과*되면 리포트를 만들고
//! 맵 전체를 빈 맵으로 교체합니다. 별도 타이머는 없고, 호출자가 루프 한 바퀴마다
//! [`Aggregator::maybe_flush`]를 호출할 때만 검사합니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Local;

use crate::report::Report;

/// 키별 카운트 집계기
#[derive(Debug)]
pub struct Aggregator {
    counts: HashMap<String, u64>,
    interval: Duration,
    last_flush: Instant,
}

impl Aggregator {
    /// 새 집계기를 생성합니다. 윈도우는 `started_at`부터 시작합니다.
    pub fn new(interval: Duration, started_at: Instant) -> Self {
        Self {
            counts: HashMap::new(),
            interval,
            last_flush: started_at,
        }
    }

    /// 키의 카운트를 1 증가시킵니다.
    pub fn record(&mut self, key: String) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// 현재 윈도우에서 키의 원시 카운트 (없으면 0)
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// 현재 윈도우의 고유 키 수
    pub fn distinct_keys(&self) -> usize {
        self.counts.len()
    }

    /// 간격이 지났으면 리포트를 만들고 윈도우를 비웁니다.
    ///
    /// 마지막 플러시 이후 경과 시간이 간격과 *같으면* 아직 플러시하지 않습니다.
    pub fn maybe_flush(&mut self, now: Instant) -> Option<Report> {
        if now.saturating_duration_since(self.last_flush) <= self.interval {
            return None;
        }

        let mut counts: Vec<(String, u64)> = std::mem::take(&mut self.counts).into_iter().collect();
        counts.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        self.last_flush = now;

        Some(Report {
            generated_at: Local::now(),
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const INTERVAL: Duration = Duration::from_secs(10);

    #[test]
    fn unseen_key_counts_zero() {
        let agg = Aggregator::new(INTERVAL, Instant::now());
        assert_eq!(agg.count("/\t200"), 0);
        assert_eq!(agg.distinct_keys(), 0);
    }

    #[test]
    fn no_flush_before_interval_elapses() {
        let start = Instant::now();
        let mut agg = Aggregator::new(INTERVAL, start);
        agg.record("/\t200".to_owned());

        assert!(agg.maybe_flush(start + Duration::from_secs(5)).is_none());
        assert!(agg.maybe_flush(start + INTERVAL).is_none());
        assert_eq!(agg.count("/\t200"), 1);
    }

    #[test]
    fn flush_after_interval_resets_window() {
        let start = Instant::now();
        let mut agg = Aggregator::new(INTERVAL, start);
        agg.record("/\t200".to_owned());
        agg.record("/\t200".to_owned());
        agg.record("/library\t404".to_owned());

        let flushed_at = start + INTERVAL + Duration::from_millis(1);
        let report = agg.maybe_flush(flushed_at).unwrap();
        assert_eq!(
            report.counts,
            vec![("/\t200".to_owned(), 2), ("/library\t404".to_owned(), 1)]
        );
        assert_eq!(report.total(), 3);
        assert_eq!(agg.distinct_keys(), 0);

        // 다음 윈도우는 플러시 시점부터 다시 잰다
        assert!(agg.maybe_flush(flushed_at + INTERVAL).is_none());
        assert!(
            agg.maybe_flush(flushed_at + INTERVAL + Duration::from_millis(1))
                .is_some()
        );
    }

    #[test]
    fn empty_window_still_flushes() {
        let start = Instant::now();
        let mut agg = Aggregator::new(INTERVAL, start);
        let report = agg.maybe_flush(start + Duration::from_secs(11)).unwrap();
        assert!(report.counts.is_empty());
        assert_eq!(report.total(), 0);
    }

    proptest! {
        #[test]
        fn raw_count_equals_occurrences(n in 1usize..500) {
            let start = Instant::now();
            let mut agg = Aggregator::new(INTERVAL, start);
            for _ in 0..n {
                agg.record("/blog\t200".to_owned());
            }
            let report = agg.maybe_flush(start + Duration::from_secs(11)).unwrap();
            prop_assert_eq!(report.counts.len(), 1);
            prop_assert_eq!(report.counts[0].1, n as u64);
            prop_assert_eq!(report.total(), n as u64);
        }

        #[test]
        fn total_is_sum_of_all_records(keys in proptest::collection::vec(0u8..5, 0..200)) {
            let start = Instant::now();
            let mut agg = Aggregator::new(INTERVAL, start);
            for k in &keys {
                agg.record(format!("/r{k}\t200"));
            }
            let report = agg.maybe_flush(start + Duration::from_secs(11)).unwrap();
            prop_assert_eq!(report.total(), keys.len() as u64);
        }
    }
}
