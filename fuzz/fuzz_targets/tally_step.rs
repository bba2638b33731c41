#![no_main]

use std::time::{Duration, Instant};

use libfuzzer_sys::fuzz_target;
use logtally_log_pipeline::{Aggregator, LineMatcher, Render};

fuzz_target!(|lines: Vec<String>| {
    let matcher = match LineMatcher::new() {
        Ok(m) => m,
        Err(_) => return,
    };
    let started = Instant::now();
    let mut agg = Aggregator::new(Duration::from_secs(1), started);

    let mut matched = 0u64;
    for line in &lines {
        if let Some(entry) = matcher.parse(line) {
            agg.record(entry.key());
            matched += 1;
        }
    }

    // 윈도우 합계는 매칭된 라인 수와 같고, 렌더링은 실패하지 않아야 한다
    let report = agg
        .maybe_flush(started + Duration::from_secs(2))
        .expect("interval elapsed");
    assert_eq!(report.total(), matched);
    let mut out = Vec::new();
    report.render_text(&mut out).expect("Vec write cannot fail");
    assert_eq!(agg.distinct_keys(), 0);
});
