//! 라인 매처 / 집계 벤치마크
//!
//! 매칭되는 라인, 매칭되지 않는 라인, 매칭 후 집계까지의 처리량을 측정합니다.

use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use logtally_log_pipeline::{Aggregator, LineMatcher};

/// 로그 생성기가 만드는 형태의 라인
const GENERATED_LINE: &str = "203.0.113.45\tGET /library\t200\t512";

/// 앞에 긴 필드가 붙은 라인
const LONG_PREFIX_LINE: &str = "2026-10-19T12:00:00.123456Z production-web-01 upstream=10.0.0.7:8080 request_id=550e8400-e29b-41d4-a716-446655440000 GET /questions\t404\t1024";

/// 매칭되지 않는 라인
const UNMATCHED_LINE: &str =
    "<34>1 2026-10-19T12:00:00Z myhost sshd 1234 - - Failed password for root";

fn bench_parse(c: &mut Criterion) {
    let matcher = LineMatcher::new().unwrap();

    let mut group = c.benchmark_group("line_matcher");
    group.throughput(Throughput::Elements(1));

    for (name, line) in [
        ("generated", GENERATED_LINE),
        ("long_prefix", LONG_PREFIX_LINE),
        ("unmatched", UNMATCHED_LINE),
    ] {
        group.bench_with_input(BenchmarkId::new("parse", name), line, |b, line| {
            b.iter(|| matcher.parse(black_box(line)))
        });
    }

    group.finish();
}

fn bench_parse_and_record(c: &mut Criterion) {
    let matcher = LineMatcher::new().unwrap();
    let routes = ["/", "/library", "/blog", "/questions"];
    let lines: Vec<String> = (0..1000)
        .map(|i| format!("10.0.0.{}\tGET {}\t200\t{}", i % 255, routes[i % routes.len()], i))
        .collect();

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("parse_and_record_1000", |b| {
        b.iter(|| {
            let mut agg = Aggregator::new(Duration::from_secs(10), Instant::now());
            for line in &lines {
                if let Some(entry) = matcher.parse(black_box(line)) {
                    agg.record(entry.key());
                }
            }
            agg.distinct_keys()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_parse_and_record);
criterion_main!(benches);
