#![no_main]

use libfuzzer_sys::fuzz_target;
use logtally_log_pipeline::LineMatcher;

fuzz_target!(|data: &[u8]| {
    let matcher = match LineMatcher::new() {
        Ok(m) => m,
        Err(_) => return,
    };
    let line = String::from_utf8_lossy(data);

    // 매칭된 키는 항상 "/<route>\t<status>" 형태여야 한다
    if let Some(entry) = matcher.parse(&line) {
        let key = entry.key();
        assert!(key.starts_with('/'));
        assert!(key.contains('\t'));
        assert!(entry.status.bytes().all(|b| b.is_ascii_digit()));
    }
});
