use criterion::{black_box, criterion_group, criterion_main, Criterion};
use debt_ledger_core::{canonical, sha256_hex};
use serde_json::json;

fn bench_stable_json_string(c: &mut Criterion) {
    let payload = json!({
        "schema_version": "1",
        "mode": "preview",
        "target": {
            "location": "debt/deduped.jsonl",
            "records": 4_000,
            "malformed_lines": [],
            "fingerprint": "a".repeat(64)
        },
        "changes_by_field": {"status": 12, "severity": 40},
        "total_changes": 52
    });

    c.bench_function("stable_json_string", |b| {
        b.iter(|| canonical::stable_json_string(black_box(&payload)).expect("stable json"))
    });
}

fn bench_ledger_fingerprint(c: &mut Criterion) {
    let ledger = "{\"identity\":\"3f1c9a\",\"severity\":\"S1\",\"status\":\"open\"}\n".repeat(4_000);

    c.bench_function("sha256_hex_ledger", |b| {
        b.iter(|| sha256_hex(black_box(ledger.as_bytes())))
    });
}

criterion_group!(benches, bench_stable_json_string, bench_ledger_fingerprint);
criterion_main!(benches);
