//! Batch driver tests

use oddb_compositions::{parse, parse_batch, parse_with, Error, ParseOptions};
use std::thread;

fn init_tracing() {
    use std::sync::OnceLock;
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "oddb_compositions=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

const RECORDS: [(&str, &str); 5] = [
    ("7680516801112", "Calcii carbonas 500 mg corresp. Calcium 200 mg"),
    ("7680555940017", "Xenonum (133-Xe"),
    ("7680621700014", "excipiens ad solutionem pro 10 ml"),
    ("7680657660019", "I) Calcium 5 mg. II) Magnesium 3 mg"),
    ("7680389470011", ""),
];

#[test]
fn test_batch_isolates_failures() {
    init_tracing();

    let report = parse_batch(RECORDS, &ParseOptions::default());
    assert_eq!(report.outcomes.len(), RECORDS.len());

    let ids: Vec<_> = report.outcomes.iter().map(|o| o.id.as_str()).collect();
    let expected: Vec<_> = RECORDS.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, expected);

    let failed: Vec<_> = report.failures().map(|(id, _)| id).collect();
    assert_eq!(failed, ["7680555940017", "7680389470011"]);
    assert_eq!(report.successes().count(), 3);

    let summary = report.summary();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.parsed, 3);
    assert_eq!(summary.mismatched, 2);
    assert_eq!(summary.nesting, 0);
    assert_eq!(summary.exhausted, 0);
}

#[test]
fn test_batch_records_exhausted_ids() {
    init_tracing();

    let long = "Calcium 5 mg, ".repeat(200);
    let records = vec![
        ("short".to_string(), "Calcium 5 mg".to_string()),
        ("long".to_string(), long),
    ];
    let options = ParseOptions {
        max_steps: Some(5_000),
        ..ParseOptions::default()
    };

    let report = parse_batch(records, &options);
    assert_eq!(report.exhausted_ids(), ["long"]);
    assert_eq!(report.summary().parsed, 1);
    assert_eq!(report.summary().exhausted, 1);
}

#[test]
fn test_batch_scales_step_limit_to_record_length() {
    init_tracing();

    let long = "a, ".repeat(8_000);
    let report = parse_batch([("long", long.as_str())], &ParseOptions::default());
    assert_eq!(report.summary().parsed, 1);
    assert!(report.exhausted_ids().is_empty());
}

#[test]
fn test_verbose_parse_matches_quiet_parse() {
    init_tracing();

    let verbose = ParseOptions {
        verbose: true,
        ..ParseOptions::default()
    };
    for (_, text) in RECORDS {
        assert_eq!(parse_with(text, &verbose), parse(text), "{}", text);
    }
}

#[test]
fn test_batch_reports_nesting() {
    let deep = format!("Calcium {}x", "(".repeat(100));
    let report = parse_batch([("deep", deep.as_str())], &ParseOptions::default());
    let (id, error) = report.failures().next().unwrap();
    assert_eq!(id, "deep");
    assert!(matches!(error, Error::UnboundedNesting { .. }));
    assert_eq!(report.summary().nesting, 1);
}

#[test]
fn test_parallel_parsing_matches_sequential() {
    let sequential: Vec<_> = RECORDS.iter().map(|(_, text)| parse(text)).collect();

    let handles: Vec<_> = RECORDS
        .iter()
        .map(|&(_, text)| thread::spawn(move || parse(text)))
        .collect();
    let parallel: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(parallel, sequential);
}
