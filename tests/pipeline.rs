use linkability_network::aggregate::read_edges_csv;
use linkability_network::config::PipelineConfig;
use linkability_network::pipeline::run_pipeline;
use std::path::Path;

const COLLECTION_HEADER: &str = "Txhash,Blockno,UnixTimestamp,DateTime,From,To,TokenId\n";

fn collection_row(from: &str, to: &str) -> String {
    format!("0xhash,1,1650000000,2022-04-15,{},{},42\n", from, to)
}

fn transaction_row(from: &str, to: &str) -> String {
    format!("0xhash,1,1650000000,2022-04-15,0,{},{},1.5\n", from, to)
}

fn setup(
    dir: &Path,
    allowed: &[(&str, &str)],
    blacklisted: &[&str],
    transactions: &[(&str, &str)],
) -> PipelineConfig {
    let mut collection = COLLECTION_HEADER.to_string();
    for (from, to) in allowed {
        collection.push_str(&collection_row(from, to));
    }
    std::fs::write(dir.join("collection.csv"), collection).unwrap();

    let blacklist_dir = dir.join("blacklist");
    std::fs::create_dir_all(&blacklist_dir).unwrap();
    let entries: Vec<String> = blacklisted.iter().map(|a| format!("  \"{}\"", a)).collect();
    std::fs::write(
        blacklist_dir.join("list.json"),
        format!("[\n{}\n]\n", entries.join(",\n")),
    )
    .unwrap();

    let rows: String = transactions
        .iter()
        .map(|(from, to)| transaction_row(from, to))
        .collect();
    std::fs::write(dir.join("etn.csv"), rows).unwrap();

    let mut config = PipelineConfig::default();
    config.paths.allowlist_file = dir.join("collection.csv");
    config.paths.blacklist_dir = blacklist_dir;
    config.paths.transactions_file = dir.join("etn.csv");
    config.paths.output_file = dir.join("output.csv");
    config.paths.metadata_dir = dir.join("metadata");
    config
}

#[test]
fn chain_produces_weight_two_edge() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        &[("A", "B"), ("B", "C")],
        &[],
        &[("A", "B"), ("B", "C")],
    );

    let summary = run_pipeline(&config).unwrap();

    assert_eq!(
        summary.frequencies.report_lines(),
        vec!["weight 1 appears 2 times", "weight 2 appears 1 times"]
    );
    assert_eq!(summary.metadata.record_counts.edges, 3);
    assert_eq!(summary.metadata.record_counts.rows_accepted, 2);

    let output = std::fs::read_to_string(&config.paths.output_file).unwrap();
    assert_eq!(output, "from,to,weight\nA,B,1\nA,C,2\nB,C,1\n");
}

#[test]
fn blacklisted_and_unlisted_rows_leave_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        &[("A", "B"), ("B", "C"), ("E", "F")],
        &["A"],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("E", "F")],
    );

    let summary = run_pipeline(&config).unwrap();
    let edges = read_edges_csv(&config.paths.output_file).unwrap();

    assert!(edges.iter().all(|e| e.from != "A" && e.to != "A"));
    assert!(edges.iter().all(|e| !(e.from == "C" && e.to == "D")));
    assert_eq!(edges.len(), 2);
    assert_eq!(summary.frequencies.total(), edges.len());

    let counts = &summary.metadata.record_counts;
    assert_eq!(counts.rows_read, 4);
    assert_eq!(counts.rows_blacklisted, 1);
    assert_eq!(counts.rows_not_allowlisted, 1);
    assert_eq!(counts.blacklist_addresses, 1);
}

#[test]
fn reversed_order_keeps_weights_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        &[("A", "B"), ("B", "C")],
        &[],
        &[("B", "C"), ("A", "B")],
    );

    let summary = run_pipeline(&config).unwrap();

    assert_eq!(summary.frequencies.report_lines(), vec!["weight 1 appears 2 times"]);
    let edges = read_edges_csv(&config.paths.output_file).unwrap();
    assert!(!edges.iter().any(|e| e.from == "A" && e.to == "C"));
}

#[test]
fn missing_transactions_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path(), &[("A", "B")], &[], &[]);
    config.paths.transactions_file = dir.path().join("absent.csv");

    assert!(run_pipeline(&config).is_err());
}

#[test]
fn missing_blacklist_dir_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path(), &[("A", "B")], &[], &[("A", "B")]);
    config.paths.blacklist_dir = dir.path().join("no-such-dir");

    let summary = run_pipeline(&config).unwrap();
    assert_eq!(summary.metadata.record_counts.blacklist_addresses, 0);
    assert_eq!(summary.frequencies.count(1), 1);
}
