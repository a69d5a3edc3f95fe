//! End-to-end tests: export file in, four CSV reports out

mod common;

use azcost::{
    AzcostError,
    aggregation::Totals,
    dimension::ReportDimension,
    ingest::{MalformedPolicy, collect_records},
    output::get_formatter,
    pipeline::run_reports,
    types::BillingMonth,
};
use common::{ExportBuilder, RecordBuilder, TestWorkspace};
use rust_decimal::Decimal;
use std::fs;

fn sample_export() -> String {
    ExportBuilder::new()
        .row("A1", "Prod", "Storage", "2024-01-03", "10.00")
        .row("A1", "Prod", "Compute", "2024-01-20", "5.50")
        .row("A2", "Dev", "Storage", "2024-02-01", "3.00")
        .build()
}

#[tokio::test]
async fn test_writes_four_reports() {
    let ws = TestWorkspace::with_export(&sample_export());
    let summary = run_reports(&ws.config())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(summary.written.len(), 4);
    assert_eq!(ws.report("cost_by_account.csv"), "key,total_cost\nA1,15.50\nA2,3.00\n");
    assert_eq!(
        ws.report("cost_by_meter.csv"),
        "key,total_cost\nCompute,5.50\nStorage,13.00\n"
    );
    assert_eq!(
        ws.report("cost_by_month.csv"),
        "key,total_cost\n2024-01,15.50\n2024-02,3.00\n"
    );
    assert_eq!(
        ws.report("cost_by_subscription.csv"),
        "key,total_cost\nDev,3.00\nProd,15.50\n"
    );
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let ws = TestWorkspace::with_export(&sample_export());
    let config = ws.config();

    run_reports(&config).await.unwrap();
    let first: Vec<Vec<u8>> = summary_files(&ws);
    run_reports(&config).await.unwrap();
    let second: Vec<Vec<u8>> = summary_files(&ws);

    assert_eq!(first, second);
}

fn summary_files(ws: &TestWorkspace) -> Vec<Vec<u8>> {
    [
        "cost_by_account.csv",
        "cost_by_meter.csv",
        "cost_by_month.csv",
        "cost_by_subscription.csv",
    ]
    .iter()
    .map(|name| fs::read(ws.out_dir.join(name)).unwrap())
    .collect()
}

#[tokio::test]
async fn test_malformed_row_is_skipped() {
    let export = ExportBuilder::new()
        .row("A1", "Prod", "Storage", "2024-01-03", "10.00")
        .row("A1", "Prod", "Storage", "2024-01-04", "")
        .row("A2", "Dev", "Storage", "2024-01-05", "not-a-number")
        .row("A2", "Dev", "Storage", "2024-01-06", "3.00")
        .build();
    let ws = TestWorkspace::with_export(&export);

    let summary = run_reports(&ws.config()).await.unwrap();
    assert_eq!(summary.totals.records, 2);
    assert_eq!(summary.totals.skipped, 2);
    assert_eq!(ws.report("cost_by_account.csv"), "key,total_cost\nA1,10.00\nA2,3.00\n");
}

#[tokio::test]
async fn test_abort_policy_fails_before_writing() {
    let export = ExportBuilder::new()
        .row("A1", "Prod", "Storage", "2024-01-03", "10.00")
        .row("A1", "Prod", "Storage", "2024-01-04", "")
        .build();
    let ws = TestWorkspace::with_export(&export);
    let mut config = ws.config();
    config.policy = MalformedPolicy::Abort;

    let err = run_reports(&config).await.unwrap_err();
    assert!(matches!(err, AzcostError::MalformedAborted { .. }));
    assert!(!ws.out_dir.exists());
}

#[tokio::test]
async fn test_header_only_export_gives_header_only_reports() {
    let ws = TestWorkspace::with_export(&ExportBuilder::new().build());
    let summary = run_reports(&ws.config()).await.unwrap();

    assert_eq!(summary.totals, Totals::default());
    assert_eq!(ws.report("cost_by_month.csv"), "key,total_cost\n");
}

#[tokio::test]
async fn test_missing_cost_column_is_fatal() {
    let ws = TestWorkspace::with_export("AccountName,Date\nA1,2024-01-01\n");
    let err = run_reports(&ws.config()).await.unwrap_err();
    assert!(matches!(err, AzcostError::MissingColumn(_)));
}

#[tokio::test]
async fn test_missing_dimension_goes_to_sentinel() {
    let export = ExportBuilder::new()
        .row("A1", "Prod", "Storage", "2024-01-03", "10.00")
        .row("", "Prod", "", "2024-01-04", "2.25")
        .build();
    let ws = TestWorkspace::with_export(&export);
    run_reports(&ws.config()).await.unwrap();

    assert_eq!(
        ws.report("cost_by_account.csv"),
        "key,total_cost\n(none),2.25\nA1,10.00\n"
    );
    assert_eq!(
        ws.report("cost_by_meter.csv"),
        "key,total_cost\n(none),2.25\nStorage,10.00\n"
    );
}

#[tokio::test]
async fn test_account_named_like_sentinel_stays_separate() {
    let export = ExportBuilder::new()
        .row("(none)", "Prod", "Storage", "2024-01-03", "1.00")
        .row("", "Prod", "Storage", "2024-01-04", "2.00")
        .build();
    let ws = TestWorkspace::with_export(&export);
    run_reports(&ws.config()).await.unwrap();

    assert_eq!(
        ws.report("cost_by_account.csv"),
        "key,total_cost\n(none),2.00\n\\(none),1.00\n"
    );
}

#[tokio::test]
async fn test_one_failed_report_leaves_the_others_written() {
    let ws = TestWorkspace::with_export(&sample_export());
    // A directory in place of the meter report cannot be replaced by a file
    fs::create_dir_all(ws.out_dir.join("cost_by_meter.csv")).unwrap();

    let summary = run_reports(&ws.config()).await.unwrap();
    assert_eq!(summary.written.len(), 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, ReportDimension::Meter);

    assert_eq!(ws.report("cost_by_account.csv"), "key,total_cost\nA1,15.50\nA2,3.00\n");
    assert_eq!(
        ws.report("cost_by_month.csv"),
        "key,total_cost\n2024-01,15.50\n2024-02,3.00\n"
    );
    assert_eq!(
        ws.report("cost_by_subscription.csv"),
        "key,total_cost\nDev,3.00\nProd,15.50\n"
    );
    assert!(matches!(
        summary.into_result(),
        Err(AzcostError::ReportsFailed { failed: 1 })
    ));
}

#[tokio::test]
async fn test_cost_overflow_fails_cleanly() {
    let export = ExportBuilder::new()
        .row("A1", "Prod", "Storage", "2024-01-03", "79228162514264337593543950335")
        .row("A1", "Prod", "Storage", "2024-01-04", "1")
        .build();
    let ws = TestWorkspace::with_export(&export);

    let err = run_reports(&ws.config()).await.unwrap_err();
    assert!(matches!(err, AzcostError::Aggregation(_)));
    assert!(!ws.out_dir.exists());
}

#[tokio::test]
async fn test_month_filter() {
    let ws = TestWorkspace::with_export(&sample_export());
    let mut config = ws.config();
    config.filter = config
        .filter
        .with_since(BillingMonth::new(2024, 2).unwrap());

    let summary = run_reports(&config).await.unwrap();
    assert_eq!(summary.totals.records, 1);
    assert_eq!(ws.report("cost_by_account.csv"), "key,total_cost\nA2,3.00\n");
}

#[tokio::test]
async fn test_keep_raw_saves_export() {
    let export = sample_export();
    let ws = TestWorkspace::with_export(&export);
    let mut config = ws.config();
    config.keep_raw = true;

    run_reports(&config).await.unwrap();

    let raw: Vec<_> = fs::read_dir(ws.out_dir.join("raw"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(raw.len(), 1);
    assert!(raw[0].to_string_lossy().ends_with(".billing.csv"));
    assert_eq!(fs::read_to_string(&raw[0]).unwrap(), export);
}

#[tokio::test]
async fn test_summary_formatters() {
    let ws = TestWorkspace::with_export(&sample_export());
    let summary = run_reports(&ws.config()).await.unwrap();

    let table = get_formatter(false).format_summary(&summary.reports, &summary.totals);
    assert!(table.contains("Cost by subscription"));
    assert!(table.contains("3 record(s), 0 skipped, total cost 18.50"));

    let json: serde_json::Value = serde_json::from_str(
        &get_formatter(true).format_summary(&summary.reports, &summary.totals),
    )
    .unwrap();
    assert_eq!(json["reports"].as_array().unwrap().len(), 4);
    assert_eq!(json["totals"]["total_cost"], "18.50");
}

#[tokio::test]
async fn test_collect_records_from_custom_stream() {
    let records = vec![
        RecordBuilder::new().cost(Decimal::new(125, 2)).build(),
        RecordBuilder::new().account(Some("A2")).build(),
    ];
    let stream = async_stream::stream! {
        for record in records {
            yield Ok::<_, AzcostError>(record);
        }
    };

    let outcome = collect_records(stream, MalformedPolicy::Abort).await.unwrap();
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.skipped, 0);
}
