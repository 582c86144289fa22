use std::fs;

use credit_scoring::app::pipeline::Pipeline;
use credit_scoring::app::settings::Settings;
use credit_scoring::data::{generate_portfolio, write_portfolio_csv};
use credit_scoring::error::{EXIT_INPUT, EXIT_NO_DATA};
use credit_scoring::io::{write_batch_csv, RESULT_COLUMNS};
use credit_scoring::metrics::PsiStability;
use credit_scoring::store::ApplicationStore;

fn quiet_pipeline() -> Pipeline {
    let settings = Settings {
        fraud_noise: 0.0,
        ..Settings::default()
    };
    settings.pipeline().unwrap()
}

#[test]
fn sample_portfolio_scores_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("portfolio.csv");
    let rows = generate_portfolio(300, 7, true).unwrap();
    write_portfolio_csv(&input, &rows).unwrap();

    let pipeline = quiet_pipeline();
    let output = pipeline.run_batch(&input, Some(&input)).unwrap();

    let s = &output.summary;
    assert_eq!(s.rows_read, 300);
    assert_eq!(s.rows_scored, 300);
    assert_eq!(s.row_errors, 0);
    assert_eq!(s.risk_distribution.iter().map(|(_, n)| n).sum::<usize>(), 300);
    assert!(s.ks.is_some_and(|ks| (0.0..=1.0).contains(&ks)));

    let psi = s.psi.unwrap();
    assert!(psi.value.abs() < 1e-9);
    assert_eq!(psi.stability, PsiStability::Stable);
    assert_eq!(output.source, "batch:portfolio.csv");
}

#[test]
fn bad_rows_are_reported_and_exported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mixed.csv");
    fs::write(
        &input,
        "id,age,income,branch\nA-1,40,900000,north\nA-2,abc,500000,south\nA-3,17,400000,east\n",
    )
    .unwrap();

    let output = quiet_pipeline().run_batch(&input, None).unwrap();
    assert_eq!(output.summary.rows_scored, 1);
    let errors = output.row_errors();
    assert_eq!(errors.iter().map(|e| e.line).collect::<Vec<_>>(), vec![3, 4]);

    let export = dir.path().join("out/results.csv");
    write_batch_csv(&export, &output.headers, &output.rows).unwrap();

    let mut reader = csv::Reader::from_path(&export).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(&header[..4], ["id", "age", "income", "branch"]);
    assert_eq!(&header[4..], RESULT_COLUMNS);

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][3], "north");
    assert!(!records[0][5].is_empty());
    assert!(records[1][5].is_empty());
    assert!(!records[1][11].is_empty());
}

#[test]
fn file_without_valid_rows_is_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.csv");
    fs::write(&input, "age,income\nabc,1\n").unwrap();
    let err = quiet_pipeline().run_batch(&input, None).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_NO_DATA);

    let unknown = dir.path().join("unknown.csv");
    fs::write(&unknown, "foo,bar\n1,2\n").unwrap();
    let err = quiet_pipeline().run_batch(&unknown, None).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_INPUT);
}

#[test]
fn recorded_batch_lands_in_an_on_disk_store() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("inputs/small.csv");
    write_portfolio_csv(&input, &generate_portfolio(25, 3, false).unwrap()).unwrap();
    let db = dir.path().join("nested/credit.db");

    let mut output = quiet_pipeline().run_batch(&input, None).unwrap();
    {
        let mut store = ApplicationStore::open(&db).unwrap();
        assert_eq!(output.record(&mut store).unwrap(), 25);
    }
    assert!(output.rows.iter().all(|r| r.application_id.is_some()));

    let store = ApplicationStore::open(&db).unwrap();
    let stats = store.portfolio_stats().unwrap();
    assert_eq!(stats.applications, 25);
    assert!((stats.average_score - output.summary.average_score).abs() < 1e-9);

    let first = output.rows[0].application_id.clone().unwrap();
    let stored = store.get(&first).unwrap();
    assert_eq!(stored.source, "batch:small.csv");
    assert_eq!(
        stored.assessment.credit.credit_score,
        output.rows[0].outcome.as_ref().unwrap().credit.credit_score
    );
}
