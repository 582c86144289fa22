//! Synthetic application portfolios.
//!
//! Applicant attributes are drawn from loosely realistic distributions with a
//! seeded RNG, so the same seed always yields the same portfolio. A small
//! share of applicants get an implausible profile to exercise the fraud rules.

use std::path::Path;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Beta, LogNormal, Normal, Poisson};

use crate::domain::{Application, PropertyOwnership, RiskBand};
use crate::error::AppError;
use crate::scoring::ScoringEngine;

/// Share of applicants generated with a fraud-like profile.
const SUSPICIOUS_SHARE: f64 = 0.03;

pub const EDUCATION_LEVELS: [&str; 4] = ["High School", "Graduate", "Post Graduate", "Doctorate"];
pub const MARITAL_STATUSES: [&str; 3] = ["Single", "Married", "Divorced"];

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub id: String,
    pub application: Application,
    pub defaulted: Option<bool>,
}

struct Distributions {
    age: Normal<f64>,
    income: LogNormal<f64>,
    bureau: Normal<f64>,
    dti: Normal<f64>,
    tenure: Normal<f64>,
    history: Normal<f64>,
    utilization: Beta<f64>,
    credit_lines: Poisson<f64>,
    late: Poisson<f64>,
    inquiries: Poisson<f64>,
    loans: Poisson<f64>,
    dependents: Poisson<f64>,
    property: WeightedIndex<f64>,
    band: WeightedIndex<f64>,
}

impl Distributions {
    fn new() -> Result<Self, AppError> {
        let err = |e: &dyn std::fmt::Display| AppError::runtime(format!("Sample distribution error: {e}"));
        Ok(Self {
            age: Normal::new(38.0, 10.0).map_err(|e| err(&e))?,
            income: LogNormal::new(600_000f64.ln(), 0.5).map_err(|e| err(&e))?,
            bureau: Normal::new(680.0, 60.0).map_err(|e| err(&e))?,
            dti: Normal::new(0.32, 0.12).map_err(|e| err(&e))?,
            tenure: Normal::new(6.0, 4.0).map_err(|e| err(&e))?,
            history: Normal::new(8.0, 5.0).map_err(|e| err(&e))?,
            utilization: Beta::new(2.0, 4.0).map_err(|e| err(&e))?,
            credit_lines: Poisson::new(5.0).map_err(|e| err(&e))?,
            late: Poisson::new(0.6).map_err(|e| err(&e))?,
            inquiries: Poisson::new(2.0).map_err(|e| err(&e))?,
            loans: Poisson::new(1.0).map_err(|e| err(&e))?,
            dependents: Poisson::new(1.2).map_err(|e| err(&e))?,
            property: WeightedIndex::new([0.35, 0.25, 0.35, 0.05]).map_err(|e| err(&e))?,
            band: WeightedIndex::new([0.3, 0.5, 0.2]).map_err(|e| err(&e))?,
        })
    }
}

/// Generate `count` applications from `seed`.
///
/// With `with_labels`, each row also gets a default outcome drawn with the
/// scored default probability.
pub fn generate_portfolio(count: usize, seed: u64, with_labels: bool) -> Result<Vec<SampleRow>, AppError> {
    if count == 0 {
        return Err(AppError::input("Sample count must be > 0."));
    }

    let dist = Distributions::new()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let engine = ScoringEngine::default();

    let mut rows = Vec::with_capacity(count);
    for i in 0..count {
        let mut application = draw_application(&mut rng, &dist);
        if rng.gen_bool(SUSPICIOUS_SHARE) {
            make_suspicious(&mut rng, &mut application);
        }

        let defaulted = with_labels.then(|| {
            let p = engine.score(&application).default_probability / 100.0;
            rng.gen_bool(p.clamp(0.0, 1.0))
        });

        rows.push(SampleRow {
            id: format!("APP-{:05}", i + 1),
            application,
            defaulted,
        });
    }
    Ok(rows)
}

fn draw_application(rng: &mut StdRng, d: &Distributions) -> Application {
    let age = d.age.sample(rng).round().clamp(21.0, 70.0);
    let income = round_to_step(d.income.sample(rng).clamp(150_000.0, 5_000_000.0), 1_000.0);
    let loan_amount = round_to_step(income * rng.gen_range(0.3..1.5), 1_000.0);
    let history_cap = age - 18.0;

    Application {
        age: age as u32,
        income,
        credit_score: d.bureau.sample(rng).round().clamp(300.0, 850.0) as u32,
        debt_to_income: round_to_step(d.dti.sample(rng).clamp(0.02, 0.9), 0.01),
        loan_amount,
        employment_length: round_to_step(d.tenure.sample(rng).clamp(0.0, history_cap), 0.1),
        number_of_credit_lines: count(d.credit_lines.sample(rng)),
        late_payments_90d: count(d.late.sample(rng)),
        credit_utilization: round_to_step(d.utilization.sample(rng), 0.01),
        recent_inquiries: count(d.inquiries.sample(rng)),
        existing_loans: count(d.loans.sample(rng)),
        savings_balance: round_to_step(income * rng.gen_range(0.05..0.6), 1_000.0),
        monthly_expenses: round_to_step(income / 12.0 * rng.gen_range(0.3..0.7), 100.0),
        education_level: pick(rng, &EDUCATION_LEVELS).to_string(),
        marital_status: pick(rng, &MARITAL_STATUSES).to_string(),
        dependents: count(d.dependents.sample(rng)).min(6),
        property_ownership: match d.property.sample(rng) {
            0 => PropertyOwnership::Owned,
            1 => PropertyOwnership::Mortgaged,
            2 => PropertyOwnership::Rented,
            _ => PropertyOwnership::Other,
        },
        business_owner: rng.gen_bool(0.15),
        credit_history_length: round_to_step(d.history.sample(rng).clamp(0.0, history_cap), 0.1),
        industry_risk: band(d.band.sample(rng)),
        geographic_risk: band(d.band.sample(rng)),
    }
}

/// Young, very high income, barely employed, thin file, many inquiries.
fn make_suspicious(rng: &mut StdRng, app: &mut Application) {
    app.age = rng.gen_range(21..25);
    app.income = round_to_step(rng.gen_range(2_100_000.0..4_000_000.0), 1_000.0);
    app.employment_length = round_to_step(rng.gen_range(0.0..0.9), 0.1);
    app.credit_score = rng.gen_range(805..=850);
    app.credit_history_length = round_to_step(rng.gen_range(0.0..1.5), 0.1);
    app.recent_inquiries = rng.gen_range(9..15);
}

fn band(idx: usize) -> RiskBand {
    match idx {
        0 => RiskBand::Low,
        1 => RiskBand::Medium,
        _ => RiskBand::High,
    }
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn count(v: f64) -> u32 {
    v.max(0.0).round() as u32
}

fn round_to_step(v: f64, step: f64) -> f64 {
    // Round through the reciprocal so decimal steps print cleanly.
    let inv = 1.0 / step;
    (v * inv).round() / inv
}

/// Write rows as a CSV the batch ingest reads unchanged.
pub fn write_portfolio_csv(path: &Path, rows: &[SampleRow]) -> Result<(), AppError> {
    crate::io::ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::runtime(format!("Failed to create sample CSV '{}': {e}", path.display()))
    })?;
    write_rows(&mut writer, rows)?;
    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to write sample CSV: {e}")))
}

fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, rows: &[SampleRow]) -> Result<(), AppError> {
    let row_err = |e: csv::Error| AppError::runtime(format!("Failed to write sample CSV row: {e}"));
    let labelled = rows.iter().any(|r| r.defaulted.is_some());

    let mut header = vec![
        "id",
        "age",
        "income",
        "credit_score",
        "debt_to_income",
        "loan_amount",
        "employment_length",
        "number_of_credit_lines",
        "late_payments_90d",
        "credit_utilization",
        "recent_inquiries",
        "existing_loans",
        "savings_balance",
        "monthly_expenses",
        "education_level",
        "marital_status",
        "dependents",
        "property_ownership",
        "business_owner",
        "credit_history_length",
        "industry_risk",
        "geographic_risk",
    ];
    if labelled {
        header.push("defaulted");
    }
    writer.write_record(&header).map_err(row_err)?;

    for row in rows {
        let a = &row.application;
        let mut record = vec![
            row.id.clone(),
            a.age.to_string(),
            a.income.to_string(),
            a.credit_score.to_string(),
            a.debt_to_income.to_string(),
            a.loan_amount.to_string(),
            a.employment_length.to_string(),
            a.number_of_credit_lines.to_string(),
            a.late_payments_90d.to_string(),
            a.credit_utilization.to_string(),
            a.recent_inquiries.to_string(),
            a.existing_loans.to_string(),
            a.savings_balance.to_string(),
            a.monthly_expenses.to_string(),
            a.education_level.clone(),
            a.marital_status.clone(),
            a.dependents.to_string(),
            a.property_ownership.to_string(),
            a.business_owner.to_string(),
            a.credit_history_length.to_string(),
            a.industry_risk.to_string(),
            a.geographic_risk.to_string(),
        ];
        if labelled {
            record.push(match row.defaulted {
                Some(true) => "1".to_string(),
                Some(false) => "0".to_string(),
                None => String::new(),
            });
        }
        writer.write_record(&record).map_err(row_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::read_applications;

    #[test]
    fn same_seed_same_portfolio() {
        let a = generate_portfolio(50, 7, true).unwrap();
        let b = generate_portfolio(50, 7, true).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, generate_portfolio(50, 8, true).unwrap());
    }

    #[test]
    fn generated_applications_are_valid() {
        for row in generate_portfolio(500, 42, false).unwrap() {
            assert!(row.application.validate().is_ok(), "{:?}", row.application);
            assert!(row.defaulted.is_none());
        }
    }

    #[test]
    fn csv_reads_back_through_ingest() {
        let rows = generate_portfolio(25, 1, true).unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_rows(&mut writer, &rows).unwrap();
        let bytes = writer.into_inner().unwrap();

        let batch = read_applications(bytes.as_slice()).unwrap();
        assert_eq!(batch.rows_valid(), 25);
        for (entry, row) in batch.entries.iter().zip(&rows) {
            let parsed = entry.parsed.as_ref().unwrap();
            assert_eq!(entry.id, row.id);
            assert_eq!(parsed.application, row.application);
            assert_eq!(parsed.defaulted, row.defaulted);
        }
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(generate_portfolio(0, 1, false).is_err());
    }
}
