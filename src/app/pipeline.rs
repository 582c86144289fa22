//! Shared scoring pipeline used by both CLI and TUI front-ends.
//!
//! Application -> credit score + fraud screen -> decision, for one
//! application or a whole CSV batch. The front-ends only present results.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{Application, Assessment, RiskLevel};
use crate::error::AppError;
use crate::fraud::FraudDetector;
use crate::io::ingest::{load_applications, IngestEntry, IngestedBatch, RowError};
use crate::metrics::{ks_statistic, psi, PsiStability};
use crate::scoring::{decide, ScoringEngine};
use crate::store::ApplicationStore;

/// Quantile bins used for the baseline stability check.
pub const PSI_BINS: usize = 10;

/// Score one application and decide on it.
pub fn assess(engine: &ScoringEngine, fraud: &FraudDetector, application: Application) -> Assessment {
    let credit = engine.score(&application);
    let fraud = fraud.detect(&application);
    let decision = decide(&credit, &fraud);
    Assessment {
        application,
        credit,
        fraud,
        decision,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub engine: ScoringEngine,
    pub fraud: FraudDetector,
}

/// One input row and its result.
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub line: usize,
    pub id: String,
    /// Raw input cells, for export.
    pub fields: Vec<String>,
    pub defaulted: Option<bool>,
    /// Set once the row has been logged to the store.
    pub application_id: Option<String>,
    pub outcome: Result<Assessment, String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsiReport {
    pub value: f64,
    pub stability: PsiStability,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub rows_read: usize,
    pub rows_scored: usize,
    pub row_errors: usize,
    pub average_score: f64,
    /// Percent.
    pub approval_rate: f64,
    /// Percent.
    pub fraud_rate: f64,
    /// Count per tier, best first, zero-filled.
    pub risk_distribution: Vec<(RiskLevel, usize)>,
    pub potential_revenue: f64,
    pub potential_loss_avoided: f64,
    /// KS of default probability against observed defaults, when labelled.
    pub ks: Option<f64>,
    /// Score drift against a baseline file, when one was given.
    pub psi: Option<PsiReport>,
}

#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// `batch:<file name>`.
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
}

impl BatchOutput {
    pub fn assessments(&self) -> impl Iterator<Item = &Assessment> {
        self.rows.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    pub fn row_errors(&self) -> Vec<RowError> {
        self.rows
            .iter()
            .filter_map(|r| {
                r.outcome.as_ref().err().map(|message| RowError {
                    line: r.line,
                    id: Some(r.id.clone()),
                    message: message.clone(),
                })
            })
            .collect()
    }

    /// Log every scored row in one transaction and remember the ids.
    pub fn record(&mut self, store: &mut ApplicationStore) -> Result<usize, AppError> {
        let scored: Vec<Assessment> = self.assessments().cloned().collect();
        let ids = store.log_batch(&scored, &self.source)?;

        let mut ids = ids.into_iter();
        for row in self.rows.iter_mut().filter(|r| r.outcome.is_ok()) {
            row.application_id = ids.next();
        }
        Ok(scored.len())
    }
}

impl Pipeline {
    pub fn new(engine: ScoringEngine, fraud: FraudDetector) -> Self {
        Self { engine, fraud }
    }

    pub fn assess(&self, application: Application) -> Assessment {
        assess(&self.engine, &self.fraud, application)
    }

    /// Load, score and summarize a batch file, optionally against a baseline.
    pub fn run_batch(&self, path: &Path, baseline: Option<&Path>) -> Result<BatchOutput, AppError> {
        let batch = load_applications(path)?;
        let source = format!(
            "batch:{}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        );
        let mut output = self.score_batch(batch, source);

        if let Some(baseline) = baseline {
            let reference = self.score_batch(load_applications(baseline)?, "baseline".to_string());
            let expected: Vec<f64> = scores(&reference);
            let actual: Vec<f64> = scores(&output);
            output.summary.psi = psi(&expected, &actual, PSI_BINS).map(|value| PsiReport {
                value,
                stability: PsiStability::classify(value),
            });
            if output.summary.psi.is_none() {
                warn!(baseline = %baseline.display(), "baseline too narrow for a stability index");
            }
        }

        info!(
            source = %output.source,
            read = output.summary.rows_read,
            scored = output.summary.rows_scored,
            errors = output.summary.row_errors,
            "batch scored"
        );
        Ok(output)
    }

    /// Score already-ingested rows in parallel. Output order follows input order.
    pub fn score_batch(&self, batch: IngestedBatch, source: String) -> BatchOutput {
        let rows: Vec<BatchRow> = batch
            .entries
            .into_par_iter()
            .map(|entry| self.score_entry(entry))
            .collect();

        for row in &rows {
            if let Err(message) = &row.outcome {
                debug!(line = row.line, id = %row.id, %message, "row skipped");
            }
        }

        let summary = summarize(&rows);
        BatchOutput {
            source,
            headers: batch.headers,
            rows,
            summary,
        }
    }

    fn score_entry(&self, entry: IngestEntry) -> BatchRow {
        let (defaulted, outcome) = match entry.parsed {
            Ok(parsed) => (parsed.defaulted, Ok(self.assess(parsed.application))),
            Err(message) => (None, Err(message)),
        };
        BatchRow {
            line: entry.line,
            id: entry.id,
            fields: entry.fields,
            defaulted,
            application_id: None,
            outcome,
        }
    }
}

fn scores(output: &BatchOutput) -> Vec<f64> {
    output
        .assessments()
        .map(|a| a.credit.credit_score as f64)
        .collect()
}

pub fn summarize(rows: &[BatchRow]) -> BatchSummary {
    let scored: Vec<&Assessment> = rows.iter().filter_map(|r| r.outcome.as_ref().ok()).collect();
    let n = scored.len();
    let pct = |count: usize| if n == 0 { 0.0 } else { count as f64 / n as f64 * 100.0 };

    let average_score = if n == 0 {
        0.0
    } else {
        scored.iter().map(|a| a.credit.credit_score as f64).sum::<f64>() / n as f64
    };
    let approved = scored.iter().filter(|a| a.decision.is_approved()).count();
    let fraud = scored.iter().filter(|a| a.fraud.is_fraud).count();

    let risk_distribution = RiskLevel::ALL
        .iter()
        .map(|&level| {
            let count = scored.iter().filter(|a| a.credit.risk_level == level).count();
            (level, count)
        })
        .collect();

    let (labels, probabilities): (Vec<bool>, Vec<f64>) = rows
        .iter()
        .filter_map(|r| match (&r.outcome, r.defaulted) {
            (Ok(a), Some(label)) => Some((label, a.credit.default_probability)),
            _ => None,
        })
        .unzip();
    let both_classes = labels.iter().any(|&l| l) && labels.iter().any(|&l| !l);
    let ks = both_classes.then(|| ks_statistic(&labels, &probabilities));

    BatchSummary {
        rows_read: rows.len(),
        rows_scored: n,
        row_errors: rows.len() - n,
        average_score,
        approval_rate: pct(approved),
        fraud_rate: pct(fraud),
        risk_distribution,
        potential_revenue: scored.iter().filter_map(|a| a.potential_revenue()).sum(),
        potential_loss_avoided: scored.iter().filter_map(|a| a.potential_loss_avoided()).sum(),
        ks,
        psi: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decision;
    use crate::fraud::{FraudConfig, FraudNoise};
    use crate::io::ingest::read_applications;

    fn pipeline() -> Pipeline {
        let fraud = FraudDetector::new(FraudConfig {
            noise: FraudNoise::Off,
            ..FraudConfig::default()
        })
        .unwrap();
        Pipeline::new(ScoringEngine::default(), fraud)
    }

    const CSV: &str = "\
id,income,credit_utilization,debt_to_income,employment_length,loan_amount,late_payments_90d,property_ownership,defaulted
good,1500000,0.1,0.1,12,1000000,0,Owned,0
mid,500000,0.4,0.3,5,500000,0,Owned,0
weak,200000,0.9,0.6,1,400000,6,Rented,1
broken,abc,0.4,0.3,5,500000,0,Owned,0
";

    #[test]
    fn batch_preserves_order_and_counts() {
        let batch = read_applications(CSV.as_bytes()).unwrap();
        let out = pipeline().score_batch(batch, "batch:test.csv".to_string());

        let ids: Vec<&str> = out.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "mid", "weak", "broken"]);

        let s = &out.summary;
        assert_eq!(s.rows_read, 4);
        assert_eq!(s.rows_scored, 3);
        assert_eq!(s.row_errors, 1);
        assert!((s.approval_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.fraud_rate, 0.0);
        assert!(s.risk_distribution.contains(&(RiskLevel::Good, 1)));
        assert!(s.risk_distribution.contains(&(RiskLevel::High, 1)));
        // 15% of the approved loan; 35% of the declined High-risk loan.
        assert!((s.potential_revenue - 150_000.0).abs() < 1e-6);
        assert!((s.potential_loss_avoided - 140_000.0).abs() < 1e-6);
    }

    #[test]
    fn labelled_batch_reports_ks() {
        let batch = read_applications(CSV.as_bytes()).unwrap();
        let out = pipeline().score_batch(batch, "batch:test.csv".to_string());
        // The only defaulter has the highest default probability.
        assert_eq!(out.summary.ks, Some(1.0));
    }

    #[test]
    fn unlabelled_batch_has_no_ks() {
        let batch = read_applications("id,age\na,30\nb,40\n".as_bytes()).unwrap();
        let out = pipeline().score_batch(batch, "batch:x".to_string());
        assert_eq!(out.summary.ks, None);
    }

    #[test]
    fn recorded_rows_get_application_ids() {
        let batch = read_applications(CSV.as_bytes()).unwrap();
        let mut out = pipeline().score_batch(batch, "batch:test.csv".to_string());
        let mut store = ApplicationStore::open_in_memory().unwrap();

        assert_eq!(out.record(&mut store).unwrap(), 3);
        assert!(out.rows[..3].iter().all(|r| r.application_id.is_some()));
        assert!(out.rows[3].application_id.is_none());

        let id = out.rows[0].application_id.clone().unwrap();
        let stored = store.get(&id).unwrap();
        assert_eq!(stored.source, "batch:test.csv");
        assert_eq!(stored.assessment.decision, Decision::Approved);
    }
}
