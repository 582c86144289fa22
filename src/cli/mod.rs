//! Command-line parsing for the `credit` binary.
//!
//! Parsing and dispatch stay apart from the scoring code; `app` turns these
//! structs into pipeline calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Application, PropertyOwnership, RiskBand};
use crate::report::ReportFormat;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "credit",
    version,
    about = "Credit scoring, fraud screening and portfolio analytics"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// SQLite application log (overrides CREDIT_DB_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Seed the fraud score jitter for reproducible runs.
    #[arg(long, global = true, value_name = "N")]
    pub fraud_seed: Option<u64>,

    /// Disable the fraud score jitter entirely.
    #[arg(long, global = true)]
    pub no_fraud_noise: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score a single application from JSON and/or field flags.
    Score(ScoreArgs),
    /// Score a CSV of applications, print a summary and optionally export.
    Batch(BatchArgs),
    /// Regenerate the credit report for a logged application.
    Report(ReportArgs),
    /// List recently logged applications.
    History(HistoryArgs),
    /// Monthly portfolio trends from the application log.
    Analytics(AnalyticsArgs),
    /// Write a synthetic application portfolio CSV.
    Sample(SampleArgs),
    /// Launch the interactive dashboard.
    Tui(TuiArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScoreArgs {
    /// Application JSON; flags below override its fields.
    #[arg(long, short = 'i', value_name = "JSON")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub fields: ApplicationFields,

    /// Write a credit report (.md for Markdown, anything else plain text).
    /// Without a path, writes `<report dir>/<application id>.md`.
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub report: Option<Option<PathBuf>>,

    /// Show the rule-by-rule score breakdown.
    #[arg(long)]
    pub explain: bool,

    /// Do not log the application to the store.
    #[arg(long)]
    pub no_log: bool,
}

/// Per-field overrides for a single application.
#[derive(Debug, Clone, Default, Args)]
pub struct ApplicationFields {
    #[arg(long)]
    pub age: Option<u32>,
    /// Annual income (₹).
    #[arg(long)]
    pub income: Option<f64>,
    /// Bureau credit score (300-850).
    #[arg(long)]
    pub credit_score: Option<u32>,
    #[arg(long, visible_alias = "dti")]
    pub debt_to_income: Option<f64>,
    #[arg(long)]
    pub loan_amount: Option<f64>,
    /// Years with the current employer.
    #[arg(long)]
    pub employment_length: Option<f64>,
    #[arg(long)]
    pub credit_lines: Option<u32>,
    /// Late payments in the last 90 days.
    #[arg(long)]
    pub late_payments: Option<u32>,
    /// Revolving utilization as a fraction (0.35 = 35%).
    #[arg(long)]
    pub utilization: Option<f64>,
    #[arg(long)]
    pub inquiries: Option<u32>,
    #[arg(long)]
    pub existing_loans: Option<u32>,
    #[arg(long)]
    pub savings: Option<f64>,
    #[arg(long)]
    pub monthly_expenses: Option<f64>,
    #[arg(long)]
    pub education: Option<String>,
    #[arg(long)]
    pub marital_status: Option<String>,
    #[arg(long)]
    pub dependents: Option<u32>,
    /// owned, mortgaged, rented or anything else (other).
    #[arg(long, value_parser = str::parse::<PropertyOwnership>)]
    pub property: Option<PropertyOwnership>,
    #[arg(long)]
    pub business_owner: Option<bool>,
    /// Years of credit history.
    #[arg(long)]
    pub history_length: Option<f64>,
    /// low, medium or high.
    #[arg(long, value_parser = str::parse::<RiskBand>)]
    pub industry_risk: Option<RiskBand>,
    #[arg(long, value_parser = str::parse::<RiskBand>)]
    pub geographic_risk: Option<RiskBand>,
}

impl ApplicationFields {
    /// Overwrite fields of `app` that were given on the command line.
    pub fn apply_to(&self, app: &mut Application) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        set(&mut app.age, &self.age);
        set(&mut app.income, &self.income);
        set(&mut app.credit_score, &self.credit_score);
        set(&mut app.debt_to_income, &self.debt_to_income);
        set(&mut app.loan_amount, &self.loan_amount);
        set(&mut app.employment_length, &self.employment_length);
        set(&mut app.number_of_credit_lines, &self.credit_lines);
        set(&mut app.late_payments_90d, &self.late_payments);
        set(&mut app.credit_utilization, &self.utilization);
        set(&mut app.recent_inquiries, &self.inquiries);
        set(&mut app.existing_loans, &self.existing_loans);
        set(&mut app.savings_balance, &self.savings);
        set(&mut app.monthly_expenses, &self.monthly_expenses);
        set(&mut app.education_level, &self.education);
        set(&mut app.marital_status, &self.marital_status);
        set(&mut app.dependents, &self.dependents);
        set(&mut app.property_ownership, &self.property);
        set(&mut app.business_owner, &self.business_owner);
        set(&mut app.credit_history_length, &self.history_length);
        set(&mut app.industry_risk, &self.industry_risk);
        set(&mut app.geographic_risk, &self.geographic_risk);
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct BatchArgs {
    /// Application CSV. Without it, pick one interactively.
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Write per-row results (input columns + results) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Baseline CSV for a population stability check on scores.
    #[arg(long, value_name = "CSV")]
    pub baseline: Option<PathBuf>,

    /// Do not log scored rows to the store.
    #[arg(long)]
    pub no_log: bool,

    /// Skip the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 50)]
    pub width: usize,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Application id from `credit history`.
    #[arg(long)]
    pub id: String,

    /// Output file; prints to stdout when omitted.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (defaults to the file extension, or md on stdout).
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,
}

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyticsArgs {
    /// How many of the most recent months to show.
    #[arg(long, default_value_t = 12)]
    pub months: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,
}

#[derive(Debug, Clone, Args)]
pub struct SampleArgs {
    /// Number of applications.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub count: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Add a `defaulted` outcome column.
    #[arg(long)]
    pub labels: bool,

    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Default, Args)]
pub struct TuiArgs {
    /// Prefill the batch page with this CSV.
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub file: Option<PathBuf>,
}
