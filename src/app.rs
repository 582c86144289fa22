//! Top-level application orchestration.
//!
//! `src/main.rs` only maps errors to exit codes; this module is the real
//! entry point. It:
//! - parses CLI arguments (defaulting to the dashboard)
//! - installs the tracing subscriber
//! - loads settings from the environment and CLI globals
//! - dispatches to one handler per subcommand

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{
    AnalyticsArgs, BatchArgs, Cli, Command, HistoryArgs, ReportArgs, SampleArgs, ScoreArgs,
    TuiArgs,
};
use crate::domain::{Application, ComponentScores, RiskLevel};
use crate::error::AppError;
use crate::report::{CreditReport, ReportFormat};
use crate::store::ApplicationStore;

pub mod pipeline;
pub mod settings;

use settings::Settings;

/// Maximum row errors echoed after a batch run.
const MAX_ROW_ERRORS: usize = 10;

/// Entry point for the `credit` binary.
pub fn run() -> Result<(), AppError> {
    // `credit` alone, or `credit --db x.db`, opens the dashboard. Clap needs
    // a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    init_tracing(matches!(cli.command, Command::Tui(_)));

    let mut settings = Settings::from_env()?;
    settings.apply_overrides(&cli.global);
    debug!(?settings, "settings loaded");

    match cli.command {
        Command::Score(args) => handle_score(args, &settings),
        Command::Batch(args) => handle_batch(args, &settings),
        Command::Report(args) => handle_report(args, &settings),
        Command::History(args) => handle_history(args, &settings),
        Command::Analytics(args) => handle_analytics(args, &settings),
        Command::Sample(args) => handle_sample(args),
        Command::Tui(args) => handle_tui(args, settings),
    }
}

/// Logs go to stderr. The dashboard owns the terminal, so it stays silent
/// unless `RUST_LOG` asks otherwise.
fn init_tracing(dashboard: bool) {
    let default_filter = if dashboard { "off" } else { "credit_scoring=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn handle_score(args: ScoreArgs, settings: &Settings) -> Result<(), AppError> {
    let mut application = match &args.input {
        Some(path) => crate::io::load_application_json(path)?,
        None => Application::default(),
    };
    args.fields.apply_to(&mut application);
    application.validate().map_err(AppError::input)?;

    let pipeline = settings.pipeline()?;
    let assessment = pipeline.assess(application);

    let application_id = if args.no_log {
        None
    } else {
        let store = ApplicationStore::open(&settings.db_path)?;
        let id = store.log_application(&assessment, "cli:score")?;
        info!(application_id = %id, db = %settings.db_path.display(), "application logged");
        Some(id)
    };

    println!(
        "{}",
        crate::report::format_assessment(&assessment, application_id.as_deref())
    );

    if args.explain {
        let explanation = pipeline.engine.explain(&assessment.application);
        println!("{}", crate::report::format_explanation(&explanation));
        println!(
            "{}",
            crate::plot::render_bar_chart(&component_bars(&explanation.components), 40)
        );
    }

    if let Some(target) = &args.report {
        let path = target.clone().unwrap_or_else(|| {
            settings.report_dir.join(format!(
                "{}.md",
                application_id.as_deref().unwrap_or("credit_report")
            ))
        });
        CreditReport::new(&assessment, application_id.as_deref()).write_to(&path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn handle_batch(args: BatchArgs, settings: &Settings) -> Result<(), AppError> {
    let path = match &args.file {
        Some(path) => crate::cli::picker::validate_csv_path(path)?,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };

    let pipeline = settings.pipeline()?;
    let mut output = pipeline.run_batch(&path, args.baseline.as_deref())?;

    if !args.no_log {
        let mut store = ApplicationStore::open(&settings.db_path)?;
        let logged = output.record(&mut store)?;
        info!(logged, db = %settings.db_path.display(), "batch logged");
    }

    println!("{}", crate::report::format_batch_summary(&output));

    let errors = output.row_errors();
    if !errors.is_empty() {
        eprint!("{}", crate::report::format_row_errors(&errors, MAX_ROW_ERRORS));
    }

    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_bar_chart(
                &distribution_bars(&output.summary.risk_distribution),
                args.width
            )
        );
    }

    if let Some(export) = &args.export {
        crate::io::write_batch_csv(export, &output.headers, &output.rows)?;
        println!("Results written to {}", export.display());
    }

    Ok(())
}

fn handle_report(args: ReportArgs, settings: &Settings) -> Result<(), AppError> {
    let store = ApplicationStore::open(&settings.db_path)?;
    let record = store.get(args.id.trim())?;
    let report = CreditReport::new(&record.assessment, Some(&record.application_id));

    match &args.output {
        Some(path) => {
            let format = args.format.unwrap_or_else(|| ReportFormat::for_path(path));
            report.write_as(path, format)?;
            println!("Report written to {}", path.display());
        }
        None => print!("{}", report.render(args.format.unwrap_or(ReportFormat::Markdown))),
    }
    Ok(())
}

fn handle_history(args: HistoryArgs, settings: &Settings) -> Result<(), AppError> {
    let store = ApplicationStore::open(&settings.db_path)?;
    let records = store.recent(args.limit)?;
    print!("{}", crate::report::format_history(&records));
    Ok(())
}

fn handle_analytics(args: AnalyticsArgs, settings: &Settings) -> Result<(), AppError> {
    let store = ApplicationStore::open(&settings.db_path)?;
    let stats = store.portfolio_stats()?;
    if stats.applications == 0 {
        return Err(AppError::no_data(
            "No applications logged yet. Score some with `credit score` or `credit batch`.",
        ));
    }

    let months = store.monthly_stats(args.months)?;
    let labels: Vec<String> = months.iter().map(|m| m.month.clone()).collect();
    let averages: Vec<f64> = months.iter().map(|m| m.average_score).collect();
    let trend = crate::metrics::linear_trend(&averages);

    println!("{}", crate::report::format_portfolio(&stats));
    println!(
        "{}",
        crate::plot::render_bar_chart(&distribution_bars(&stats.risk_distribution), 40)
    );
    println!(
        "{}",
        crate::report::format_monthly_table(&months, trend.as_ref())
    );
    if months.len() >= 2 {
        println!(
            "{}",
            crate::plot::render_trend_plot(
                "Average score by month",
                &labels,
                &averages,
                trend.as_ref(),
                args.width,
                args.height,
            )
        );
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let rows = crate::data::generate_portfolio(args.count, args.seed, args.labels)?;
    crate::data::write_portfolio_csv(&args.output, &rows)?;
    info!(count = rows.len(), seed = args.seed, "sample portfolio generated");
    println!(
        "Wrote {} applications to {}",
        rows.len(),
        args.output.display()
    );
    Ok(())
}

fn handle_tui(args: TuiArgs, settings: Settings) -> Result<(), AppError> {
    crate::tui::run(settings, args.file)
}

pub(crate) fn component_bars(c: &ComponentScores) -> Vec<(String, f64)> {
    vec![
        ("Behavioral".to_string(), c.behavioral as f64),
        ("Financial".to_string(), c.financial as f64),
        ("Stability".to_string(), c.stability as f64),
        ("Ensemble".to_string(), c.ensemble),
    ]
}

pub(crate) fn distribution_bars(distribution: &[(RiskLevel, usize)]) -> Vec<(String, f64)> {
    distribution
        .iter()
        .map(|(level, count)| (level.display_name().to_string(), *count as f64))
        .collect()
}

/// Rewrite argv so `credit` defaults to `credit tui`.
///
/// Rules:
/// - `credit`                      -> `credit tui`
/// - `credit --db x.db ...`        -> `credit tui --db x.db ...`
/// - `credit --help/--version/-h`  -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    if matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    ) {
        return argv;
    }

    if matches!(
        arg1.as_str(),
        "score" | "batch" | "report" | "history" | "analytics" | "sample" | "tui"
    ) {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_dashboard() {
        assert_eq!(rewrite_args(args(&["credit"])), args(&["credit", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_dashboard() {
        assert_eq!(
            rewrite_args(args(&["credit", "--db", "x.db"])),
            args(&["credit", "tui", "--db", "x.db"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for argv in [
            args(&["credit", "batch", "-f", "a.csv"]),
            args(&["credit", "--help"]),
            args(&["credit", "-V"]),
            args(&["credit", "sample", "-o", "x.csv"]),
        ] {
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }

    #[test]
    fn rewritten_args_parse() {
        let cli = Cli::parse_from(rewrite_args(args(&["credit", "--no-fraud-noise"])));
        assert!(matches!(cli.command, Command::Tui(_)));
        assert!(cli.global.no_fraud_noise);
    }

    #[test]
    fn distribution_bars_keep_tier_order() {
        let bars = distribution_bars(&[(RiskLevel::Good, 3), (RiskLevel::High, 1)]);
        assert_eq!(
            bars,
            vec![("Good".to_string(), 3.0), ("High".to_string(), 1.0)]
        );
    }
}
