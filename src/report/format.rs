//! Formatted terminal output.
//!
//! All terminal text lives here so the scoring code stays free of
//! presentation and output changes stay localized.

use crate::app::pipeline::BatchOutput;
use crate::domain::Assessment;
use crate::io::ingest::RowError;
use crate::metrics::Trend;
use crate::scoring::{recommendations, Explanation};
use crate::store::{MonthlyStats, PortfolioStats, StoredApplication};

/// Format an amount in rupees with thousands separators, no decimals.
pub fn fmt_inr(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

/// Revenue or loss line for an assessment, if its tier has one.
pub fn business_impact_line(a: &Assessment) -> Option<String> {
    if let Some(revenue) = a.potential_revenue() {
        Some(format!("High Profitability Opportunity: {}", fmt_inr(revenue)))
    } else {
        a.potential_loss_avoided()
            .map(|loss| format!("Potential Loss Avoided: {}", fmt_inr(loss)))
    }
}

/// Single-application summary.
pub fn format_assessment(a: &Assessment, application_id: Option<&str>) -> String {
    let mut out = String::new();
    let c = &a.credit;

    out.push_str("=== credit - Application Assessment ===\n");
    if let Some(id) = application_id {
        out.push_str(&format!("Application: {id}\n"));
    }
    out.push_str(&format!("Decision: {}\n", a.decision));
    out.push_str(&format!(
        "Credit score: {} | risk: {} | default probability: {:.1}%\n",
        c.credit_score, c.risk_level, c.default_probability
    ));
    out.push_str(&format!("Business impact: {}\n", c.business_impact));
    if let Some(line) = business_impact_line(a) {
        out.push_str(&format!("{line}\n"));
    }

    out.push_str(&format!(
        "Fraud: {} (score {:.4}, confidence {})\n",
        if a.fraud.is_fraud { "DETECTED" } else { "clear" },
        a.fraud.fraud_score,
        a.fraud.confidence.display_name()
    ));
    for p in &a.fraud.patterns {
        out.push_str(&format!("  - {p}\n"));
    }

    out.push_str("\nComponents:\n");
    out.push_str(&format!("  Behavioral {:>7}\n", c.components.behavioral));
    out.push_str(&format!("  Financial  {:>7}\n", c.components.financial));
    out.push_str(&format!("  Stability  {:>7}\n", c.components.stability));
    out.push_str(&format!("  Ensemble   {:>7.2}\n", c.components.ensemble));
    out.push_str(&format!("  Final      {:>7.2}\n", c.components.final_score));

    out.push_str("\nRecommendations:\n");
    for (i, rec) in recommendations(c.risk_level).iter().enumerate() {
        out.push_str(&format!("  {}. {rec}\n", i + 1));
    }
    out
}

/// Rule-by-rule score breakdown.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();
    out.push_str("Score breakdown (base 650 per component):\n");
    out.push_str(&format!("{:<12} {:>7} {}\n", "component", "points", "rule"));
    out.push_str(&format!("{:-<12} {:-<7} {:-<30}\n", "", "", ""));
    for hit in &exp.hits {
        out.push_str(&format!(
            "{:<12} {:>+7} {}\n",
            hit.component.display_name(),
            hit.points,
            hit.rule
        ));
    }
    if exp.hits.is_empty() {
        out.push_str("(no rules fired)\n");
    }
    out
}

pub fn format_batch_summary(output: &BatchOutput) -> String {
    let s = &output.summary;
    let mut out = String::new();

    out.push_str("=== credit - Batch Summary ===\n");
    out.push_str(&format!("Source: {}\n", output.source));
    out.push_str(&format!(
        "Rows: read={} scored={} errors={}\n",
        s.rows_read, s.rows_scored, s.row_errors
    ));
    out.push_str(&format!(
        "Average score: {:.1} | approval rate: {:.1}% | fraud rate: {:.1}%\n",
        s.average_score, s.approval_rate, s.fraud_rate
    ));
    out.push_str(&format!(
        "Potential revenue: {} | potential loss avoided: {}\n",
        fmt_inr(s.potential_revenue),
        fmt_inr(s.potential_loss_avoided)
    ));
    if let Some(ks) = s.ks {
        out.push_str(&format!("KS statistic: {ks:.3}\n"));
    }
    if let Some(psi) = &s.psi {
        out.push_str(&format!("PSI vs baseline: {:.4} ({})\n", psi.value, psi.stability));
    }

    out.push_str("\nRisk distribution:\n");
    for (level, count) in &s.risk_distribution {
        out.push_str(&format!("  {:<10} {count:>6}\n", level.display_name()));
    }
    out
}

/// Row errors, at most `max` of them, with a trailing count of the rest.
pub fn format_row_errors(errors: &[RowError], max: usize) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        return out;
    }
    out.push_str(&format!("Row errors ({}):\n", errors.len()));
    for e in errors.iter().take(max) {
        out.push_str(&format!(
            "  line {} [{}]: {}\n",
            e.line,
            e.id.as_deref().unwrap_or("-"),
            e.message
        ));
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

pub fn format_history(records: &[StoredApplication]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<16} {:>5} {:<9} {:<15} {:>5} {:>12} {:<20}\n",
            "id", "created", "score", "risk", "decision", "fraud", "loan", "source"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<16} {:-<5} {:-<9} {:-<15} {:-<5} {:-<12} {:-<20}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in records {
        let a = &r.assessment;
        out.push_str(
            format!(
                "{:<12} {:<16} {:>5} {:<9} {:<15} {:>5} {:>12} {:<20}\n",
                r.application_id,
                r.created_at.format("%Y-%m-%d %H:%M").to_string(),
                a.credit.credit_score,
                a.credit.risk_level.display_name(),
                a.decision.display_name(),
                if a.fraud.is_fraud { "yes" } else { "no" },
                fmt_inr(a.application.loan_amount),
                truncate(&r.source, 20),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if records.is_empty() {
        out.push_str("(no applications logged yet)\n");
    }
    out
}

pub fn format_portfolio(stats: &PortfolioStats) -> String {
    let mut out = String::new();
    out.push_str("=== credit - Portfolio ===\n");
    out.push_str(&format!("Applications: {}\n", stats.applications));
    out.push_str(&format!(
        "Approval rate: {:.1}% | fraud rate: {:.1}% | average score: {:.1}\n",
        stats.approval_rate, stats.fraud_rate, stats.average_score
    ));
    out
}

pub fn format_monthly_table(months: &[MonthlyStats], trend: Option<&Trend>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:>6} {:>9} {:>9} {:>14}\n",
        "month", "apps", "approve%", "avg", "revenue"
    ));
    out.push_str(&format!(
        "{:-<8} {:-<6} {:-<9} {:-<9} {:-<14}\n",
        "", "", "", "", ""
    ));
    for m in months {
        out.push_str(&format!(
            "{:<8} {:>6} {:>8.1}% {:>9.1} {:>14}\n",
            m.month,
            m.applications,
            m.approval_rate,
            m.average_score,
            fmt_inr(m.revenue_impact)
        ));
    }
    if let Some(t) = trend {
        out.push_str(&format!(
            "Average score trend: {:+.2} points/month\n",
            t.slope
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
