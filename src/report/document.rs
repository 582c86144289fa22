//! Credit report document.
//!
//! A per-application report with the same sections as the printed report:
//! executive summary, component scores, business impact, fraud analysis,
//! numbered recommendations and the applicant profile. Rendered to Markdown
//! or plain text.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing::info;

use crate::domain::Assessment;
use crate::error::AppError;
use crate::report::format::{business_impact_line, fmt_inr};
use crate::scoring::recommendations;

pub const REPORT_TITLE: &str = "ADVANCED ENTERPRISE AI CREDIT PLATFORM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[value(name = "md")]
    Markdown,
    Text,
}

impl ReportFormat {
    /// `.md` and `.markdown` files get Markdown; anything else plain text.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
                ReportFormat::Markdown
            }
            _ => ReportFormat::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreditReport<'a> {
    pub assessment: &'a Assessment,
    pub application_id: Option<&'a str>,
    pub generated_at: DateTime<Utc>,
}

/// Section body lines shared by both renderers.
struct Section {
    title: &'static str,
    lines: Vec<String>,
}

impl<'a> CreditReport<'a> {
    pub fn new(assessment: &'a Assessment, application_id: Option<&'a str>) -> Self {
        Self {
            assessment,
            application_id,
            generated_at: Utc::now(),
        }
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => self.render_markdown(),
            ReportFormat::Text => self.render_text(),
        }
    }

    pub fn render_markdown(&self) -> String {
        let mut out = format!("# {REPORT_TITLE}\n\n");
        for line in self.header_lines() {
            out.push_str(&format!("_{line}_  \n"));
        }
        out.push('\n');

        for section in self.sections() {
            out.push_str(&format!("## {}\n\n", section.title));
            for line in &section.lines {
                out.push_str(&format!("- {line}\n"));
            }
            out.push('\n');
        }

        out.push_str("## APPLICANT PROFILE\n\n| Field | Value |\n|---|---|\n");
        for (field, value) in self.profile_rows() {
            out.push_str(&format!("| {field} | {value} |\n"));
        }
        out
    }

    pub fn render_text(&self) -> String {
        let rule = "=".repeat(REPORT_TITLE.len());
        let mut out = format!("{rule}\n{REPORT_TITLE}\n{rule}\n");
        for line in self.header_lines() {
            out.push_str(&format!("{line}\n"));
        }
        out.push('\n');

        for section in self.sections() {
            out.push_str(&format!("{}\n{}\n", section.title, "-".repeat(section.title.len())));
            for line in &section.lines {
                out.push_str(&format!("  {line}\n"));
            }
            out.push('\n');
        }

        out.push_str("APPLICANT PROFILE\n-----------------\n");
        let rows = self.profile_rows();
        let width = rows.iter().map(|(f, _)| f.len()).max().unwrap_or(0);
        for (field, value) in rows {
            out.push_str(&format!("  {field:<width$}  {value}\n"));
        }
        out
    }

    /// Write the report, picking the format from the file extension.
    pub fn write_to(&self, path: &Path) -> Result<(), AppError> {
        self.write_as(path, ReportFormat::for_path(path))
    }

    pub fn write_as(&self, path: &Path, format: ReportFormat) -> Result<(), AppError> {
        crate::io::ensure_parent_dir(path)?;
        let body = self.render(format);
        fs::write(path, body)
            .map_err(|e| AppError::runtime(format!("Failed to write report '{}': {e}", path.display())))?;
        info!(path = %path.display(), "credit report written");
        Ok(())
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        )];
        if let Some(id) = self.application_id {
            lines.push(format!("Application ID: {id}"));
        }
        lines
    }

    fn sections(&self) -> Vec<Section> {
        let a = self.assessment;
        let c = &a.credit;

        let mut impact = Vec::new();
        if let Some(line) = business_impact_line(a) {
            impact.push(line);
        } else {
            impact.push(format!("{} (no revenue or loss projection)", c.business_impact));
        }

        let mut fraud = vec![
            format!("Fraud Score: {}", a.fraud.fraud_score),
            format!("Confidence: {}", a.fraud.confidence.display_name()),
        ];
        if !a.fraud.patterns.is_empty() {
            fraud.push(format!("Detected Patterns: {}", a.fraud.patterns.join("; ")));
        }

        vec![
            Section {
                title: "EXECUTIVE SUMMARY",
                lines: vec![
                    format!("Credit Decision: {}", a.decision),
                    format!("AI Credit Score: {}", c.credit_score),
                    format!("Risk Level: {}", c.risk_level),
                    format!("Default Probability: {:.1}%", c.default_probability),
                    format!("Business Impact: {}", c.business_impact),
                    format!("Fraud Detected: {}", if a.fraud.is_fraud { "Yes" } else { "No" }),
                ],
            },
            Section {
                title: "COMPONENT SCORE ANALYSIS",
                lines: vec![
                    format!("Behavioral: {}", c.components.behavioral),
                    format!("Financial: {}", c.components.financial),
                    format!("Stability: {}", c.components.stability),
                    format!("Ensemble: {:.2}", c.components.ensemble),
                ],
            },
            Section {
                title: "BUSINESS IMPACT ANALYSIS",
                lines: impact,
            },
            Section {
                title: "FRAUD ANALYSIS",
                lines: fraud,
            },
            Section {
                title: "STRATEGIC RECOMMENDATIONS",
                lines: recommendations(c.risk_level)
                    .iter()
                    .enumerate()
                    .map(|(i, r)| format!("{}. {r}", i + 1))
                    .collect(),
            },
        ]
    }

    fn profile_rows(&self) -> Vec<(&'static str, String)> {
        let app = &self.assessment.application;
        vec![
            ("Age", app.age.to_string()),
            ("Annual income", fmt_inr(app.income)),
            ("Bureau credit score", app.credit_score.to_string()),
            ("Loan amount", fmt_inr(app.loan_amount)),
            ("Debt-to-income", format!("{:.2}", app.debt_to_income)),
            ("Credit utilization", format!("{:.0}%", app.credit_utilization * 100.0)),
            ("Employment (years)", format!("{:.1}", app.employment_length)),
            ("Credit history (years)", format!("{:.1}", app.credit_history_length)),
            ("Late payments (90d)", app.late_payments_90d.to_string()),
            ("Recent inquiries", app.recent_inquiries.to_string()),
            ("Credit lines", app.number_of_credit_lines.to_string()),
            ("Existing loans", app.existing_loans.to_string()),
            ("Savings", fmt_inr(app.savings_balance)),
            ("Monthly expenses", fmt_inr(app.monthly_expenses)),
            ("Education", app.education_level.clone()),
            ("Marital status", app.marital_status.clone()),
            ("Dependents", app.dependents.to_string()),
            ("Property", app.property_ownership.to_string()),
            ("Business owner", if app.business_owner { "Yes" } else { "No" }.to_string()),
            ("Industry risk", app.industry_risk.to_string()),
            ("Geographic risk", app.geographic_risk.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::Pipeline;
    use crate::domain::Application;
    use crate::fraud::{FraudConfig, FraudDetector, FraudNoise};
    use crate::scoring::ScoringEngine;

    fn assessment(app: Application) -> Assessment {
        let fraud = FraudDetector::new(FraudConfig {
            noise: FraudNoise::Off,
            ..FraudConfig::default()
        })
        .unwrap();
        Pipeline::new(ScoringEngine::default(), fraud).assess(app)
    }

    fn prime() -> Application {
        Application {
            credit_utilization: 0.1,
            income: 1_500_000.0,
            debt_to_income: 0.1,
            employment_length: 12.0,
            loan_amount: 1_000_000.0,
            ..Application::default()
        }
    }

    #[test]
    fn markdown_has_every_section() {
        let a = assessment(prime());
        let md = CreditReport::new(&a, Some("abc123def456")).render_markdown();

        assert!(md.starts_with("# ADVANCED ENTERPRISE AI CREDIT PLATFORM"));
        assert!(md.contains("Application ID: abc123def456"));
        for title in [
            "## EXECUTIVE SUMMARY",
            "## COMPONENT SCORE ANALYSIS",
            "## BUSINESS IMPACT ANALYSIS",
            "## FRAUD ANALYSIS",
            "## STRATEGIC RECOMMENDATIONS",
            "## APPLICANT PROFILE",
        ] {
            assert!(md.contains(title), "missing {title}");
        }
        assert!(md.contains("- Credit Decision: Approved"));
        assert!(md.contains("High Profitability Opportunity: ₹150,000"));
        assert!(md.contains("- 1. APPROVE: High profitability potential"));
        assert!(md.contains("| Annual income | ₹1,500,000 |"));
    }

    #[test]
    fn text_report_lists_fraud_patterns() {
        let a = assessment(Application {
            age: 22,
            income: 2_500_000.0,
            employment_length: 0.5,
            ..Application::default()
        });
        let text = CreditReport::new(&a, None).render_text();
        assert!(text.contains("Fraud Detected: No"));
        assert!(text.contains(
            "Detected Patterns: Extreme Income for Age; High Income with Short Employment"
        ));
        assert!(!text.contains("Application ID"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ReportFormat::for_path(Path::new("r.md")), ReportFormat::Markdown);
        assert_eq!(ReportFormat::for_path(Path::new("r.MD")), ReportFormat::Markdown);
        assert_eq!(ReportFormat::for_path(Path::new("r.txt")), ReportFormat::Text);
        assert_eq!(ReportFormat::for_path(Path::new("report")), ReportFormat::Text);
    }
}
