//! Shared domain types.
//!
//! These types are kept serializable so they can be:
//!
//! - read from JSON (single applications) and CSV (batches)
//! - stored as JSON blobs in the application log
//! - reloaded later to regenerate a credit report

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse external risk rating (industry or geography).
///
/// Deserialized through `FromStr`, so JSON input is case-insensitive like CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn display_name(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
        }
    }

    pub fn next(self) -> Self {
        match self {
            RiskBand::Low => RiskBand::Medium,
            RiskBand::Medium => RiskBand::High,
            RiskBand::High => RiskBand::Low,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            RiskBand::Low => RiskBand::High,
            RiskBand::Medium => RiskBand::Low,
            RiskBand::High => RiskBand::Medium,
        }
    }
}

impl FromStr for RiskBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskBand::Low),
            "medium" => Ok(RiskBand::Medium),
            "high" => Ok(RiskBand::High),
            _ => Err(format!("Invalid risk band '{s}'. Expected Low, Medium or High.")),
        }
    }
}

impl TryFrom<String> for RiskBand {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Residential status of the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PropertyOwnership {
    Owned,
    Mortgaged,
    Rented,
    Other,
}

impl PropertyOwnership {
    pub fn display_name(self) -> &'static str {
        match self {
            PropertyOwnership::Owned => "Owned",
            PropertyOwnership::Mortgaged => "Mortgaged",
            PropertyOwnership::Rented => "Rented",
            PropertyOwnership::Other => "Other",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PropertyOwnership::Owned => PropertyOwnership::Mortgaged,
            PropertyOwnership::Mortgaged => PropertyOwnership::Rented,
            PropertyOwnership::Rented => PropertyOwnership::Other,
            PropertyOwnership::Other => PropertyOwnership::Owned,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PropertyOwnership::Owned => PropertyOwnership::Other,
            PropertyOwnership::Mortgaged => PropertyOwnership::Owned,
            PropertyOwnership::Rented => PropertyOwnership::Mortgaged,
            PropertyOwnership::Other => PropertyOwnership::Rented,
        }
    }
}

impl FromStr for PropertyOwnership {
    type Err = String;

    /// Unrecognized non-empty values map to `Other`; only an empty value fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty property ownership value.".to_string());
        }
        Ok(match s.to_ascii_lowercase().as_str() {
            "owned" | "own" => PropertyOwnership::Owned,
            "mortgaged" | "mortgage" => PropertyOwnership::Mortgaged,
            "rented" | "rent" => PropertyOwnership::Rented,
            _ => PropertyOwnership::Other,
        })
    }
}

impl TryFrom<String> for PropertyOwnership {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PropertyOwnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A credit application.
///
/// Every field has a documented default; inputs that omit a field (JSON keys,
/// CSV columns, empty CSV cells) are scored with that default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub age: u32,
    /// Annual income (₹).
    pub income: f64,
    /// Bureau credit score as reported by the applicant (300–850).
    pub credit_score: u32,
    pub debt_to_income: f64,
    pub loan_amount: f64,
    /// Years with the current employer.
    pub employment_length: f64,
    pub number_of_credit_lines: u32,
    pub late_payments_90d: u32,
    pub credit_utilization: f64,
    pub recent_inquiries: u32,
    pub existing_loans: u32,
    pub savings_balance: f64,
    pub monthly_expenses: f64,
    pub education_level: String,
    pub marital_status: String,
    pub dependents: u32,
    pub property_ownership: PropertyOwnership,
    pub business_owner: bool,
    /// Years of credit history.
    pub credit_history_length: f64,
    pub industry_risk: RiskBand,
    pub geographic_risk: RiskBand,
}

impl Default for Application {
    fn default() -> Self {
        Self {
            age: 35,
            income: 500_000.0,
            credit_score: 650,
            debt_to_income: 0.3,
            loan_amount: 500_000.0,
            employment_length: 5.0,
            number_of_credit_lines: 5,
            late_payments_90d: 0,
            credit_utilization: 0.4,
            recent_inquiries: 2,
            existing_loans: 1,
            savings_balance: 100_000.0,
            monthly_expenses: 30_000.0,
            education_level: "Graduate".to_string(),
            marital_status: "Married".to_string(),
            dependents: 1,
            property_ownership: PropertyOwnership::Owned,
            business_owner: false,
            credit_history_length: 7.0,
            industry_risk: RiskBand::Medium,
            geographic_risk: RiskBand::Medium,
        }
    }
}

impl Application {
    /// Range checks shared by every input path.
    pub fn validate(&self) -> Result<(), String> {
        if !(18..=120).contains(&self.age) {
            return Err(format!("Invalid `age` {} (must be 18-120).", self.age));
        }
        if !(300..=850).contains(&self.credit_score) {
            return Err(format!(
                "Invalid `credit_score` {} (must be 300-850).",
                self.credit_score
            ));
        }

        let amounts = [
            ("income", self.income),
            ("debt_to_income", self.debt_to_income),
            ("loan_amount", self.loan_amount),
            ("employment_length", self.employment_length),
            ("credit_utilization", self.credit_utilization),
            ("savings_balance", self.savings_balance),
            ("monthly_expenses", self.monthly_expenses),
            ("credit_history_length", self.credit_history_length),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "Invalid `{name}` {value} (must be finite and >= 0)."
                ));
            }
        }
        Ok(())
    }
}

/// Risk tier assigned from the final ensemble score (best first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Excellent,
    Good,
    Medium,
    Watch,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Excellent,
        RiskLevel::Good,
        RiskLevel::Medium,
        RiskLevel::Watch,
        RiskLevel::High,
    ];

    /// Tier for a score using the 750/700/650/600 cut-offs.
    pub fn for_score(score: f64) -> Self {
        if score >= 750.0 {
            RiskLevel::Excellent
        } else if score >= 700.0 {
            RiskLevel::Good
        } else if score >= 650.0 {
            RiskLevel::Medium
        } else if score >= 600.0 {
            RiskLevel::Watch
        } else {
            RiskLevel::High
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RiskLevel::Excellent => "Excellent",
            RiskLevel::Good => "Good",
            RiskLevel::Medium => "Medium",
            RiskLevel::Watch => "Watch",
            RiskLevel::High => "High",
        }
    }

    /// Tiers eligible for automatic approval.
    pub fn is_prime(self) -> bool {
        matches!(self, RiskLevel::Excellent | RiskLevel::Good)
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown risk level '{s}'."))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Final credit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    #[serde(rename = "Review Required")]
    ReviewRequired,
}

impl Decision {
    pub fn display_name(self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::ReviewRequired => "Review Required",
        }
    }

    pub fn is_approved(self) -> bool {
        self == Decision::Approved
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Approved" => Ok(Decision::Approved),
            "Review Required" => Ok(Decision::ReviewRequired),
            other => Err(format!("Unknown decision '{other}'.")),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Per-component scores kept for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub behavioral: i32,
    pub financial: i32,
    pub stability: i32,
    /// Weighted blend of the three components, before external adjustment.
    pub ensemble: f64,
    /// Ensemble plus external adjustment, clamped to the score range.
    pub final_score: f64,
}

/// Output of the credit scoring engine for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAssessment {
    pub credit_score: i32,
    pub risk_level: RiskLevel,
    /// Probability of default in percent, one decimal.
    pub default_probability: f64,
    pub business_impact: String,
    pub components: ComponentScores,
    pub model_version: String,
}

/// Which part of the score a rule contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreComponent {
    Behavioral,
    Financial,
    Stability,
    External,
}

impl ScoreComponent {
    pub fn display_name(self) -> &'static str {
        match self {
            ScoreComponent::Behavioral => "Behavioral",
            ScoreComponent::Financial => "Financial",
            ScoreComponent::Stability => "Stability",
            ScoreComponent::External => "External",
        }
    }
}

/// A single scoring rule that fired, with its point contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHit {
    pub component: ScoreComponent,
    pub rule: String,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FraudConfidence {
    Low,
    Medium,
    High,
}

impl FraudConfidence {
    pub fn display_name(self) -> &'static str {
        match self {
            FraudConfidence::Low => "Low",
            FraudConfidence::Medium => "Medium",
            FraudConfidence::High => "High",
        }
    }
}

/// Output of the fraud rules for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub is_fraud: bool,
    /// Score in `[0, 1]`, four decimals.
    pub fraud_score: f64,
    pub indicators: usize,
    pub patterns: Vec<String>,
    pub confidence: FraudConfidence,
}

/// A fully assessed application: inputs, both assessments and the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub application: Application,
    pub credit: CreditAssessment,
    pub fraud: FraudAssessment,
    pub decision: Decision,
}

impl Assessment {
    /// Projected revenue for prime tiers (15% of the loan amount).
    pub fn potential_revenue(&self) -> Option<f64> {
        self.credit
            .risk_level
            .is_prime()
            .then(|| self.application.loan_amount * 0.15)
    }

    /// Loss avoided by declining a High-risk application (35% of the loan amount).
    pub fn potential_loss_avoided(&self) -> Option<f64> {
        (self.credit.risk_level == RiskLevel::High).then(|| self.application.loan_amount * 0.35)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Application::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_bureau_score() {
        let app = Application {
            credit_score: 900,
            ..Application::default()
        };
        let err = app.validate().unwrap_err();
        assert!(err.contains("credit_score"));
    }

    #[test]
    fn validate_rejects_negative_amounts() {
        let app = Application {
            loan_amount: -1.0,
            ..Application::default()
        };
        assert!(app.validate().unwrap_err().contains("loan_amount"));
    }

    #[test]
    fn risk_band_parsing_is_case_insensitive() {
        assert_eq!("HIGH".parse::<RiskBand>().unwrap(), RiskBand::High);
        assert_eq!(" low ".parse::<RiskBand>().unwrap(), RiskBand::Low);
        assert!("severe".parse::<RiskBand>().is_err());
        assert!("med".parse::<RiskBand>().is_err());
    }

    #[test]
    fn unknown_property_values_map_to_other() {
        assert_eq!("Own".parse::<PropertyOwnership>().unwrap(), PropertyOwnership::Owned);
        assert_eq!(
            "with parents".parse::<PropertyOwnership>().unwrap(),
            PropertyOwnership::Other
        );
        assert!("".parse::<PropertyOwnership>().is_err());
    }

    #[test]
    fn tier_cutoffs_are_inclusive() {
        assert_eq!(RiskLevel::for_score(750.0), RiskLevel::Excellent);
        assert_eq!(RiskLevel::for_score(749.9), RiskLevel::Good);
        assert_eq!(RiskLevel::for_score(650.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::for_score(600.0), RiskLevel::Watch);
        assert_eq!(RiskLevel::for_score(599.0), RiskLevel::High);
    }

    #[test]
    fn json_input_fills_missing_fields_with_defaults() {
        let app: Application =
            serde_json::from_str(r#"{"age": 29, "industry_risk": "High"}"#).unwrap();
        assert_eq!(app.age, 29);
        assert_eq!(app.industry_risk, RiskBand::High);
        assert_eq!(app.income, 500_000.0);
        assert_eq!(app.property_ownership, PropertyOwnership::Owned);
    }

    #[test]
    fn json_categoricals_parse_like_csv() {
        let app: Application = serde_json::from_str(
            r#"{"industry_risk": "HIGH", "geographic_risk": "low", "property_ownership": "Own"}"#,
        )
        .unwrap();
        assert_eq!(app.industry_risk, RiskBand::High);
        assert_eq!(app.geographic_risk, RiskBand::Low);
        assert_eq!(app.property_ownership, PropertyOwnership::Owned);

        let app: Application =
            serde_json::from_str(r#"{"property_ownership": "leased"}"#).unwrap();
        assert_eq!(app.property_ownership, PropertyOwnership::Other);

        assert!(serde_json::from_str::<Application>(r#"{"industry_risk": "severe"}"#).is_err());
    }

    #[test]
    fn stored_categoricals_round_trip() {
        let app = Application {
            property_ownership: PropertyOwnership::Rented,
            industry_risk: RiskBand::High,
            ..Application::default()
        };
        let json = serde_json::to_string(&app).unwrap();
        assert!(json.contains(r#""property_ownership":"Rented""#));
        assert_eq!(serde_json::from_str::<Application>(&json).unwrap(), app);
    }

    #[test]
    fn decision_serializes_with_display_name() {
        let json = serde_json::to_string(&Decision::ReviewRequired).unwrap();
        assert_eq!(json, "\"Review Required\"");
    }
}
