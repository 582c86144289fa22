//! Rule-based ensemble credit scoring.
//!
//! Three component scores (behavioral, financial, stability) are blended with
//! fixed weights, adjusted for industry and geographic risk, clamped to
//! `[300, 850]`, and mapped to a risk tier with a default probability.
//!
//! - `components`: the per-component threshold rules
//! - `tiers`: tier table (default probability band + business impact)

use crate::domain::{
    Application, ComponentScores, CreditAssessment, Decision, FraudAssessment, RiskLevel, RuleHit,
};
use crate::error::AppError;

pub mod components;
pub mod tiers;

pub use components::{SCORE_MAX, SCORE_MIN};

pub const MODEL_VERSION: &str = "ensemble-v5.0";

/// Ensemble weights. They must sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub behavioral_weight: f64,
    pub financial_weight: f64,
    pub stability_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            behavioral_weight: 0.40,
            financial_weight: 0.35,
            stability_weight: 0.25,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        let weights = [
            self.behavioral_weight,
            self.financial_weight,
            self.stability_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AppError::input(
                "Ensemble weights must be finite and non-negative.",
            ));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(AppError::input(format!(
                "Ensemble weights must sum to 1 (got {total:.6})."
            )));
        }
        Ok(())
    }
}

/// Rule trace for a scored application.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub components: ComponentScores,
    pub hits: Vec<RuleHit>,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score an application.
    pub fn score(&self, app: &Application) -> CreditAssessment {
        let components = self.explain(app).components;
        let tier = tiers::classify(components.final_score);

        CreditAssessment {
            // Final score is clamped to [300, 850], so the cast cannot overflow.
            credit_score: components.final_score.floor() as i32,
            risk_level: tier.level,
            default_probability: tier.default_probability,
            business_impact: tier.business_impact.to_string(),
            components,
            model_version: MODEL_VERSION.to_string(),
        }
    }

    /// Compute component scores together with every rule that fired.
    pub fn explain(&self, app: &Application) -> Explanation {
        let behavioral = components::behavioral(app);
        let financial = components::financial(app);
        let stability = components::stability(app);
        let external = components::external_adjustment(app);

        let ensemble = behavioral.score as f64 * self.config.behavioral_weight
            + financial.score as f64 * self.config.financial_weight
            + stability.score as f64 * self.config.stability_weight;
        let final_score = components::clamp_score(ensemble + external.score as f64);

        let hits = [behavioral.hits, financial.hits, stability.hits, external.hits]
            .into_iter()
            .flatten()
            .collect();

        Explanation {
            components: ComponentScores {
                behavioral: behavioral.score,
                financial: financial.score,
                stability: stability.score,
                ensemble,
                final_score,
            },
            hits,
        }
    }
}

/// Approve prime tiers without a fraud flag; everything else goes to review.
pub fn decide(credit: &CreditAssessment, fraud: &FraudAssessment) -> Decision {
    if credit.risk_level.is_prime() && !fraud.is_fraud {
        Decision::Approved
    } else {
        Decision::ReviewRequired
    }
}

/// Strategic recommendations for a risk tier, most important first.
pub fn recommendations(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Excellent | RiskLevel::Good => &[
            "APPROVE: High profitability potential",
            "Consider premium product offerings",
        ],
        RiskLevel::Medium => &["CONDITIONAL APPROVAL: Additional verification recommended"],
        RiskLevel::Watch | RiskLevel::High => &[
            "DECLINE: High risk profile",
            "Suggest secured credit alternatives",
        ],
    }
}
