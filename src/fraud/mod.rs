//! Rule-based fraud screening.
//!
//! Four implausibility patterns each contribute 0.25 to the fraud score, plus
//! a small jitter so borderline applications do not collapse onto identical
//! scores. An application is flagged when the score exceeds the threshold.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::{Application, FraudAssessment, FraudConfidence};
use crate::error::AppError;
use crate::scoring::tiers::round_to;

const INDICATOR_WEIGHT: f64 = 0.25;

/// Where the score jitter comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudNoise {
    /// No jitter: the score is exactly `0.25 × indicators`.
    Off,
    /// Deterministic jitter from a SHA-256 digest of the seed and the
    /// application fields. Stable across toolchain and `rand` upgrades.
    Seeded(u64),
    /// Fresh thread-local randomness on every call.
    Entropy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FraudConfig {
    /// Scores strictly above this are flagged.
    pub threshold: f64,
    /// Upper bound (exclusive) of the uniform jitter.
    pub noise_max: f64,
    pub noise: FraudNoise,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            threshold: 0.65,
            noise_max: 0.2,
            noise: FraudNoise::Entropy,
        }
    }
}

/// A named pattern and whether it matches an application.
struct Pattern {
    name: &'static str,
    matches: fn(&Application) -> bool,
}

const PATTERNS: [Pattern; 4] = [
    Pattern {
        name: "Extreme Income for Age",
        matches: extreme_income_for_age,
    },
    Pattern {
        name: "High Income with Short Employment",
        matches: high_income_short_employment,
    },
    Pattern {
        name: "Perfect Score with Short History",
        matches: perfect_score_short_history,
    },
    Pattern {
        name: "Excessive Credit Inquiries",
        matches: excessive_inquiries,
    },
];

fn extreme_income_for_age(a: &Application) -> bool {
    a.income > 2_000_000.0 && a.age < 25
}

fn high_income_short_employment(a: &Application) -> bool {
    a.employment_length < 1.0 && a.income > 1_000_000.0
}

fn perfect_score_short_history(a: &Application) -> bool {
    a.credit_score > 800 && a.credit_history_length < 2.0
}

fn excessive_inquiries(a: &Application) -> bool {
    a.recent_inquiries > 8
}

#[derive(Debug, Clone, Default)]
pub struct FraudDetector {
    config: FraudConfig,
}

impl FraudDetector {
    pub fn new(config: FraudConfig) -> Result<Self, AppError> {
        if !(config.threshold.is_finite() && (0.0..=1.0).contains(&config.threshold)) {
            return Err(AppError::input("Fraud threshold must be within [0, 1]."));
        }
        if !(config.noise_max.is_finite() && (0.0..=1.0).contains(&config.noise_max)) {
            return Err(AppError::input("Fraud noise must be within [0, 1]."));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &FraudConfig {
        &self.config
    }

    pub fn detect(&self, app: &Application) -> FraudAssessment {
        let patterns: Vec<String> = PATTERNS
            .iter()
            .filter(|p| (p.matches)(app))
            .map(|p| p.name.to_string())
            .collect();

        let indicators = patterns.len();
        let score = (indicators as f64 * INDICATOR_WEIGHT + self.jitter(app)).min(1.0);

        FraudAssessment {
            is_fraud: score > self.config.threshold,
            fraud_score: round_to(score, 4),
            indicators,
            patterns,
            confidence: confidence_for(score),
        }
    }

    fn jitter(&self, app: &Application) -> f64 {
        let max = self.config.noise_max;
        if max <= 0.0 {
            return 0.0;
        }
        match self.config.noise {
            FraudNoise::Off => 0.0,
            FraudNoise::Seeded(seed) => unit_interval(application_digest(seed, app)) * max,
            FraudNoise::Entropy => rand::thread_rng().gen_range(0.0..max),
        }
    }
}

/// Confidence band for a fraud score.
pub fn confidence_for(score: f64) -> FraudConfidence {
    if score > 0.8 {
        FraudConfidence::High
    } else if score > 0.6 {
        FraudConfidence::Medium
    } else {
        FraudConfidence::Low
    }
}

/// Map the first 8 digest bytes (little-endian) to `[0, 1)` using the top 53 bits.
fn unit_interval(digest: [u8; 32]) -> f64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(head) >> 11) as f64 / (1u64 << 53) as f64
}

/// SHA-256 over the seed and every application field in declaration order.
///
/// Integers and float bit patterns are little-endian; strings and enum
/// display names are prefixed with their byte length as a little-endian u64.
fn application_digest(seed: u64, app: &Application) -> [u8; 32] {
    fn text(hasher: &mut Sha256, s: &str) {
        hasher.update((s.len() as u64).to_le_bytes());
        hasher.update(s.as_bytes());
    }

    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(app.age.to_le_bytes());
    hasher.update(app.income.to_bits().to_le_bytes());
    hasher.update(app.credit_score.to_le_bytes());
    hasher.update(app.debt_to_income.to_bits().to_le_bytes());
    hasher.update(app.loan_amount.to_bits().to_le_bytes());
    hasher.update(app.employment_length.to_bits().to_le_bytes());
    hasher.update(app.number_of_credit_lines.to_le_bytes());
    hasher.update(app.late_payments_90d.to_le_bytes());
    hasher.update(app.credit_utilization.to_bits().to_le_bytes());
    hasher.update(app.recent_inquiries.to_le_bytes());
    hasher.update(app.existing_loans.to_le_bytes());
    hasher.update(app.savings_balance.to_bits().to_le_bytes());
    hasher.update(app.monthly_expenses.to_bits().to_le_bytes());
    text(&mut hasher, &app.education_level);
    text(&mut hasher, &app.marital_status);
    hasher.update(app.dependents.to_le_bytes());
    text(&mut hasher, app.property_ownership.display_name());
    hasher.update([u8::from(app.business_owner)]);
    hasher.update(app.credit_history_length.to_bits().to_le_bytes());
    text(&mut hasher, app.industry_risk.display_name());
    text(&mut hasher, app.geographic_risk.display_name());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(noise: FraudNoise) -> FraudDetector {
        FraudDetector::new(FraudConfig {
            noise,
            ..FraudConfig::default()
        })
        .unwrap()
    }

    fn suspicious() -> Application {
        Application {
            age: 22,
            income: 2_500_000.0,
            employment_length: 0.5,
            credit_score: 820,
            credit_history_length: 1.0,
            ..Application::default()
        }
    }

    #[test]
    fn clean_application_has_no_patterns() {
        let result = detector(FraudNoise::Off).detect(&Application::default());
        assert!(!result.is_fraud);
        assert_eq!(result.indicators, 0);
        assert_eq!(result.fraud_score, 0.0);
        assert_eq!(result.confidence, FraudConfidence::Low);
    }

    #[test]
    fn three_patterns_are_flagged_with_medium_confidence() {
        let result = detector(FraudNoise::Off).detect(&suspicious());
        assert_eq!(
            result.patterns,
            vec![
                "Extreme Income for Age",
                "High Income with Short Employment",
                "Perfect Score with Short History",
            ]
        );
        assert_eq!(result.fraud_score, 0.75);
        assert!(result.is_fraud);
        assert_eq!(result.confidence, FraudConfidence::Medium);
    }

    #[test]
    fn all_patterns_saturate_at_one() {
        let app = Application {
            recent_inquiries: 9,
            ..suspicious()
        };
        let result = detector(FraudNoise::Seeded(7)).detect(&app);
        assert_eq!(result.indicators, 4);
        assert_eq!(result.fraud_score, 1.0);
        assert_eq!(result.confidence, FraudConfidence::High);
    }

    #[test]
    fn two_patterns_without_noise_stay_below_threshold() {
        let app = Application {
            income: 1_200_000.0,
            employment_length: 0.0,
            recent_inquiries: 10,
            ..Application::default()
        };
        let result = detector(FraudNoise::Off).detect(&app);
        assert_eq!(result.indicators, 2);
        assert_eq!(result.fraud_score, 0.5);
        assert!(!result.is_fraud);
    }

    #[test]
    fn seeded_noise_is_reproducible_and_bounded() {
        let d = detector(FraudNoise::Seeded(42));
        let app = Application::default();
        let a = d.detect(&app);
        let b = d.detect(&app);
        assert_eq!(a, b);
        assert!(a.fraud_score >= 0.0 && a.fraud_score <= 0.2);
    }

    #[test]
    fn seeded_noise_is_pinned() {
        let d = detector(FraudNoise::Seeded(42));
        assert_eq!(d.detect(&Application::default()).fraud_score, 0.0537);

        let flagged = d.detect(&suspicious());
        assert_eq!(flagged.fraud_score, 0.8846);
        assert_eq!(flagged.confidence, FraudConfidence::High);

        let other_seed = detector(FraudNoise::Seeded(7)).detect(&Application::default());
        assert_eq!(other_seed.fraud_score, 0.0405);
    }

    #[test]
    fn entropy_noise_stays_in_range() {
        let d = detector(FraudNoise::Entropy);
        for _ in 0..50 {
            let r = d.detect(&Application::default());
            assert!(r.fraud_score < 0.2 + 1e-9);
        }
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = FraudConfig {
            threshold: 1.5,
            ..FraudConfig::default()
        };
        assert!(FraudDetector::new(cfg).is_err());
    }
}
