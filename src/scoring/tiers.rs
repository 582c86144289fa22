//! Risk tier table.
//!
//! | final ≥ | tier      | default probability band |
//! |---------|-----------|--------------------------|
//! | 750     | Excellent | (850 − s) / 20 in [1, 5]   |
//! | 700     | Good      | (850 − s) / 10 in [5, 15]  |
//! | 650     | Medium    | (850 − s) / 6  in [15, 25] |
//! | 600     | Watch     | (850 − s) / 4  in [25, 35] |
//! | else    | High      | (850 − s) / 3  in [35, 50] |

use crate::domain::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub level: RiskLevel,
    /// Percent, rounded to one decimal.
    pub default_probability: f64,
    pub business_impact: &'static str,
}

struct Band {
    divisor: f64,
    floor: f64,
    ceiling: f64,
    business_impact: &'static str,
}

fn band(level: RiskLevel) -> Band {
    match level {
        RiskLevel::Excellent => Band {
            divisor: 20.0,
            floor: 1.0,
            ceiling: 5.0,
            business_impact: "Premium Profitability",
        },
        RiskLevel::Good => Band {
            divisor: 10.0,
            floor: 5.0,
            ceiling: 15.0,
            business_impact: "High Profitability",
        },
        RiskLevel::Medium => Band {
            divisor: 6.0,
            floor: 15.0,
            ceiling: 25.0,
            business_impact: "Moderate Profitability",
        },
        RiskLevel::Watch => Band {
            divisor: 4.0,
            floor: 25.0,
            ceiling: 35.0,
            business_impact: "Marginal Profitability",
        },
        RiskLevel::High => Band {
            divisor: 3.0,
            floor: 35.0,
            ceiling: 50.0,
            business_impact: "High Risk - Review Required",
        },
    }
}

/// Classify an (unrounded) final score.
pub fn classify(final_score: f64) -> Tier {
    let level = RiskLevel::for_score(final_score);
    let b = band(level);
    let raw = ((850.0 - final_score) / b.divisor).clamp(b.floor, b.ceiling);

    Tier {
        level,
        default_probability: round_to(raw, 1),
        business_impact: b.business_impact,
    }
}

pub fn business_impact(level: RiskLevel) -> &'static str {
    band(level).business_impact
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_is_clamped_to_band() {
        // (850 - 850) / 20 = 0 -> floor of 1%.
        assert_eq!(classify(850.0).default_probability, 1.0);
        // (850 - 300) / 3 = 183 -> ceiling of 50%.
        assert_eq!(classify(300.0).default_probability, 50.0);
    }

    #[test]
    fn probability_inside_band_is_rounded() {
        // (850 - 720) / 10 = 13.0
        let t = classify(720.0);
        assert_eq!(t.level, RiskLevel::Good);
        assert_eq!(t.default_probability, 13.0);

        // (850 - 610) / 4 = 60 -> capped at 35
        let t = classify(610.0);
        assert_eq!(t.level, RiskLevel::Watch);
        assert_eq!(t.default_probability, 35.0);

        // (850 - 760) / 20 = 4.5
        let t = classify(760.0);
        assert_eq!(t.level, RiskLevel::Excellent);
        assert_eq!(t.default_probability, 4.5);
    }

    #[test]
    fn business_impact_matches_tier() {
        assert_eq!(business_impact(RiskLevel::High), "High Risk - Review Required");
        assert_eq!(classify(700.0).business_impact, "High Profitability");
    }
}
