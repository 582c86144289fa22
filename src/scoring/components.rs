//! Component scorers: behavioral, financial and stability.
//!
//! Each component starts at `BASE_SCORE`, applies a handful of threshold
//! rules, and is clamped to the score range. The rules that fired are
//! recorded so the engine can explain a score.

use crate::domain::{Application, PropertyOwnership, RiskBand, RuleHit, ScoreComponent};

pub const BASE_SCORE: i32 = 650;
pub const SCORE_MIN: i32 = 300;
pub const SCORE_MAX: i32 = 850;

/// A component score and the rules that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResult {
    pub score: i32,
    pub hits: Vec<RuleHit>,
}

struct Tally {
    component: ScoreComponent,
    score: i32,
    hits: Vec<RuleHit>,
}

impl Tally {
    fn new(component: ScoreComponent, start: i32) -> Self {
        Self {
            component,
            score: start,
            hits: Vec::new(),
        }
    }

    fn apply(&mut self, points: i32, rule: impl Into<String>) {
        self.score += points;
        self.hits.push(RuleHit {
            component: self.component,
            rule: rule.into(),
            points,
        });
    }

    fn finish(self) -> ComponentResult {
        ComponentResult {
            score: clamp_score_i(self.score),
            hits: self.hits,
        }
    }
}

pub fn clamp_score_i(score: i32) -> i32 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(SCORE_MIN as f64, SCORE_MAX as f64)
}

/// Payment behavior and revolving utilization.
pub fn behavioral(app: &Application) -> ComponentResult {
    let mut t = Tally::new(ScoreComponent::Behavioral, BASE_SCORE);

    match app.late_payments_90d {
        0 => t.apply(50, "No late payments in 90 days"),
        1..=2 => t.apply(20, "At most 2 late payments in 90 days"),
        n if n > 5 => t.apply(-60, format!("{n} late payments in 90 days")),
        _ => {}
    }

    let u = app.credit_utilization;
    if u < 0.2 {
        t.apply(30, "Credit utilization below 20%");
    } else if u < 0.4 {
        t.apply(15, "Credit utilization below 40%");
    } else if u > 0.8 {
        t.apply(-40, "Credit utilization above 80%");
    }

    t.finish()
}

/// Income level and debt burden.
pub fn financial(app: &Application) -> ComponentResult {
    let mut t = Tally::new(ScoreComponent::Financial, BASE_SCORE);

    let income = app.income;
    if income > 1_000_000.0 {
        t.apply(40, "Income above ₹1,000,000");
    } else if income > 750_000.0 {
        t.apply(20, "Income above ₹750,000");
    } else if income < 300_000.0 {
        t.apply(-30, "Income below ₹300,000");
    }

    let dti = app.debt_to_income;
    if dti < 0.2 {
        t.apply(35, "Debt-to-income below 0.20");
    } else if dti < 0.35 {
        t.apply(15, "Debt-to-income below 0.35");
    } else if dti > 0.5 {
        t.apply(-40, "Debt-to-income above 0.50");
    }

    t.finish()
}

/// Employment tenure and residential stability.
pub fn stability(app: &Application) -> ComponentResult {
    let mut t = Tally::new(ScoreComponent::Stability, BASE_SCORE);

    let years = app.employment_length;
    if years > 10.0 {
        t.apply(40, "Employed more than 10 years");
    } else if years > 5.0 {
        t.apply(20, "Employed more than 5 years");
    } else if years < 2.0 {
        t.apply(-35, "Employed less than 2 years");
    }

    if app.property_ownership == PropertyOwnership::Owned {
        t.apply(25, "Owns residential property");
    }

    t.finish()
}

/// Industry and geographic adjustment applied on top of the ensemble.
pub fn external_adjustment(app: &Application) -> ComponentResult {
    // Starts at zero and is not clamped: this is a delta, not a score.
    let mut t = Tally::new(ScoreComponent::External, 0);

    match app.industry_risk {
        RiskBand::High => t.apply(-25, "High-risk industry"),
        RiskBand::Low => t.apply(15, "Low-risk industry"),
        RiskBand::Medium => {}
    }
    match app.geographic_risk {
        RiskBand::High => t.apply(-20, "High-risk geography"),
        RiskBand::Low => t.apply(10, "Low-risk geography"),
        RiskBand::Medium => {}
    }

    ComponentResult {
        score: t.score,
        hits: t.hits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_score_as_expected() {
        let app = Application::default();
        assert_eq!(behavioral(&app).score, 700);
        assert_eq!(financial(&app).score, 665);
        assert_eq!(stability(&app).score, 675);
        assert_eq!(external_adjustment(&app).score, 0);
    }

    #[test]
    fn three_to_five_late_payments_are_neutral() {
        let app = Application {
            late_payments_90d: 4,
            credit_utilization: 0.5,
            ..Application::default()
        };
        let r = behavioral(&app);
        assert_eq!(r.score, BASE_SCORE);
        assert!(r.hits.is_empty());
    }

    #[test]
    fn weak_profile_hits_every_penalty() {
        let app = Application {
            late_payments_90d: 6,
            credit_utilization: 0.9,
            income: 200_000.0,
            debt_to_income: 0.6,
            employment_length: 1.0,
            property_ownership: PropertyOwnership::Rented,
            ..Application::default()
        };
        assert_eq!(behavioral(&app).score, 550);
        assert_eq!(financial(&app).score, 580);
        assert_eq!(stability(&app).score, 615);
    }

    #[test]
    fn external_adjustment_combines_both_bands() {
        let app = Application {
            industry_risk: RiskBand::Low,
            geographic_risk: RiskBand::High,
            ..Application::default()
        };
        let r = external_adjustment(&app);
        assert_eq!(r.score, -5);
        assert_eq!(r.hits.len(), 2);
    }

    #[test]
    fn component_scores_are_clamped() {
        assert_eq!(clamp_score_i(900), SCORE_MAX);
        assert_eq!(clamp_score_i(100), SCORE_MIN);
        assert_eq!(clamp_score(851.5), 850.0);
    }
}
