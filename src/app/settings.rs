//! Runtime settings from the environment (and `.env`).
//!
//! | variable            | default          |
//! |---------------------|------------------|
//! | `CREDIT_DB_PATH`    | `data/credit.db` |
//! | `CREDIT_REPORT_DIR` | `reports`        |
//! | `CREDIT_FRAUD_SEED` | unset (entropy)  |
//! | `CREDIT_FRAUD_NOISE`| `0.2`            |
//!
//! Command-line globals override these.

use std::path::PathBuf;

use crate::app::pipeline::Pipeline;
use crate::cli::GlobalArgs;
use crate::error::AppError;
use crate::fraud::{FraudConfig, FraudDetector, FraudNoise};
use crate::scoring::ScoringEngine;

pub const DEFAULT_DB_PATH: &str = "data/credit.db";
pub const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub report_dir: PathBuf,
    pub fraud_seed: Option<u64>,
    /// Upper bound of the fraud score jitter; zero disables it.
    pub fraud_noise: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            fraud_seed: None,
            fraud_noise: FraudConfig::default().noise_max,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(v) = get("CREDIT_DB_PATH") {
            settings.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("CREDIT_REPORT_DIR") {
            settings.report_dir = PathBuf::from(v);
        }
        if let Some(v) = get("CREDIT_FRAUD_SEED") {
            let seed = v
                .parse()
                .map_err(|_| AppError::input(format!("CREDIT_FRAUD_SEED must be an integer (got '{v}').")))?;
            settings.fraud_seed = Some(seed);
        }
        if let Some(v) = get("CREDIT_FRAUD_NOISE") {
            let noise: f64 = v
                .parse()
                .map_err(|_| AppError::input(format!("CREDIT_FRAUD_NOISE must be a number (got '{v}').")))?;
            if !(noise.is_finite() && (0.0..=1.0).contains(&noise)) {
                return Err(AppError::input("CREDIT_FRAUD_NOISE must be within [0, 1]."));
            }
            settings.fraud_noise = noise;
        }
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, global: &GlobalArgs) {
        if let Some(db) = &global.db {
            self.db_path = db.clone();
        }
        if let Some(seed) = global.fraud_seed {
            self.fraud_seed = Some(seed);
        }
        if global.no_fraud_noise {
            self.fraud_noise = 0.0;
        }
    }

    pub fn fraud_config(&self) -> FraudConfig {
        let noise = if self.fraud_noise <= 0.0 {
            FraudNoise::Off
        } else if let Some(seed) = self.fraud_seed {
            FraudNoise::Seeded(seed)
        } else {
            FraudNoise::Entropy
        };
        FraudConfig {
            noise_max: self.fraud_noise,
            noise,
            ..FraudConfig::default()
        }
    }

    pub fn pipeline(&self) -> Result<Pipeline, AppError> {
        Ok(Pipeline::new(
            ScoringEngine::default(),
            FraudDetector::new(self.fraud_config())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.fraud_config().noise, FraudNoise::Entropy);
    }

    #[test]
    fn reads_every_variable() {
        let s = Settings::from_lookup(lookup(&[
            ("CREDIT_DB_PATH", "/tmp/x.db"),
            ("CREDIT_REPORT_DIR", "out"),
            ("CREDIT_FRAUD_SEED", "42"),
            ("CREDIT_FRAUD_NOISE", "0.1"),
        ]))
        .unwrap();
        assert_eq!(s.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(s.report_dir, PathBuf::from("out"));
        assert_eq!(s.fraud_config().noise, FraudNoise::Seeded(42));
        assert_eq!(s.fraud_config().noise_max, 0.1);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Settings::from_lookup(lookup(&[("CREDIT_FRAUD_SEED", "abc")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("CREDIT_FRAUD_NOISE", "2")])).is_err());
    }

    #[test]
    fn cli_overrides_win() {
        let mut s = Settings::from_lookup(lookup(&[("CREDIT_FRAUD_SEED", "1")])).unwrap();
        s.apply_overrides(&GlobalArgs {
            db: Some(PathBuf::from("other.db")),
            fraud_seed: Some(9),
            no_fraud_noise: true,
        });
        assert_eq!(s.db_path, PathBuf::from("other.db"));
        assert_eq!(s.fraud_seed, Some(9));
        assert_eq!(s.fraud_config().noise, FraudNoise::Off);
    }
}
