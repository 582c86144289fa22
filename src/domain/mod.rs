//! Domain types used throughout the platform.
//!
//! This module defines:
//!
//! - the credit application record (`Application`) and its categorical fields
//! - scoring outputs (`ComponentScores`, `CreditAssessment`, `RiskLevel`)
//! - fraud outputs (`FraudAssessment`, `FraudConfidence`)
//! - the combined `Assessment` and its `Decision`

pub mod types;

pub use types::*;
