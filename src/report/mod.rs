//! Reporting: terminal text and the credit report document.

pub mod document;
pub mod format;

pub use document::{CreditReport, ReportFormat};
pub use format::*;
