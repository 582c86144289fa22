//! Model monitoring metrics: discrimination (KS), population stability (PSI)
//! and a least-squares trend line for the analytics views.

pub mod ks;
pub mod psi;
pub mod trend;

pub use ks::ks_statistic;
pub use psi::{psi, PsiStability};
pub use trend::{linear_trend, Trend};
