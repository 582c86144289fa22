//! Population stability index over quantile bins of a baseline sample.

use std::fmt;

/// Floor applied to empty bins so the log term stays finite.
const EMPTY_BIN: f64 = 1e-6;

/// Interpretation bands for a PSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsiStability {
    Stable,
    ModerateShift,
    SignificantShift,
}

impl PsiStability {
    pub fn classify(psi: f64) -> Self {
        if psi < 0.1 {
            PsiStability::Stable
        } else if psi < 0.25 {
            PsiStability::ModerateShift
        } else {
            PsiStability::SignificantShift
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PsiStability::Stable => "stable",
            PsiStability::ModerateShift => "moderate shift",
            PsiStability::SignificantShift => "significant shift",
        }
    }
}

impl fmt::Display for PsiStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// PSI of `actual` against `expected`, binned on `expected` quantiles.
///
/// Returns `None` when either sample is empty, the baseline collapses to a
/// single edge, or no `actual` value falls inside the baseline range.
pub fn psi(expected: &[f64], actual: &[f64], bins: usize) -> Option<f64> {
    if expected.is_empty() || actual.is_empty() || bins == 0 {
        return None;
    }

    let mut sorted: Vec<f64> = expected.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| quantile(&sorted, i as f64 / bins as f64))
        .collect();
    edges.dedup();
    if edges.len() < 2 {
        return None;
    }

    let expected_counts = bin_counts(&sorted, &edges);
    let actual_counts = bin_counts(actual, &edges);

    let expected_total: usize = expected_counts.iter().sum();
    let actual_total: usize = actual_counts.iter().sum();
    if expected_total == 0 || actual_total == 0 {
        return None;
    }

    let value = expected_counts
        .iter()
        .zip(&actual_counts)
        .map(|(&e, &a)| {
            let e = proportion(e, expected_total);
            let a = proportion(a, actual_total);
            (a - e) * (a / e).ln()
        })
        .sum();
    Some(value)
}

fn proportion(count: usize, total: usize) -> f64 {
    let p = count as f64 / total as f64;
    if p == 0.0 { EMPTY_BIN } else { p }
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Bins are `(edge[k], edge[k+1]]`, except the first which also includes its
/// left edge. Values outside the edges are dropped.
fn bin_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let mut counts = vec![0usize; edges.len() - 1];
    let (first, last) = (edges[0], edges[edges.len() - 1]);

    for &v in values {
        if !v.is_finite() || v < first || v > last {
            continue;
        }
        // First edge strictly >= v, minus one, gives the bin; the left edge
        // itself lands in bin 0.
        let k = edges.partition_point(|&e| e < v).saturating_sub(1);
        let last_bin = counts.len() - 1;
        counts[k.min(last_bin)] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(n: usize, offset: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 + offset).collect()
    }

    #[test]
    fn identical_samples_have_zero_psi() {
        let base = spread(100, 0.0);
        let value = psi(&base, &base, 10).unwrap();
        assert!(value.abs() < 1e-12);
        assert_eq!(PsiStability::classify(value), PsiStability::Stable);
    }

    #[test]
    fn shifted_sample_is_flagged() {
        let base = spread(100, 0.0);
        let shifted = spread(100, 40.0);
        let value = psi(&base, &shifted, 10).unwrap();
        assert_eq!(PsiStability::classify(value), PsiStability::SignificantShift);
    }

    #[test]
    fn left_edge_falls_in_first_bin() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(bin_counts(&[0.0, 1.0, 1.5, 2.0, 3.0], &edges), vec![2, 2]);
    }

    #[test]
    fn degenerate_inputs_return_none() {
        assert_eq!(psi(&[], &[1.0], 10), None);
        assert_eq!(psi(&[5.0, 5.0, 5.0], &[5.0], 10), None);
        assert_eq!(psi(&spread(10, 0.0), &[100.0, 200.0], 10), None);
    }

    #[test]
    fn quantile_interpolates() {
        let sorted = [0.0, 10.0];
        assert_eq!(quantile(&sorted, 0.25), 2.5);
    }

    #[test]
    fn stability_bands() {
        assert_eq!(PsiStability::classify(0.05), PsiStability::Stable);
        assert_eq!(PsiStability::classify(0.1), PsiStability::ModerateShift);
        assert_eq!(PsiStability::classify(0.3).to_string(), "significant shift");
    }
}
