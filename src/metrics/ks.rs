//! Kolmogorov–Smirnov separation between defaulters and non-defaulters.

/// Maximum gap between the cumulative distributions of positives and
/// negatives when ranked by `scores` (highest first).
///
/// `labels[i]` is `true` for a default. Returns 0.0 when the inputs are empty,
/// have different lengths, or contain a single class.
pub fn ks_statistic(labels: &[bool], scores: &[f64]) -> f64 {
    if labels.is_empty() || labels.len() != scores.len() {
        return 0.0;
    }

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable: tied scores keep input order.
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut seen_pos, mut seen_neg) = (0usize, 0usize);
    let mut best = 0.0f64;
    for idx in order {
        if labels[idx] {
            seen_pos += 1;
        } else {
            seen_neg += 1;
        }
        let gap = seen_pos as f64 / positives as f64 - seen_neg as f64 / negatives as f64;
        best = best.max(gap.abs());
    }
    best
}
