//! Pairwise multiple-comparison helpers used after a significant omnibus
//! test.

/// All unordered index pairs (i, j), i < j, of `k` groups in row-major
/// order: (0,1), (0,2), …, (k−2,k−1).
///
/// # Examples
///
/// ```
/// use u_inference::posthoc::pairwise_indices;
/// assert_eq!(pairwise_indices(3), vec![(0, 1), (0, 2), (1, 2)]);
/// ```
pub fn pairwise_indices(k: usize) -> Vec<(usize, usize)> {
    (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .collect()
}

/// Bonferroni adjustment: each p-value multiplied by the number of
/// comparisons, capped at 1.
///
/// # Examples
///
/// ```
/// use u_inference::posthoc::bonferroni_correction;
/// let adj = bonferroni_correction(&[0.01, 0.04, 0.5]);
/// assert!((adj[0] - 0.03).abs() < 1e-15);
/// assert!((adj[1] - 0.12).abs() < 1e-15);
/// assert_eq!(adj[2], 1.0);
/// ```
pub fn bonferroni_correction(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len() as f64;
    p_values.iter().map(|&p| (p * m).min(1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_count_is_binomial() {
        for k in 0..8 {
            assert_eq!(pairwise_indices(k).len(), k * k.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn bonferroni_preserves_order() {
        let adj = bonferroni_correction(&[0.001, 0.2, 0.02]);
        assert!(adj[0] < adj[2] && adj[2] < adj[1]);
    }

    #[test]
    fn bonferroni_empty() {
        assert!(bonferroni_correction(&[]).is_empty());
    }
}
