//! Average ranks and tie correction shared by the rank-based tests.
//!
//! # Examples
//!
//! ```
//! use u_inference::rank::rank;
//!
//! let r = rank(&[10.0, 20.0, 20.0, 30.0]);
//! assert_eq!(r.ranks, vec![1.0, 2.5, 2.5, 4.0]);
//! assert_eq!(r.tie_term, 6.0); // one tie group of size 2: 2³ − 2
//! ```

/// Ranks of one sample, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Rank of each value (1-based, ties averaged).
    pub ranks: Vec<f64>,
    /// Tie term T = Σ(tⱼ³ − tⱼ) over tie groups of size tⱼ.
    pub tie_term: f64,
}

/// Joint ranking of several groups.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRanking {
    /// Per-group ranks, each in the group's input order.
    pub ranks: Vec<Vec<f64>>,
    /// Sum of ranks Rᵢ for each group.
    pub rank_sums: Vec<f64>,
    /// Total number of observations N.
    pub n_total: usize,
    /// Tie term T = Σ(tⱼ³ − tⱼ) over the pooled sample.
    pub tie_term: f64,
}

impl GroupRanking {
    /// Mean rank Rᵢ / nᵢ of group `i`.
    pub fn mean_rank(&self, i: usize) -> f64 {
        self.rank_sums[i] / self.ranks[i].len() as f64
    }

    /// Tie correction factor 1 − T / (N³ − N).
    ///
    /// Equals 1 without ties and 0 when every value is identical.
    pub fn tie_correction(&self) -> f64 {
        let n = self.n_total as f64;
        let denom = n * n * n - n;
        if denom <= 0.0 {
            return 0.0;
        }
        1.0 - self.tie_term / denom
    }
}

/// Assigns average ranks 1..N to `values`.
///
/// # Algorithm
///
/// Sort indices by value, then walk runs of equal values; a run covering
/// sorted positions i..j (0-based, exclusive) receives (i + 1 + j) / 2.
/// Values are compared for exact equality.
///
/// # Invariant
///
/// Σ ranks = N(N+1)/2 regardless of ties.
pub fn rank(values: &[f64]) -> Ranking {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    Ranking { ranks, tie_term }
}

/// Ranks the pooled observations of `groups` and splits the ranks back
/// per group.
///
/// # Examples
///
/// ```
/// use u_inference::rank::rank_groups;
///
/// let a = [1.0, 3.0];
/// let b = [2.0, 3.0, 5.0];
/// let r = rank_groups(&[&a, &b]);
/// assert_eq!(r.ranks, vec![vec![1.0, 3.5], vec![2.0, 3.5, 5.0]]);
/// assert_eq!(r.rank_sums, vec![4.5, 10.5]);
/// assert_eq!(r.n_total, 5);
/// ```
pub fn rank_groups(groups: &[&[f64]]) -> GroupRanking {
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let Ranking {
        ranks: pooled_ranks,
        tie_term,
    } = rank(&pooled);

    let mut ranks = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for g in groups {
        ranks.push(pooled_ranks[offset..offset + g.len()].to_vec());
        offset += g.len();
    }
    let rank_sums = ranks.iter().map(|r| r.iter().sum()).collect();

    GroupRanking {
        ranks,
        rank_sums,
        n_total: pooled.len(),
        tie_term,
    }
}
