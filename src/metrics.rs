//! Partition agreement metrics.
//!
//! Compare two partitions of the same node set, e.g. the communities found
//! by modularity optimization against the communities implied by genre.
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`nmi`] | [0, 1] | 1 | Normalized, symmetric, label-invariant |
//! | [`ari`] | [-1, 1] | 1 | Adjusted for chance; 0 = random agreement |
//!
//! Both take membership vectors aligned on the same node order; vectors of
//! different lengths describe different node universes and are rejected.
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use crate::error::{Error, Result};
use std::collections::HashMap;

fn check_aligned(a: &[usize], b: &[usize]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::PartitionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    if a.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

fn entropy(counts: &HashMap<usize, usize>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

/// Normalized Mutual Information between two partitions.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Two constant partitions agree perfectly (NMI = 1).
///
/// ```rust
/// use assort::metrics::nmi;
///
/// let a = [0, 0, 1, 1];
/// let b = [1, 1, 0, 0];
/// assert!((nmi(&a, &b).unwrap() - 1.0).abs() < 1e-10);
/// ```
pub fn nmi(a: &[usize], b: &[usize]) -> Result<f64> {
    check_aligned(a, b)?;
    let (joint, n) = build_contingency_table(a, b);
    let n_f = n as f64;

    let mut count_a = HashMap::new();
    let mut count_b = HashMap::new();
    for (&x, &y) in a.iter().zip(b) {
        *count_a.entry(x).or_insert(0) += 1;
        *count_b.entry(y).or_insert(0) += 1;
    }
    let h_a = entropy(&count_a, n_f);
    let h_b = entropy(&count_b, n_f);

    let mut mi = 0.0;
    for (&(x, y), &count) in &joint {
        let p_joint = count as f64 / n_f;
        let p_x = count_a[&x] as f64 / n_f;
        let p_y = count_b[&y] as f64 / n_f;
        mi += p_joint * (p_joint / (p_x * p_y)).ln();
    }

    let denom = h_a + h_b;
    if denom > 0.0 {
        Ok((2.0 * mi / denom).clamp(0.0, 1.0))
    } else {
        Ok(1.0)
    }
}

/// Adjusted Rand Index between two partitions.
///
/// Corrected-for-chance Rand index: 0 for random labelings, 1 for identical
/// partitions, negative when agreement is worse than chance.
///
/// ```rust
/// use assort::metrics::ari;
///
/// let a = [0, 0, 1, 1];
/// assert!((ari(&a, &a).unwrap() - 1.0).abs() < 1e-10);
/// ```
pub fn ari(a: &[usize], b: &[usize]) -> Result<f64> {
    check_aligned(a, b)?;
    let (joint, n) = build_contingency_table(a, b);
    if n < 2 {
        return Ok(1.0);
    }

    // Row sums (a_i) and column sums (b_j)
    let mut row_sums = HashMap::new();
    let mut col_sums = HashMap::new();
    for (&(x, y), &count) in &joint {
        *row_sums.entry(x).or_insert(0usize) += count;
        *col_sums.entry(y).or_insert(0usize) += count;
    }

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = row_sums.values().map(|&r| comb2(r) as f64).sum();
    let sum_comb_b: f64 = col_sums.values().map(|&c| comb2(c) as f64).sum();
    let comb_n = comb2(n) as f64;

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        // Both trivial (all-in-one or all-singletons) in the same way.
        return Ok(1.0);
    }
    Ok((sum_comb_ij - expected) / denom)
}

fn build_contingency_table(a: &[usize], b: &[usize]) -> (HashMap<(usize, usize), usize>, usize) {
    let mut table = HashMap::new();
    for (&x, &y) in a.iter().zip(b.iter()) {
        *table.entry((x, y)).or_insert(0) += 1;
    }
    (table, a.len())
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nmi_identical_and_permuted() {
        let a = [0, 0, 1, 1, 2, 2];
        let b = [1, 1, 0, 0, 2, 2];
        assert!((nmi(&a, &a).unwrap() - 1.0).abs() < 1e-10);
        assert!((nmi(&a, &b).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_nmi_is_symmetric() {
        let a = [0, 0, 0, 1, 1, 2, 2, 2];
        let b = [0, 1, 1, 1, 2, 2, 0, 0];
        let ab = nmi(&a, &b).unwrap();
        let ba = nmi(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab > 0.0 && ab < 1.0);
    }

    #[test]
    fn test_nmi_independent_partitions() {
        let a = [0, 0, 1, 1];
        let b = [0, 1, 0, 1];
        assert!(nmi(&a, &b).unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_ari_reference_value() {
        // sklearn: adjusted_rand_score([0,0,1,1], [0,0,1,2]) = 0.5714285714285715
        let a = [0, 0, 1, 1];
        let b = [0, 0, 1, 2];
        assert!((ari(&a, &b).unwrap() - 4.0 / 7.0).abs() < 1e-10);
        assert!((ari(&a, &a).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_ari_worse_than_chance() {
        let a = [0, 0, 1, 1];
        let b = [0, 1, 0, 1];
        assert!(ari(&a, &b).unwrap() < 0.0);
    }

    #[test]
    fn test_mismatched_universes_rejected() {
        assert!(matches!(
            nmi(&[0, 1], &[0]),
            Err(Error::PartitionMismatch { expected: 2, found: 1 })
        ));
        assert!(ari(&[], &[]).is_err());
    }
}
