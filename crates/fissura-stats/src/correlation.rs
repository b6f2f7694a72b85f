//! Pairwise association measures with significance testing.
//!
//! Pearson's r measures linear association, Spearman's rho (Pearson over
//! midranks) measures monotone association, and Kendall's tau-b handles ties
//! in either variable. Significance of Pearson's r uses the exact t
//! distribution with `n - 2` degrees of freedom.

use crate::distribution::two_tailed_p_from_t;

/// Qualitative strength of a correlation coefficient, by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationStrength {
    /// `|r| < 0.3`
    VeryWeak,
    /// `|r| < 0.5`
    Weak,
    /// `|r| < 0.7`
    Moderate,
    /// `|r| < 0.9`
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    #[must_use]
    pub fn classify(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude < 0.3 {
            Self::VeryWeak
        } else if magnitude < 0.5 {
            Self::Weak
        } else if magnitude < 0.7 {
            Self::Moderate
        } else if magnitude < 0.9 {
            Self::Strong
        } else {
            Self::VeryStrong
        }
    }
}

/// Pearson's product-moment correlation.
///
/// Returns `None` when the slices differ in length, have fewer than two
/// points, or either variable has zero variance.
///
/// # Examples
///
/// ```
/// use fissura_stats::correlation::pearson;
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [2.0, 4.0, 6.0, 8.0, 10.0];
/// assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        ss_x += dx * dx;
        ss_y += dy * dy;
    }
    if ss_x <= 0.0 || ss_y <= 0.0 {
        return None;
    }
    Some(cov / (ss_x * ss_y).sqrt())
}

/// Spearman's rank correlation: Pearson's r over midranks, so ties are
/// handled correctly.
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&midranks(x), &midranks(y))
}

/// Kendall's tau-b, with the tie correction in both variables.
///
/// Returns `None` when the slices differ in length, have fewer than two
/// points, or either variable is constant.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut ties_x = 0i64;
    let mut ties_y = 0i64;
    for i in 0..x.len() {
        for j in (i + 1)..x.len() {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                // Tied in both: counted in neither correction term.
            } else if dx == 0.0 {
                ties_x += 1;
            } else if dy == 0.0 {
                ties_y += 1;
            } else if dx * dy > 0.0 {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }
    let n0 = (x.len() * (x.len() - 1) / 2) as f64;
    let denom = ((n0 - ties_x as f64) * (n0 - ties_y as f64)).sqrt();
    if denom <= 0.0 {
        return None;
    }
    Some(((concordant - discordant) as f64) / denom)
}

/// Outcome of a Pearson correlation significance test.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationTest {
    pub r: f64,
    pub t_statistic: f64,
    pub df: f64,
    pub p_value: f64,
    pub strength: CorrelationStrength,
}

/// Tests `H0: rho = 0` for Pearson's r using `t = r·√((n−2)/(1−r²))`.
///
/// Returns `None` when the correlation itself is undefined or `n < 3`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pearson_test(x: &[f64], y: &[f64]) -> Option<CorrelationTest> {
    if x.len() < 3 {
        return None;
    }
    let r = pearson(x, y)?;
    let df = (x.len() - 2) as f64;
    let (t_statistic, p_value) = if (1.0 - r * r).abs() < f64::EPSILON {
        // Perfect correlation: the statistic diverges.
        (f64::INFINITY.copysign(r), 0.0)
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        (t, two_tailed_p_from_t(t, df)?)
    };
    Some(CorrelationTest {
        r,
        t_statistic,
        df,
        p_value,
        strength: CorrelationStrength::classify(r),
    })
}

/// Midranks of a sample: tied values receive the mean of the ranks they span.
#[expect(clippy::cast_precision_loss)]
fn midranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; a run over sorted positions i..j shares their mean.
        let rank = ((i + j + 1) as f64) / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_or_degenerate_input_yields_none() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(kendall_tau_b(&[1.0, 1.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let r = pearson(&x, &y).unwrap();
        assert!((r - 0.8).abs() < 1e-12);
    }

    #[test]
    fn spearman_is_one_for_monotone_nonlinear_data() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 8.0, 27.0, 64.0, 125.0];
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spearman_handles_ties_via_midranks() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [10.0, 20.0, 20.0, 30.0];
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kendall_matches_hand_count() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 4.0];
        // 5 concordant pairs, 1 discordant, no ties: tau = 4/6.
        let tau = kendall_tau_b(&x, &y).unwrap();
        assert!((tau - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_test_reports_exact_p() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let test = pearson_test(&x, &y).unwrap();
        assert!((test.r - 0.8).abs() < 1e-12);
        assert!((test.t_statistic - 2.309_401).abs() < 1e-5);
        // Two-tailed p for t = 2.309 on 3 df.
        assert!(test.p_value > 0.09 && test.p_value < 0.12);
        assert_eq!(test.strength, CorrelationStrength::Strong);
    }

    #[test]
    fn perfect_correlation_has_zero_p() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let test = pearson_test(&x, &y).unwrap();
        assert_eq!(test.p_value, 0.0);
        assert_eq!(test.strength, CorrelationStrength::VeryStrong);
    }
}
