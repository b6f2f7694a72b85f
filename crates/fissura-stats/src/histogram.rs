//! Fixed-bin density histograms for numeric columns.

/// Default bin count used by the analytics engine.
pub const DEFAULT_BINS: usize = 10;

/// An equal-width histogram over a numeric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges, `bins.len() + 1` entries.
    pub edges: Vec<f64>,
    /// Midpoint of each bin.
    pub centers: Vec<f64>,
    /// Raw occupancy count per bin.
    pub counts: Vec<u64>,
    /// Density per bin: `count / (n · bin_width)`, so the histogram
    /// integrates to 1.
    pub densities: Vec<f64>,
}

impl Histogram {
    /// Builds an equal-width histogram with `num_bins` bins spanning the data
    /// range. Values equal to the maximum land in the last bin.
    ///
    /// Returns `None` when the input is empty or `num_bins` is zero. A
    /// constant sample produces a single occupied bin of unit width centered
    /// on the value.
    ///
    /// # Examples
    ///
    /// ```
    /// use fissura_stats::histogram::Histogram;
    ///
    /// let hist = Histogram::new(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
    /// assert_eq!(hist.counts, vec![1, 1, 1, 2]);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn new(values: &[f64], num_bins: usize) -> Option<Self> {
        if values.is_empty() || num_bins == 0 {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Degenerate range: one unit-width bin around the constant value.
        let (min, max, num_bins) = if max - min <= f64::EPSILON {
            (min - 0.5, min + 0.5, 1)
        } else {
            (min, max, num_bins)
        };

        let width = (max - min) / (num_bins as f64);
        let mut counts = vec![0u64; num_bins];
        for &v in values {
            let idx = (((v - min) / width) as usize).min(num_bins - 1);
            counts[idx] += 1;
        }

        let edges: Vec<f64> = (0..=num_bins).map(|i| min + width * (i as f64)).collect();
        let centers: Vec<f64> = (0..num_bins)
            .map(|i| min + width * (i as f64 + 0.5))
            .collect();
        let n = values.len() as f64;
        let densities = counts.iter().map(|&c| (c as f64) / (n * width)).collect();

        Some(Self {
            edges,
            centers,
            counts,
            densities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(Histogram::new(&[], 10), None);
        assert_eq!(Histogram::new(&[1.0], 0), None);
    }

    #[test]
    fn counts_cover_every_value() {
        let values: Vec<f64> = (0..20).map(f64::from).collect();
        let hist = Histogram::new(&values, 10).unwrap();
        assert_eq!(hist.counts.iter().sum::<u64>(), 20);
        assert_eq!(hist.edges.len(), 11);
        assert_eq!(hist.centers.len(), 10);
    }

    #[test]
    fn density_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 8.0, 9.0];
        let hist = Histogram::new(&values, 10).unwrap();
        let width = hist.edges[1] - hist.edges[0];
        let total: f64 = hist.densities.iter().map(|d| d * width).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_sample_collapses_to_one_bin() {
        let hist = Histogram::new(&[7.0, 7.0, 7.0], 10).unwrap();
        assert_eq!(hist.counts, vec![3]);
        assert!((hist.centers[0] - 7.0).abs() < 1e-9);
    }
}
