//! Frequency tables for categorical columns.

use std::collections::BTreeMap;

/// Epsilon added inside the log to avoid `log2(0)` on zero-probability cells.
pub const ENTROPY_EPSILON: f64 = 1e-10;

/// Absolute and relative frequencies of a categorical sample.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    pub absolute: BTreeMap<String, usize>,
    pub relative: BTreeMap<String, f64>,
    /// Most frequent category; ties resolve to the lexicographically first.
    pub mode: String,
    /// Number of distinct categories.
    pub cardinality: usize,
    /// Shannon entropy in bits: `-Σ p·log2(p + ε)`.
    pub entropy_bits: f64,
}

impl FrequencyTable {
    /// Tabulates the labels. Returns `None` for an empty sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use fissura_stats::frequency::FrequencyTable;
    ///
    /// let table = FrequencyTable::new(["Minor", "Minor", "Severe"]).unwrap();
    /// assert_eq!(table.mode, "Minor");
    /// assert_eq!(table.cardinality, 2);
    /// assert_eq!(table.absolute["Severe"], 1);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut absolute: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0usize;
        for label in labels {
            *absolute.entry(label.as_ref().to_owned()).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 {
            return None;
        }

        let n = total as f64;
        let relative: BTreeMap<String, f64> = absolute
            .iter()
            .map(|(k, &count)| (k.clone(), (count as f64) / n))
            .collect();

        // Tie on count: the reversed key comparison makes the smaller key win.
        let mode = absolute
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(k, _)| k.clone())?;

        let entropy_bits = -relative
            .values()
            .map(|&p| p * (p + ENTROPY_EPSILON).log2())
            .sum::<f64>();

        Some(Self {
            cardinality: absolute.len(),
            absolute,
            relative,
            mode,
            entropy_bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_yields_none() {
        assert_eq!(FrequencyTable::new(Vec::<&str>::new()), None);
    }

    #[test]
    fn uniform_four_categories_have_two_bits() {
        let table = FrequencyTable::new(["a", "b", "c", "d"]).unwrap();
        assert!((table.entropy_bits - 2.0).abs() < 1e-6);
        assert_eq!(table.cardinality, 4);
    }

    #[test]
    fn single_category_has_near_zero_entropy() {
        let table = FrequencyTable::new(["Concrete"; 5]).unwrap();
        assert!(table.entropy_bits.abs() < 1e-6);
        assert_eq!(table.mode, "Concrete");
        assert!((table.relative["Concrete"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mode_ties_resolve_lexicographically() {
        let table = FrequencyTable::new(["b", "a"]).unwrap();
        assert_eq!(table.mode, "a");
    }
}
