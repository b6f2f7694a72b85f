//! Variance analysis module.
//!
//! One-way ANOVA of every numeric column grouped by severity, a two-factor
//! screen over (material, weather) reporting each factor's one-way F
//! separately, chi-square independence over every categorical pair, and the
//! uniform goodness-of-fit per categorical column.

use std::collections::BTreeMap;

use serde::Serialize;

use fissura_stats::{
    descriptive::DescriptiveStats,
    distribution::{chi_squared_sf, f_sf},
    frequency::FrequencyTable,
};

use crate::dataset::{CategoricalColumn, Dataset, NumericColumn};
use crate::result::{
    ALPHA, EffectSize, ModuleError, ModuleOutcome, ModuleSection, StatisticalResult,
};

/// Minimum expected cell frequency for the chi-square goodness-of-fit.
pub const MIN_EXPECTED_FREQUENCY: f64 = 5.0;

/// Per-group summary reported alongside every ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// One-way ANOVA of a numeric response over a categorical factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaResult {
    pub response: String,
    pub factor: String,
    /// Distinct non-empty groups; duplicates count once.
    pub groups_tested: usize,
    pub f_statistic: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub p_value: f64,
    pub significant: bool,
    /// Eta-squared `SS_between / SS_total`.
    pub effect_size: EffectSize,
    pub groups: BTreeMap<String, GroupSummary>,
    pub conclusion: String,
}

/// Chi-square independence test between two categorical columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub x: String,
    pub y: String,
    pub chi_squared: f64,
    pub df: usize,
    pub p_value: f64,
    pub significant: bool,
    /// Cramér's V.
    pub effect_size: EffectSize,
    pub conclusion: String,
}

/// Chi-square goodness-of-fit against a uniform distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoodnessOfFitResult {
    pub n: usize,
    pub categories: usize,
    pub expected_per_category: f64,
    pub chi_squared: f64,
    pub df: usize,
    pub p_value: f64,
    pub significant: bool,
    pub conclusion: String,
}

/// Runs the whole variance module over the dataset.
#[must_use]
pub fn analyze(dataset: &Dataset) -> ModuleSection {
    let mut section = ModuleSection::new();
    let severity = dataset.categorical(CategoricalColumn::Severity);

    for column in NumericColumn::ALL {
        if column == NumericColumn::SeverityOrdinal {
            // The ordinal encoding of the grouping factor itself.
            continue;
        }
        section.insert(
            format!("anova:{}", column.name()),
            ModuleOutcome::from_module(
                one_way_anova(severity, dataset.numeric(column), column.name(), "severity")
                    .map(StatisticalResult::Anova),
            ),
        );
    }

    // Two-factor screen: each factor's one-way F on the same response,
    // reported separately.
    let screen_response = NumericColumn::AreaMm2;
    for factor in [CategoricalColumn::MaterialType, CategoricalColumn::WeatherExposure] {
        section.insert(
            format!("factor_screen:{}", factor.name()),
            ModuleOutcome::from_module(
                one_way_anova(
                    dataset.categorical(factor),
                    dataset.numeric(screen_response),
                    screen_response.name(),
                    factor.name(),
                )
                .map(StatisticalResult::Anova),
            ),
        );
    }

    for (i, a) in CategoricalColumn::ALL.iter().enumerate() {
        for b in &CategoricalColumn::ALL[i + 1..] {
            section.insert(
                format!("independence:{}~{}", a.name(), b.name()),
                ModuleOutcome::from_module(
                    independence_test(
                        dataset.categorical(*a),
                        dataset.categorical(*b),
                        a.name(),
                        b.name(),
                    )
                    .map(StatisticalResult::ChiSquare),
                ),
            );
        }
    }

    for column in CategoricalColumn::ALL {
        section.insert(
            format!("goodness_of_fit:{}", column.name()),
            ModuleOutcome::from_module(
                uniform_goodness_of_fit(dataset.categorical(column))
                    .map(StatisticalResult::GoodnessOfFit),
            ),
        );
    }

    section
}

/// One-way ANOVA with the exact F p-value.
#[expect(clippy::cast_precision_loss)]
pub fn one_way_anova(
    labels: &[String],
    values: &[f64],
    response: &str,
    factor: &str,
) -> Result<AnovaResult, ModuleError> {
    let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (label, &value) in labels.iter().zip(values) {
        grouped.entry(label.as_str()).or_default().push(value);
    }
    let k = grouped.len();
    if k < 2 {
        return Err(ModuleError::InsufficientData {
            needed: 2,
            actual: k,
            unit: "groups",
        });
    }
    let n = values.len();
    if n <= k {
        return Err(ModuleError::InsufficientData {
            needed: k + 1,
            actual: n,
            unit: "rows",
        });
    }

    let grand_mean = values.iter().sum::<f64>() / (n as f64);
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    let mut groups = BTreeMap::new();
    for (name, members) in &grouped {
        let stats = DescriptiveStats::new(members).ok_or(ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "rows",
        })?;
        ss_between += (members.len() as f64) * (stats.mean - grand_mean).powi(2);
        ss_within += members.iter().map(|v| (v - stats.mean).powi(2)).sum::<f64>();
        groups.insert(
            (*name).to_owned(),
            GroupSummary {
                n: stats.n,
                mean: stats.mean,
                std_dev: stats.std_dev,
                min: stats.min,
                max: stats.max,
            },
        );
    }

    let ss_total = ss_between + ss_within;
    if ss_total <= 0.0 || ss_within <= 0.0 {
        return Err(ModuleError::DegenerateDistribution {
            column: response.to_owned(),
        });
    }

    let df_between = k - 1;
    let df_within = n - k;
    let f_statistic =
        (ss_between / (df_between as f64)) / (ss_within / (df_within as f64));
    let p_value = f_sf(f_statistic, df_between as f64, df_within as f64).ok_or(
        ModuleError::InsufficientData {
            needed: k + 1,
            actual: n,
            unit: "rows",
        },
    )?;
    let effect_size = EffectSize::eta_squared(ss_between / ss_total);
    let significant = p_value < ALPHA;
    let conclusion = format!(
        "{factor} {} group means of {response} (F = {f_statistic:.3}, p = {p_value:.4}, η² = {:.3} [{}]).",
        if significant {
            "significantly separates"
        } else {
            "does not significantly separate"
        },
        effect_size.value,
        effect_size.interpretation,
    );

    Ok(AnovaResult {
        response: response.to_owned(),
        factor: factor.to_owned(),
        groups_tested: k,
        f_statistic,
        df_between,
        df_within,
        p_value,
        significant,
        effect_size,
        groups,
        conclusion,
    })
}

/// Chi-square independence test over the contingency table of two columns.
#[expect(clippy::cast_precision_loss)]
pub fn independence_test(
    labels_a: &[String],
    labels_b: &[String],
    x: &str,
    y: &str,
) -> Result<ChiSquareResult, ModuleError> {
    let n = labels_a.len();
    let mut table: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for (a, b) in labels_a.iter().zip(labels_b) {
        *table
            .entry(a.as_str())
            .or_default()
            .entry(b.as_str())
            .or_insert(0) += 1;
    }
    let rows = table.len();
    let columns: Vec<&str> = {
        let mut seen: Vec<&str> = Vec::new();
        for inner in table.values() {
            for key in inner.keys() {
                if !seen.contains(key) {
                    seen.push(key);
                }
            }
        }
        seen
    };
    if rows < 2 || columns.len() < 2 {
        return Err(ModuleError::DegenerateDistribution {
            column: format!("{x}~{y}"),
        });
    }

    let row_totals: BTreeMap<&str, usize> = table
        .iter()
        .map(|(k, inner)| (*k, inner.values().sum()))
        .collect();
    let col_totals: BTreeMap<&str, usize> = columns
        .iter()
        .map(|c| (*c, table.values().map(|inner| inner.get(c).copied().unwrap_or(0)).sum()))
        .collect();

    let total = n as f64;
    let mut chi_squared = 0.0;
    for (row, inner) in &table {
        for col in &columns {
            let observed = inner.get(col).copied().unwrap_or(0) as f64;
            let expected =
                (row_totals[row] as f64) * (col_totals[col] as f64) / total;
            chi_squared += (observed - expected).powi(2) / expected;
        }
    }

    let df = (rows - 1) * (columns.len() - 1);
    let p_value = chi_squared_sf(chi_squared, df as f64).ok_or(
        ModuleError::DegenerateDistribution {
            column: format!("{x}~{y}"),
        },
    )?;
    let min_dim = rows.min(columns.len());
    let cramers_v = (chi_squared / (total * ((min_dim - 1) as f64))).sqrt();
    let effect_size = EffectSize::cramers_v(cramers_v);
    let significant = p_value < ALPHA;
    let conclusion = format!(
        "{x} and {y} are {} (χ² = {chi_squared:.3}, df = {df}, p = {p_value:.4}, V = {:.3} [{}]).",
        if significant { "associated" } else { "independent at α = 0.05" },
        effect_size.value,
        effect_size.interpretation,
    );

    Ok(ChiSquareResult {
        x: x.to_owned(),
        y: y.to_owned(),
        chi_squared,
        df,
        p_value,
        significant,
        effect_size,
        conclusion,
    })
}

/// Goodness-of-fit against a uniform distribution over the observed
/// categories. Reported unavailable when any expected cell frequency is
/// below [`MIN_EXPECTED_FREQUENCY`].
#[expect(clippy::cast_precision_loss)]
pub fn uniform_goodness_of_fit(labels: &[String]) -> Result<GoodnessOfFitResult, ModuleError> {
    let table = FrequencyTable::new(labels).ok_or(ModuleError::InsufficientData {
        needed: 1,
        actual: 0,
        unit: "rows",
    })?;
    let k = table.cardinality;
    if k < 2 {
        return Err(ModuleError::DegenerateDistribution {
            column: "single category".to_owned(),
        });
    }
    let n = labels.len() as f64;
    let expected = n / (k as f64);
    if expected < MIN_EXPECTED_FREQUENCY {
        return Err(ModuleError::PreconditionNotMet {
            detail: format!(
                "expected cell frequency {expected:.2} is below {MIN_EXPECTED_FREQUENCY}"
            ),
        });
    }

    let chi_squared = table
        .absolute
        .values()
        .map(|&observed| ((observed as f64) - expected).powi(2) / expected)
        .sum::<f64>();
    let df = k - 1;
    let p_value = chi_squared_sf(chi_squared, df as f64).ok_or(
        ModuleError::DegenerateDistribution {
            column: "single category".to_owned(),
        },
    )?;
    let significant = p_value < ALPHA;
    let conclusion = format!(
        "Observed frequencies {} uniform across {k} categories (χ² = {chi_squared:.3}, p = {p_value:.4}).",
        if significant { "deviate from" } else { "are consistent with" },
    );

    Ok(GoodnessOfFitResult {
        n: labels.len(),
        categories: k,
        expected_per_category: expected,
        chi_squared,
        df,
        p_value,
        significant,
        conclusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn anova_counts_duplicate_severities_once() {
        // Minor, Minor, Severe, Critical: three distinct groups.
        let severity = labels(&["Minor", "Minor", "Severe", "Critical"]);
        let area = [2.0, 3.0, 40.0, 90.0];
        let result = one_way_anova(&severity, &area, "area_mm2", "severity").unwrap();
        assert_eq!(result.groups_tested, 3);
        assert_eq!(result.df_between, 2);
        assert_eq!(result.df_within, 1);
        assert!(result.p_value > 0.0 && result.p_value < 1.0);
        assert_eq!(result.significant, result.p_value < ALPHA);
        assert_eq!(result.groups["Minor"].n, 2);
    }

    #[test]
    fn anova_matches_hand_computed_f() {
        // Two groups of three: [1,2,3] and [7,8,9].
        let severity = labels(&["Minor", "Minor", "Minor", "Severe", "Severe", "Severe"]);
        let area = [1.0, 2.0, 3.0, 7.0, 8.0, 9.0];
        let result = one_way_anova(&severity, &area, "area_mm2", "severity").unwrap();
        // SS_between = 54, SS_within = 4, F = 54 / (4/4) = 54.
        assert!((result.f_statistic - 54.0).abs() < 1e-9);
        assert!((result.effect_size.value - 54.0 / 58.0).abs() < 1e-9);
        assert!(result.significant);
    }

    #[test]
    fn anova_needs_two_groups() {
        let severity = labels(&["Minor", "Minor", "Minor"]);
        let err = one_way_anova(&severity, &[1.0, 2.0, 3.0], "area_mm2", "severity").unwrap_err();
        assert!(matches!(err, ModuleError::InsufficientData { unit: "groups", .. }));
    }

    #[test]
    fn perfectly_separated_groups_are_degenerate() {
        let severity = labels(&["Minor", "Minor", "Severe", "Severe"]);
        let err = one_way_anova(&severity, &[1.0, 1.0, 2.0, 2.0], "area_mm2", "severity")
            .unwrap_err();
        assert!(matches!(err, ModuleError::DegenerateDistribution { .. }));
    }

    #[test]
    fn independence_detects_a_perfect_association() {
        let a = labels(&["x", "x", "x", "y", "y", "y"]);
        let b = labels(&["p", "p", "p", "q", "q", "q"]);
        let result = independence_test(&a, &b, "material", "weather").unwrap();
        // Perfect association: χ² = n, V = 1.
        assert!((result.chi_squared - 6.0).abs() < 1e-9);
        assert!((result.effect_size.value - 1.0).abs() < 1e-9);
        assert_eq!(result.df, 1);
    }

    #[test]
    fn independence_requires_two_by_two() {
        let a = labels(&["x", "x", "x"]);
        let b = labels(&["p", "q", "p"]);
        let err = independence_test(&a, &b, "material", "weather").unwrap_err();
        assert!(matches!(err, ModuleError::DegenerateDistribution { .. }));
    }

    #[test]
    fn goodness_of_fit_honours_the_expected_frequency_floor() {
        // 8 rows over 2 categories: expected 4 < 5, must be unavailable.
        let small = labels(&["a", "a", "a", "a", "b", "b", "b", "b"]);
        let err = uniform_goodness_of_fit(&small).unwrap_err();
        assert!(matches!(err, ModuleError::PreconditionNotMet { .. }));

        // 10 rows over 2 categories: expected 5, runs.
        let enough = labels(&["a", "a", "a", "a", "a", "b", "b", "b", "b", "b"]);
        let result = uniform_goodness_of_fit(&enough).unwrap();
        assert!((result.chi_squared).abs() < 1e-9);
        assert!(!result.significant);
    }

    #[test]
    fn skewed_frequencies_reject_uniformity() {
        let mut skewed = vec!["a"; 45];
        skewed.extend(vec!["b"; 5]);
        let result = uniform_goodness_of_fit(&labels(&skewed)).unwrap();
        // χ² = (45-25)²/25 + (5-25)²/25 = 32.
        assert!((result.chi_squared - 32.0).abs() < 1e-9);
        assert!(result.significant);
    }
}
