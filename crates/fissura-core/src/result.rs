//! Result envelope shared by every analytics module.
//!
//! Each statistical computation produces a [`StatisticalResult`] wrapped in a
//! [`ModuleOutcome`]: available with a payload, or unavailable with the
//! specific precondition that failed. A module never aborts the request and
//! never silently drops a key; the report carries the unavailability reason
//! instead.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::{
    descriptive::{CategoricalSummary, CorrelationPair, NumericSummary, OutlierReport},
    inferential::{ConfidenceIntervals, OneSampleTest, SamplingSummary, TwoSampleTest},
    predictive::{DeteriorationSeries, LinearRegressionReport, LogisticRegressionReport},
    variance::{AnovaResult, ChiSquareResult, GoodnessOfFitResult},
};

/// Significance threshold used across every test unless stated otherwise.
pub const ALPHA: f64 = 0.05;
/// Stricter threshold reported alongside [`ALPHA`] by the one-sample tests.
pub const ALPHA_STRICT: f64 = 0.01;

/// One module section of the report: column or pair name to outcome.
pub type ModuleSection = BTreeMap<String, ModuleOutcome<StatisticalResult>>;

/// Per-computation precondition failure. Converted to
/// [`ModuleOutcome::Unavailable`], never propagated as a request error.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ModuleError {
    #[display("Insufficient data: needs at least {needed} {unit}, have {actual}")]
    InsufficientData {
        needed: usize,
        actual: usize,
        unit: &'static str,
    },
    #[display("Degenerate distribution in '{column}': no variation to analyze")]
    DegenerateDistribution { column: String },
    #[display("Precondition not met: {detail}")]
    PreconditionNotMet { detail: String },
    #[display("Insufficient class variation: {classes} distinct class(es), need 2")]
    InsufficientClassVariation { classes: usize },
}

/// Machine-checkable availability of a computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModuleOutcome<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> ModuleOutcome<T> {
    /// Folds a module computation into the report representation.
    pub fn from_module(result: Result<T, ModuleError>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(err) => Self::Unavailable {
                reason: err.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// The payload, if available.
    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }
}

/// An effect-size value with its categorical interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSize {
    pub value: f64,
    pub interpretation: &'static str,
}

impl EffectSize {
    /// Cohen's d bands: negligible < 0.2, small < 0.5, medium < 0.8, large.
    #[must_use]
    pub fn cohens_d(d: f64) -> Self {
        let magnitude = d.abs();
        let interpretation = if magnitude < 0.2 {
            "negligible"
        } else if magnitude < 0.5 {
            "small"
        } else if magnitude < 0.8 {
            "medium"
        } else {
            "large"
        };
        Self {
            value: d,
            interpretation,
        }
    }

    /// Eta-squared bands: negligible < 0.01, small < 0.06, medium < 0.14,
    /// large.
    #[must_use]
    pub fn eta_squared(eta2: f64) -> Self {
        let interpretation = if eta2 < 0.01 {
            "negligible"
        } else if eta2 < 0.06 {
            "small"
        } else if eta2 < 0.14 {
            "medium"
        } else {
            "large"
        };
        Self {
            value: eta2,
            interpretation,
        }
    }

    /// Cramér's V bands: negligible < 0.1, small < 0.3, moderate < 0.5,
    /// strong.
    #[must_use]
    pub fn cramers_v(v: f64) -> Self {
        let interpretation = if v < 0.1 {
            "negligible"
        } else if v < 0.3 {
            "small"
        } else if v < 0.5 {
            "moderate"
        } else {
            "strong"
        };
        Self {
            value: v,
            interpretation,
        }
    }
}

/// Tagged union over every statistical payload the modules produce.
///
/// The `kind` tag makes the report self-describing: consumers can dispatch on
/// it without knowing which module populated which key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatisticalResult {
    Descriptive(NumericSummary),
    Frequency(CategoricalSummary),
    Outliers(OutlierReport),
    Correlation(CorrelationPair),
    Sampling(SamplingSummary),
    HypothesisTest(OneSampleTest),
    TwoSampleTest(TwoSampleTest),
    ConfidenceInterval(ConfidenceIntervals),
    Anova(AnovaResult),
    ChiSquare(ChiSquareResult),
    GoodnessOfFit(GoodnessOfFitResult),
    LinearRegression(LinearRegressionReport),
    LogisticRegression(LogisticRegressionReport),
    TimeSeries(DeteriorationSeries),
}
