//! The statistical-inference engine.
//!
//! One [`AnalyticsEngine`] is constructed per request over an immutable
//! [`Dataset`] snapshot. Its four modules are independent: each consumes the
//! dataset, catches its own precondition failures, and reports them as
//! unavailable entries instead of aborting the others.

use tracing::info_span;

use crate::dataset::Dataset;
use crate::result::ModuleSection;

pub mod descriptive;
pub mod inferential;
pub mod predictive;
pub mod variance;

/// Per-request analytics over one dataset snapshot. Holds no mutable state;
/// the seed feeds the PRNGs the predictive module constructs internally.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine<'a> {
    dataset: &'a Dataset,
    seed: u64,
}

impl<'a> AnalyticsEngine<'a> {
    #[must_use]
    pub fn new(dataset: &'a Dataset, seed: u64) -> Self {
        Self { dataset, seed }
    }

    /// Frequency tables, histograms, outlier scans, and correlations.
    #[must_use]
    pub fn descriptive(&self) -> ModuleSection {
        let _span = info_span!("descriptive").entered();
        descriptive::analyze(self.dataset)
    }

    /// Sampling summaries, one/two-sample tests, confidence intervals, and
    /// the uniform goodness-of-fit.
    #[must_use]
    pub fn inferential(&self) -> ModuleSection {
        let _span = info_span!("inferential").entered();
        inferential::analyze(self.dataset)
    }

    /// ANOVA, the two-factor screen, and the chi-square family.
    #[must_use]
    pub fn variance(&self) -> ModuleSection {
        let _span = info_span!("variance").entered();
        variance::analyze(self.dataset)
    }

    /// Linear/logistic regression and the deterioration series.
    #[must_use]
    pub fn predictive(&self) -> ModuleSection {
        let _span = info_span!("predictive").entered();
        predictive::analyze(self.dataset, self.seed)
    }
}
