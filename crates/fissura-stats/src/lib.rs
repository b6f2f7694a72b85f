//! Statistical primitives for the Fissura structural-analysis pipeline.
//!
//! This crate provides the numeric building blocks used by the analytics
//! engine in `fissura-core`:
//!
//! - **Descriptive statistics**: central tendency, dispersion, and
//!   distribution-shape measures ([`descriptive`])
//! - **Quantiles**: empirical quantiles and IQR-based fence computation
//!   ([`quantiles`])
//! - **Histograms**: fixed-bin density histograms ([`histogram`])
//! - **Frequency tables**: categorical frequencies with Shannon entropy
//!   ([`frequency`])
//! - **Outlier scans**: z-score, IQR, and modified z-score methods
//!   ([`outliers`])
//! - **Correlation**: Pearson, Spearman, and Kendall coefficients with
//!   significance testing ([`correlation`])
//! - **Reference distributions**: p-values and critical values from the
//!   normal, Student's t, F, and chi-squared distributions ([`distribution`])
//! - **Regression solvers**: least-squares linear models and gradient-descent
//!   logistic models ([`regression`])
//!
//! Everything operates on `f64` slices and returns `Option`/`Result` rather
//! than panicking on degenerate input (empty data, zero variance, singular
//! design matrices).
//!
//! # Examples
//!
//! ## Descriptive statistics
//!
//! ```
//! use fissura_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(&values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.median, 3.0);
//! ```
//!
//! ## Outlier detection
//!
//! ```
//! use fissura_stats::outliers::OutlierScan;
//!
//! let scan = OutlierScan::new(&[1.0, 2.0, 100.0]).unwrap();
//! assert_eq!(scan.iqr.values, vec![100.0]);
//! ```

pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod frequency;
pub mod histogram;
pub mod outliers;
pub mod quantiles;
pub mod regression;
