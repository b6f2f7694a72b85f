//! Structural-condition statistical inference core.
//!
//! This crate turns raw image detections (produced by an external perception
//! stage) into calibrated engineering measurements, assembles them into a
//! cleansed tabular dataset, and runs a statistical-inference engine over it:
//!
//! 1. **Calibration** ([`measurement`]): pixel geometry to millimetres,
//!    ordinal severity, and the derived risk index.
//! 2. **Dataset construction** ([`dataset`]): imputation, IQR capping,
//!    feature derivation, and seeded synthetic augmentation for tiny samples.
//! 3. **Analytics** ([`analytics`]): descriptive, inferential, variance, and
//!    predictive modules, each independent and availability-tagged.
//! 4. **Scoring** ([`scoring`]): bounded health/sustainability scores and the
//!    risk bucket.
//! 5. **Assembly** ([`report`]): [`report::run_analysis`] runs the whole
//!    pipeline and produces one serializable [`report::AnalysisReport`].
//!
//! The pipeline does no I/O and holds no shared mutable state: every request
//! constructs its own dataset, models, and PRNGs, so concurrent requests
//! cannot interfere and the same input (and seed) always produces the same
//! report.
//!
//! # Examples
//!
//! ```
//! use fissura_core::detection::{AnalysisConfig, PixelBox, RawDetection};
//! use fissura_core::report::{AnalysisInput, run_analysis};
//!
//! let input = AnalysisInput {
//!     detections: vec![RawDetection {
//!         label: "Severe".to_owned(),
//!         bbox: PixelBox { x: 10.0, y: 4.0, width_px: 12.0, height_px: 48.0 },
//!         confidence: 0.91,
//!     }],
//!     material: None,
//!     growth_percentage: 2.5,
//!     config: AnalysisConfig::default(),
//! };
//! let report = run_analysis(&input).unwrap();
//! assert!(report.scores.health <= 100.0);
//! assert!(report.predictive.contains_key("linear_regression"));
//! ```

pub mod analytics;
pub mod dataset;
pub mod detection;
pub mod measurement;
pub mod report;
pub mod result;
pub mod scoring;
