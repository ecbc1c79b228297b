//! # hs-models
//!
//! Prediction models relating halo properties:
//! - linear regression and LASSO (optionally on log- or quantile-transformed
//!   variables),
//! - a lognormal random-sample baseline,
//! - a multivariate-Gaussian conditional-mean model,
//! - conditional abundance matching (CAM),
//!
//! plus the training-suite orchestrator that validates and fits a batch of
//! named runs. All variants share the [`hs_core::Predictor`] contract through
//! the tagged [`Model`] enum, with shape/NaN validation applied uniformly
//! before dispatch.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Conditional abundance matching.
pub mod cam;
/// Multivariate-Gaussian conditioning and pairwise-complete covariance.
pub mod gaussian;
/// Clamped piecewise-linear interpolation.
pub mod interp;
/// Coordinate-descent LASSO.
pub mod lasso;
/// OLS linear regression.
pub mod linear;
/// Lognormal random-sample baseline.
pub mod lognormal;
/// Tagged model enum and uniform validation.
pub mod model;
/// Suite orchestration: validate-all-then-fit-all.
pub mod suite;
/// Log and quantile variable transforms.
pub mod transform;

pub use cam::{AnReducer, Cam, MassBinInterpolator};
pub use gaussian::{pairwise_covariance, MultiVariateGaussian};
pub use interp::Interp1d;
pub use lasso::Lasso;
pub use linear::LinearRegression;
pub use lognormal::LogNormalSample;
pub use model::Model;
pub use suite::{build_model, suite_from_json, training_suite, ModelKind, ModelOptions, TrainingEntry};
pub use transform::{QuantileTransform, Transform, TransformKind};
