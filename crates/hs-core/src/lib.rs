//! # hs-core
//!
//! Core types for the halostat toolkit: the shared error enum, the
//! fit/predict capability trait, and the dense design matrix exchanged
//! between the catalog and model layers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::Predictor;
pub use types::{DesignMatrix, MassRange, Scale};
