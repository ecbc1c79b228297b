//! Closed set of prediction-model variants behind the shared
//! [`Predictor`] contract.
//!
//! Shape and finiteness validation is applied uniformly here, BEFORE
//! dispatching to a variant, so every variant's internal fit/predict can
//! assume clean input.

use hs_core::{DesignMatrix, Error, MassRange, Predictor, Result};

use crate::cam::{AnReducer, Cam};
use crate::gaussian::MultiVariateGaussian;
use crate::lasso::Lasso;
use crate::linear::LinearRegression;
use crate::lognormal::LogNormalSample;
use crate::transform::TransformKind;

/// Tagged prediction-model variant.
#[derive(Debug)]
pub enum Model {
    /// Ordinary least squares.
    Linear(LinearRegression),
    /// L1-regularized least squares.
    Lasso(Lasso),
    /// Lognormal random-sample baseline.
    LogNormal(LogNormalSample),
    /// Multivariate-Gaussian conditional mean.
    Gaussian(MultiVariateGaussian),
    /// Conditional abundance matching.
    Cam(Cam),
}

fn check_n_features(n_features: usize) -> Result<()> {
    if n_features == 0 {
        return Err(Error::Config("n_features must be positive".to_string()));
    }
    Ok(())
}

impl Model {
    /// Linear regression variant.
    pub fn linear(n_features: usize, kind: TransformKind) -> Result<Model> {
        check_n_features(n_features)?;
        Ok(Model::Linear(LinearRegression::new(n_features, kind)))
    }

    /// LASSO variant with regularization strength `alpha`.
    pub fn lasso(n_features: usize, alpha: f64, kind: TransformKind) -> Result<Model> {
        check_n_features(n_features)?;
        Ok(Model::Lasso(Lasso::new(n_features, alpha, kind)?))
    }

    /// Lognormal-sampler variant; `seed` makes predictions reproducible.
    pub fn lognormal(n_features: usize, seed: Option<u64>) -> Result<Model> {
        check_n_features(n_features)?;
        Ok(Model::LogNormal(LogNormalSample::new(n_features, seed)))
    }

    /// Multivariate-Gaussian variant.
    pub fn gaussian(n_features: usize, kind: TransformKind) -> Result<Model> {
        check_n_features(n_features)?;
        Ok(Model::Gaussian(MultiVariateGaussian::new(n_features, kind)))
    }

    /// CAM variant.
    pub fn cam(
        n_features: usize,
        mass_bins: Vec<f64>,
        mrange: MassRange,
        cam_order: i8,
        reducer: Box<dyn AnReducer + Send + Sync>,
    ) -> Result<Model> {
        check_n_features(n_features)?;
        Ok(Model::Cam(Cam::new(n_features, mass_bins, mrange, cam_order, reducer)?))
    }

    /// Variant name matching the training-suite vocabulary.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Model::Linear(_) => "linear",
            Model::Lasso(_) => "lasso",
            Model::LogNormal(_) => "lognormal",
            Model::Gaussian(_) => "gaussian",
            Model::Cam(_) => "cam",
        }
    }
}

fn validate_x(x: &DesignMatrix, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(Error::Validation(format!(
            "x has {} feature columns, model expects {}",
            x.ncols(),
            n_features
        )));
    }
    if x.has_non_finite() {
        return Err(Error::Validation("x must contain only finite values".to_string()));
    }
    Ok(())
}

fn validate_xy(x: &DesignMatrix, y: &[f64], n_features: usize) -> Result<()> {
    validate_x(x, n_features)?;
    if y.len() != x.nrows() {
        return Err(Error::Validation(format!(
            "y has {} rows, x has {}",
            y.len(),
            x.nrows()
        )));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(Error::Validation("y must contain only finite values".to_string()));
    }
    Ok(())
}

impl Predictor for Model {
    fn n_features(&self) -> usize {
        match self {
            Model::Linear(m) => m.n_features(),
            Model::Lasso(m) => m.n_features(),
            Model::LogNormal(m) => m.n_features(),
            Model::Gaussian(m) => m.n_features(),
            Model::Cam(m) => m.n_features(),
        }
    }

    fn is_trained(&self) -> bool {
        match self {
            Model::Linear(m) => m.is_trained(),
            Model::Lasso(m) => m.is_trained(),
            Model::LogNormal(m) => m.is_trained(),
            Model::Gaussian(m) => m.is_trained(),
            Model::Cam(m) => m.is_trained(),
        }
    }

    fn fit(&mut self, x: &DesignMatrix, y: &[f64]) -> Result<()> {
        validate_xy(x, y, self.n_features())?;
        match self {
            Model::Linear(m) => m.fit_raw(x, y),
            Model::Lasso(m) => m.fit_raw(x, y),
            Model::LogNormal(m) => m.fit_raw(x, y),
            Model::Gaussian(m) => m.fit_raw(x, y),
            Model::Cam(m) => m.fit_raw(x, y),
        }
    }

    fn predict(&mut self, x: &DesignMatrix) -> Result<Vec<f64>> {
        validate_x(x, self.n_features())?;
        if !self.is_trained() {
            return Err(Error::Validation("predict called before fit".to_string()));
        }
        match self {
            Model::Linear(m) => m.predict_raw(x),
            Model::Lasso(m) => m.predict_raw(x),
            Model::LogNormal(m) => m.predict_raw(x),
            Model::Gaussian(m) => m.predict_raw(x),
            Model::Cam(m) => m.predict_raw(x),
        }
    }
}
