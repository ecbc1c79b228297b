//! Lognormal random-sample baseline.
//!
//! Ignores the feature values entirely: fitting records the mean and standard
//! deviation of `ln y`, and predicting draws fresh lognormal samples, one per
//! input row. Useful as a no-information baseline against the regression
//! variants.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::LogNormal;

use hs_core::{DesignMatrix, Error, Result};

/// Lognormal sampler model.
#[derive(Debug)]
pub struct LogNormalSample {
    n_features: usize,
    rng: StdRng,
    state: Option<(f64, f64)>, // (mu, sigma) of ln y
}

impl LogNormalSample {
    /// Create an untrained sampler; `seed` makes predictions reproducible.
    pub fn new(n_features: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { n_features, rng, state: None }
    }

    /// Fixed feature count.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether the model has been fitted.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Fitted `(mu, sigma)` of `ln y`, once trained.
    pub fn log_moments(&self) -> Option<(f64, f64)> {
        self.state
    }

    pub(crate) fn fit_raw(&mut self, _x: &DesignMatrix, y: &[f64]) -> Result<()> {
        if y.iter().any(|&v| v <= 0.0) {
            return Err(Error::Validation(
                "lognormal fit requires strictly positive y".to_string(),
            ));
        }
        let logs: Vec<f64> = y.iter().map(|&v| v.ln()).collect();
        let n = logs.len() as f64;
        let mu = logs.iter().sum::<f64>() / n;
        // population standard deviation, matching the fitting convention
        let sigma = (logs.iter().map(|&l| (l - mu) * (l - mu)).sum::<f64>() / n).sqrt();
        self.state = Some((mu, sigma));
        Ok(())
    }

    pub(crate) fn predict_raw(&mut self, x: &DesignMatrix) -> Result<Vec<f64>> {
        let (mu, sigma) = self
            .state
            .ok_or_else(|| Error::Validation("predict called before fit".to_string()))?;
        let dist = LogNormal::new(mu, sigma)
            .map_err(|e| Error::Computation(format!("invalid lognormal parameters: {}", e)))?;
        Ok((0..x.nrows()).map(|_| self.rng.sample(dist)).collect())
    }
}
