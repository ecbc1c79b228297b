//! Core traits for halostat
//!
//! The model crate exposes a closed set of prediction-model variants; this
//! trait is the capability surface consumers program against, so catalog and
//! plotting code never depend on concrete variant types.

use crate::types::DesignMatrix;
use crate::Result;

/// Shared fit/predict contract for prediction models.
///
/// Lifecycle: constructed untrained, `fit` transitions to trained (re-fitting
/// overwrites prior state), `predict` is valid only when trained.
///
/// `predict` takes `&mut self` because sampling variants draw from an
/// internal RNG.
pub trait Predictor {
    /// Fixed feature count set at construction.
    fn n_features(&self) -> usize;

    /// Whether `fit` has completed at least once.
    fn is_trained(&self) -> bool;

    /// Fit the model on `x` (one row per observation, `n_features` columns)
    /// and the matching target vector `y`.
    fn fit(&mut self, x: &DesignMatrix, y: &[f64]) -> Result<()>;

    /// Produce one prediction per row of `x`.
    fn predict(&mut self, x: &DesignMatrix) -> Result<Vec<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct MeanModel {
        mean: Option<f64>,
    }

    impl Predictor for MeanModel {
        fn n_features(&self) -> usize {
            1
        }

        fn is_trained(&self) -> bool {
            self.mean.is_some()
        }

        fn fit(&mut self, _x: &DesignMatrix, y: &[f64]) -> Result<()> {
            self.mean = Some(y.iter().sum::<f64>() / y.len() as f64);
            Ok(())
        }

        fn predict(&mut self, x: &DesignMatrix) -> Result<Vec<f64>> {
            let m = self
                .mean
                .ok_or_else(|| Error::Validation("predict before fit".to_string()))?;
            Ok(vec![m; x.nrows()])
        }
    }

    #[test]
    fn test_predictor_object_safety() {
        let mut m: Box<dyn Predictor> = Box::new(MeanModel { mean: None });
        assert!(!m.is_trained());
        let x = DesignMatrix::from_column(vec![1.0, 2.0]).unwrap();
        m.fit(&x, &[3.0, 5.0]).unwrap();
        assert_eq!(m.predict(&x).unwrap(), vec![4.0, 4.0]);
    }
}
