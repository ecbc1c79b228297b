//! Variable transforms applied around fitting and prediction.
//!
//! Models that support transformed variables (linear, LASSO, Gaussian) own a
//! [`Transform`]. At fit time the transform is fitted on the TRAINING data
//! and both x and y are mapped through it; at predict time x is mapped with
//! the already-fitted transform and predictions are mapped back through the
//! inverse, so callers always see the original scale.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use hs_core::{DesignMatrix, Error, Result};

use crate::interp::Interp1d;

// sklearn-style clipping of empirical quantiles before the normal ppf
const QUANTILE_CLIP: f64 = 1e-7;

/// Which transform to apply. Log and quantile are mutually exclusive by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Fit and predict on the raw values.
    #[default]
    None,
    /// Natural-log both sides; predictions are exponentiated back.
    Log,
    /// Empirical-CDF-to-Gaussian quantile mapping, fit once on training data.
    Quantile,
}

impl TransformKind {
    /// Resolve the historical `(use_qt, use_logs)` flag pair; setting both is
    /// a configuration error.
    pub fn from_flags(use_qt: bool, use_logs: bool) -> Result<Self> {
        match (use_qt, use_logs) {
            (true, true) => Err(Error::Config(
                "use_qt and use_logs are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(TransformKind::Quantile),
            (false, true) => Ok(TransformKind::Log),
            (false, false) => Ok(TransformKind::None),
        }
    }
}

/// One-dimensional empirical-CDF-to-standard-normal quantile map.
#[derive(Debug, Clone)]
pub struct QuantileTransform {
    forward: Interp1d,  // sorted values -> fractional quantile
    inverse: Interp1d,  // fractional quantile -> value
}

impl QuantileTransform {
    /// Fit the empirical quantile grid on `data`.
    pub fn fit(data: &[f64]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::Validation(
                "quantile transform needs at least 2 samples".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation(
                "quantile transform requires finite samples".to_string(),
            ));
        }
        let mut quantiles = data.to_vec();
        quantiles.sort_by(|a, b| a.partial_cmp(b).expect("checked finite"));
        let n = quantiles.len();
        let references: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        Ok(Self {
            forward: Interp1d::new(quantiles.clone(), references.clone())?,
            inverse: Interp1d::new(references, quantiles)?,
        })
    }

    /// Map a raw value to standard-normal space.
    pub fn transform(&self, v: f64) -> f64 {
        let p = self.forward.eval(v).clamp(QUANTILE_CLIP, 1.0 - QUANTILE_CLIP);
        standard_normal().inverse_cdf(p)
    }

    /// Map a standard-normal value back to the original scale.
    pub fn inverse(&self, z: f64) -> f64 {
        let p = standard_normal().cdf(z);
        self.inverse.eval(p)
    }
}

#[inline]
fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("unit normal is valid")
}

/// Fitted transform state shared by the transform-capable models.
#[derive(Debug, Clone)]
pub struct Transform {
    kind: TransformKind,
    qt_x: Vec<QuantileTransform>,
    qt_y: Option<QuantileTransform>,
}

impl Transform {
    /// Create an unfitted transform of the given kind.
    pub fn new(kind: TransformKind) -> Self {
        Self { kind, qt_x: Vec::new(), qt_y: None }
    }

    /// The transform kind.
    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// Fit on training data and return the transformed `(x, y)`.
    pub fn fit(&mut self, x: &DesignMatrix, y: &[f64]) -> Result<(DesignMatrix, Vec<f64>)> {
        match self.kind {
            TransformKind::None => Ok((x.clone(), y.to_vec())),
            TransformKind::Log => {
                check_positive(x, y)?;
                Ok((x.map(f64::ln), y.iter().map(|&v| v.ln()).collect()))
            }
            TransformKind::Quantile => {
                self.qt_x = (0..x.ncols())
                    .map(|j| QuantileTransform::fit(&x.column(j)))
                    .collect::<Result<Vec<_>>>()?;
                self.qt_y = Some(QuantileTransform::fit(y)?);
                let xt = self.apply_x(x)?;
                let qy = self.qt_y.as_ref().expect("just fitted");
                Ok((xt, y.iter().map(|&v| qy.transform(v)).collect()))
            }
        }
    }

    /// Map a prediction-time x through the fitted transform.
    pub fn apply_x(&self, x: &DesignMatrix) -> Result<DesignMatrix> {
        match self.kind {
            TransformKind::None => Ok(x.clone()),
            TransformKind::Log => {
                if x.rows().any(|r| r.iter().any(|&v| v <= 0.0)) {
                    return Err(Error::Validation(
                        "log transform requires strictly positive x".to_string(),
                    ));
                }
                Ok(x.map(f64::ln))
            }
            TransformKind::Quantile => {
                if self.qt_x.len() != x.ncols() {
                    return Err(Error::Validation(
                        "quantile transform was not fitted for this feature count".to_string(),
                    ));
                }
                let cols = (0..x.ncols())
                    .map(|j| {
                        let qt = &self.qt_x[j];
                        x.column(j).into_iter().map(|v| qt.transform(v)).collect()
                    })
                    .collect();
                DesignMatrix::from_columns(cols)
            }
        }
    }

    /// Map model-space predictions back to the original scale.
    pub fn invert_y(&self, y: Vec<f64>) -> Result<Vec<f64>> {
        match self.kind {
            TransformKind::None => Ok(y),
            TransformKind::Log => Ok(y.into_iter().map(f64::exp).collect()),
            TransformKind::Quantile => {
                let qy = self.qt_y.as_ref().ok_or_else(|| {
                    Error::Validation("quantile transform used before fitting".to_string())
                })?;
                Ok(y.into_iter().map(|z| qy.inverse(z)).collect())
            }
        }
    }
}

fn check_positive(x: &DesignMatrix, y: &[f64]) -> Result<()> {
    if x.rows().any(|r| r.iter().any(|&v| v <= 0.0)) || y.iter().any(|&v| v <= 0.0) {
        return Err(Error::Validation(
            "log transform requires strictly positive x and y".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_resolution() {
        assert_eq!(TransformKind::from_flags(false, false).unwrap(), TransformKind::None);
        assert_eq!(TransformKind::from_flags(true, false).unwrap(), TransformKind::Quantile);
        assert_eq!(TransformKind::from_flags(false, true).unwrap(), TransformKind::Log);
        assert!(matches!(TransformKind::from_flags(true, true), Err(Error::Config(_))));
    }

    #[test]
    fn test_quantile_roundtrip_on_training_points() {
        let data = vec![3.0, 1.0, 4.0, 1.5, 9.0, 2.6, 5.3, 5.8];
        let qt = QuantileTransform::fit(&data).unwrap();
        for &v in &data {
            let z = qt.transform(v);
            let back = qt.inverse(z);
            // extremes clip at the quantile boundary, costing ~1e-6
            assert!(
                (v - back).abs() < 1e-4,
                "roundtrip failed: {} -> {} -> {}",
                v,
                z,
                back
            );
        }
    }

    #[test]
    fn test_quantile_transform_gaussianizes_extremes() {
        let data: Vec<f64> = (1..=100).map(|i| (i * i) as f64).collect();
        let qt = QuantileTransform::fit(&data).unwrap();
        // smallest sample maps far into the left tail, largest far right
        assert!(qt.transform(1.0) < -3.0);
        assert!(qt.transform(10000.0) > 3.0);
        // median-ish sample lands near zero
        let z_med = qt.transform(2500.0);
        assert!(z_med.abs() < 0.2, "median mapped to {}", z_med);
    }

    #[test]
    fn test_log_transform_requires_positive() {
        let x = DesignMatrix::from_column(vec![1.0, -2.0]).unwrap();
        let mut t = Transform::new(TransformKind::Log);
        assert!(t.fit(&x, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_log_transform_roundtrip() {
        let x = DesignMatrix::from_column(vec![1.0, 2.0, 3.0]).unwrap();
        let y = vec![2.0, 4.0, 8.0];
        let mut t = Transform::new(TransformKind::Log);
        let (xt, yt) = t.fit(&x, &y).unwrap();
        assert!((xt.row(1)[0] - 2f64.ln()).abs() < 1e-15);
        let back = t.invert_y(yt).unwrap();
        for (a, b) in back.iter().zip(&y) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
