//! L1-regularized linear regression via coordinate descent.
//!
//! Minimizes `(1/2n) ||y - b0 - X b||^2 + alpha * ||b||_1` with an
//! unpenalized intercept handled by column centering.

use hs_core::{DesignMatrix, Error, Result};

use crate::transform::{Transform, TransformKind};

const MAX_ITER: usize = 1000;
const TOL: f64 = 1e-8;

/// Fitted LASSO coefficients.
#[derive(Debug, Clone)]
pub struct LassoFit {
    /// Unpenalized intercept.
    pub intercept: f64,
    /// One (possibly exactly-zero) slope per feature.
    pub coef: Vec<f64>,
}

/// LASSO regression with optional transforms.
#[derive(Debug, Clone)]
pub struct Lasso {
    n_features: usize,
    alpha: f64,
    transform: Transform,
    state: Option<LassoFit>,
}

impl Lasso {
    /// Create an untrained model. `alpha` is the regularization strength.
    pub fn new(n_features: usize, alpha: f64, kind: TransformKind) -> Result<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(Error::Config(format!("alpha must be non-negative, got {}", alpha)));
        }
        Ok(Self { n_features, alpha, transform: Transform::new(kind), state: None })
    }

    /// Fixed feature count.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Regularization strength.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Whether the model has been fitted.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Fitted intercept and slopes, once trained.
    pub fn coefficients(&self) -> Option<&LassoFit> {
        self.state.as_ref()
    }

    /// Per-feature importance: the fitted coefficients themselves. Features
    /// the penalty zeroed out carry zero importance.
    pub fn importance(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.coef.as_slice())
    }

    pub(crate) fn fit_raw(&mut self, x: &DesignMatrix, y: &[f64]) -> Result<()> {
        let (xt, yt) = self.transform.fit(x, y)?;
        self.state = Some(coordinate_descent(&xt, &yt, self.alpha)?);
        Ok(())
    }

    pub(crate) fn predict_raw(&self, x: &DesignMatrix) -> Result<Vec<f64>> {
        let fit = self
            .state
            .as_ref()
            .ok_or_else(|| Error::Validation("predict called before fit".to_string()))?;
        let xt = self.transform.apply_x(x)?;
        let preds = xt
            .rows()
            .map(|row| fit.intercept + row.iter().zip(&fit.coef).map(|(&v, &b)| v * b).sum::<f64>())
            .collect();
        self.transform.invert_y(preds)
    }
}

#[inline]
fn soft_threshold(rho: f64, alpha: f64) -> f64 {
    if rho > alpha {
        rho - alpha
    } else if rho < -alpha {
        rho + alpha
    } else {
        0.0
    }
}

fn coordinate_descent(x: &DesignMatrix, y: &[f64], alpha: f64) -> Result<LassoFit> {
    let n = x.nrows();
    let p = x.ncols();
    let nf = n as f64;

    // center columns and the target so the intercept drops out
    let x_mean: Vec<f64> = (0..p).map(|j| x.column(j).iter().sum::<f64>() / nf).collect();
    let y_mean = y.iter().sum::<f64>() / nf;
    let xc: Vec<Vec<f64>> =
        (0..p).map(|j| x.column(j).iter().map(|&v| v - x_mean[j]).collect()).collect();
    let yc: Vec<f64> = y.iter().map(|&v| v - y_mean).collect();

    let col_sq: Vec<f64> = xc.iter().map(|c| c.iter().map(|v| v * v).sum::<f64>() / nf).collect();

    let mut beta = vec![0.0; p];
    let mut resid = yc; // r = yc - Xc beta, beta starts at zero
    for _ in 0..MAX_ITER {
        let mut max_delta: f64 = 0.0;
        for j in 0..p {
            if col_sq[j] == 0.0 {
                continue; // constant column: fully absorbed by the intercept
            }
            let rho = xc[j]
                .iter()
                .zip(&resid)
                .map(|(&xij, &r)| xij * (r + xij * beta[j]))
                .sum::<f64>()
                / nf;
            let new_b = soft_threshold(rho, alpha) / col_sq[j];
            let delta = new_b - beta[j];
            if delta != 0.0 {
                for (r, &xij) in resid.iter_mut().zip(&xc[j]) {
                    *r -= xij * delta;
                }
                beta[j] = new_b;
                max_delta = max_delta.max(delta.abs());
            }
        }
        if max_delta < TOL {
            break;
        }
    }

    let intercept = y_mean - beta.iter().zip(&x_mean).map(|(&b, &m)| b * m).sum::<f64>();
    Ok(LassoFit { intercept, coef: beta })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_alpha_matches_ols_on_exact_data() {
        let x = DesignMatrix::from_column(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let y: Vec<f64> = x.column(0).iter().map(|&v| 2.0 * v + 3.0).collect();

        let mut m = Lasso::new(1, 0.0, TransformKind::None).unwrap();
        m.fit_raw(&x, &y).unwrap();
        let fit = m.coefficients().unwrap();
        assert!((fit.intercept - 3.0).abs() < 1e-6, "intercept {}", fit.intercept);
        assert!((fit.coef[0] - 2.0).abs() < 1e-6, "slope {}", fit.coef[0]);
    }

    #[test]
    fn test_penalty_shrinks_toward_zero() {
        let x = DesignMatrix::from_column(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let y: Vec<f64> = x.column(0).iter().map(|&v| 2.0 * v + 3.0).collect();

        let mut weak = Lasso::new(1, 0.01, TransformKind::None).unwrap();
        weak.fit_raw(&x, &y).unwrap();
        let mut strong = Lasso::new(1, 2.0, TransformKind::None).unwrap();
        strong.fit_raw(&x, &y).unwrap();

        let b_weak = weak.coefficients().unwrap().coef[0];
        let b_strong = strong.coefficients().unwrap().coef[0];
        assert!(b_weak > b_strong, "{} vs {}", b_weak, b_strong);
        assert!(b_strong >= 0.0);
    }

    #[test]
    fn test_irrelevant_feature_is_zeroed() {
        // second feature is pure noise with no effect on y; a moderate
        // penalty should null it while keeping the real slope
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let a = i as f64 / 4.0;
                let noise = if i % 2 == 0 { 0.01 } else { -0.01 };
                vec![a, noise]
            })
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 3.0 * r[0]).collect();
        let x = DesignMatrix::from_rows(rows).unwrap();

        let mut m = Lasso::new(2, 0.05, TransformKind::None).unwrap();
        m.fit_raw(&x, &y).unwrap();
        let imp = m.importance().unwrap();
        assert!(imp[0] > 2.0, "real slope survived: {:?}", imp);
        assert_eq!(imp[1], 0.0, "noise feature nulled: {:?}", imp);
    }

    #[test]
    fn test_negative_alpha_rejected() {
        assert!(Lasso::new(1, -0.5, TransformKind::None).is_err());
    }
}
