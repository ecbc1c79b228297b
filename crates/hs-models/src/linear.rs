//! Ordinary least-squares linear regression with optional transforms.

use nalgebra::{DMatrix, DVector};

use hs_core::{DesignMatrix, Error, Result};

use crate::transform::{Transform, TransformKind};

/// Fitted OLS coefficients.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Intercept term.
    pub intercept: f64,
    /// One slope per feature.
    pub coef: Vec<f64>,
}

/// Linear regression fit by the normal equations `(X^T X) beta = X^T y`
/// with an intercept column.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    n_features: usize,
    transform: Transform,
    state: Option<LinearFit>,
}

impl LinearRegression {
    /// Create an untrained model.
    pub fn new(n_features: usize, kind: TransformKind) -> Self {
        Self { n_features, transform: Transform::new(kind), state: None }
    }

    /// Fixed feature count.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether the model has been fitted.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Fitted intercept and slopes, once trained.
    pub fn coefficients(&self) -> Option<&LinearFit> {
        self.state.as_ref()
    }

    pub(crate) fn fit_raw(&mut self, x: &DesignMatrix, y: &[f64]) -> Result<()> {
        let (xt, yt) = self.transform.fit(x, y)?;
        self.state = Some(solve_ols(&xt, &yt)?);
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

/// Closed-form OLS with intercept. Singular `X^T X` is a computation error.
pub(crate) fn solve_ols(x: &DesignMatrix, y: &[f64]) -> Result<LinearFit> {
    let n = x.nrows();
    let p = x.ncols();
    let d = p + 1;

    // Accumulate XtX and Xty with the implicit leading 1s column.
    let mut xtx = vec![0.0; d * d];
    let mut xty = vec![0.0; d];
    for i in 0..n {
        let yi = y[i];
        let row = x.row(i);
        xty[0] += yi;
        xtx[0] += 1.0;
        for a in 0..p {
            let xa = row[a];
            xty[1 + a] += xa * yi;
            xtx[1 + a] += xa;
            xtx[(1 + a) * d] += xa;
            for b in 0..p {
                xtx[(1 + a) * d + (1 + b)] += xa * row[b];
            }
        }
    }

    let a = DMatrix::from_row_slice(d, d, &xtx);
    let b = DVector::from_vec(xty);
    let sol = a
        .lu()
        .solve(&b)
        .ok_or_else(|| Error::Computation("OLS solve failed (singular XtX)".to_string()))?;
    Ok(LinearFit { intercept: sol[0], coef: sol.iter().skip(1).copied().collect() })
}
