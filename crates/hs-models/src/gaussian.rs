//! Multivariate-Gaussian conditional-mean model.
//!
//! Fits the joint covariance of `[y, x_1, .., x_p]`, then conditions on the
//! features using the standard Gaussian identity: with the covariance
//! partitioned into blocks `S11` (y), `S12` (y vs x), and `S22` (x vs x),
//!
//! ```text
//! E[y | x]   = mu1 + S12 S22^-1 (x - mu2)
//! Var[y | x] = S11 - S12 S22^-1 S12^T
//! ```
//!
//! Covariance entries are accumulated pairwise-complete: each (i, j) entry
//! uses the rows where BOTH variables are non-NaN, so the helper is usable
//! on gappy column data directly, even though inputs routed through the
//! model's `fit` have already been screened for NaN.

use nalgebra::{DMatrix, DVector};

use hs_core::{DesignMatrix, Error, Result};

use crate::transform::{Transform, TransformKind};

/// Sample mean and covariance of two columns over their pairwise-complete
/// rows. Requires at least two complete pairs.
fn pairwise_cov(a: &[f64], b: &[f64]) -> Result<(f64, f64)> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter(|(&x, &y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    let k = pairs.len();
    if k < 2 {
        return Err(Error::Computation(
            "fewer than two pairwise-complete rows for covariance".to_string(),
        ));
    }
    let kf = k as f64;
    let ma = pairs.iter().map(|p| p.0).sum::<f64>() / kf;
    let mb = pairs.iter().map(|p| p.1).sum::<f64>() / kf;
    let cov = pairs.iter().map(|&(x, y)| (x - ma) * (y - mb)).sum::<f64>() / (kf - 1.0);
    let va = pairs.iter().map(|&(x, _)| (x - ma) * (x - ma)).sum::<f64>() / (kf - 1.0);
    let vb = pairs.iter().map(|&(_, y)| (y - mb) * (y - mb)).sum::<f64>() / (kf - 1.0);
    let corr = cov / (va.sqrt() * vb.sqrt());
    Ok((cov, corr))
}

/// Pairwise-complete covariance and correlation matrices over `cols`.
///
/// Entry `(i, j)` is computed over the rows where both column `i` and column
/// `j` are non-NaN (pairwise-complete, not row-complete).
pub fn pairwise_covariance(cols: &[Vec<f64>]) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let d = cols.len();
    let mut sigma = DMatrix::zeros(d, d);
    let mut rho = DMatrix::zeros(d, d);
    for i in 0..d {
        for j in i..d {
            let (cov, corr) = pairwise_cov(&cols[i], &cols[j])?;
            sigma[(i, j)] = cov;
            sigma[(j, i)] = cov;
            rho[(i, j)] = corr;
            rho[(j, i)] = corr;
        }
    }
    if sigma.iter().any(|v| !v.is_finite()) || rho.iter().any(|v| !v.is_finite()) {
        return Err(Error::Computation(
            "covariance accumulation produced non-finite entries".to_string(),
        ));
    }
    Ok((sigma, rho))
}

fn finite_mean(v: &[f64]) -> Result<f64> {
    let kept: Vec<f64> = v.iter().copied().filter(|x| x.is_finite()).collect();
    if kept.is_empty() {
        return Err(Error::Computation("mean over empty (all-NaN) column".to_string()));
    }
    Ok(kept.iter().sum::<f64>() / kept.len() as f64)
}

/// Fitted conditioning state.
#[derive(Debug, Clone)]
pub struct GaussianFit {
    mu1: f64,
    mu2: DVector<f64>,
    sigma: DMatrix<f64>,
    rho: DMatrix<f64>,
    beta: DVector<f64>, // S22^-1 S12^T, solved once at fit time
    sigma_cond: f64,
}

/// Multivariate-Gaussian conditional-mean model with optional transforms.
#[derive(Debug, Clone)]
pub struct MultiVariateGaussian {
    n_features: usize,
    transform: Transform,
    state: Option<GaussianFit>,
}

impl MultiVariateGaussian {
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

    /// Joint covariance matrix of `[y, x..]`, once trained.
    pub fn covariance(&self) -> Option<&DMatrix<f64>> {
        self.state.as_ref().map(|s| &s.sigma)
    }

    /// Joint correlation matrix of `[y, x..]`, once trained.
    pub fn correlation(&self) -> Option<&DMatrix<f64>> {
        self.state.as_ref().map(|s| &s.rho)
    }

    /// Conditional variance `Var[y | x]`, once trained.
    pub fn conditional_variance(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma_cond)
    }

    pub(crate) fn fit_raw(&mut self, x: &DesignMatrix, y: &[f64]) -> Result<()> {
        let (xt, yt) = self.transform.fit(x, y)?;
        let p = self.n_features;

        // stack [y | x] column-wise
        let mut cols = Vec::with_capacity(p + 1);
        cols.push(yt.clone());
        for j in 0..p {
            cols.push(xt.column(j));
        }
        let (sigma, rho) = pairwise_covariance(&cols)?;

        let mu1 = finite_mean(&yt)?;
        let mu2 = DVector::from_iterator(
            p,
            (0..p).map(|j| finite_mean(&cols[j + 1])).collect::<Result<Vec<_>>>()?,
        );

        let sigma12 = DVector::from_iterator(p, (0..p).map(|j| sigma[(0, j + 1)]));
        let sigma22 = sigma.view((1, 1), (p, p)).into_owned();

        // solve S22 beta = S12^T once at fit time
        let beta = sigma22.lu().solve(&sigma12).ok_or_else(|| {
            Error::Computation("covariance block Sigma22 is singular".to_string())
        })?;

        let sigma_cond = sigma[(0, 0)] - sigma12.dot(&beta);
        self.state = Some(GaussianFit { mu1, mu2, sigma, rho, beta, sigma_cond });
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
            .map(|row| {
                let centered =
                    row.iter().zip(fit.mu2.iter()).map(|(&v, &m)| v - m);
                fit.mu1 + centered.zip(fit.beta.iter()).map(|(c, &b)| c * b).sum::<f64>()
            })
            .collect();
        self.transform.invert_y(preds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairwise_covariance_ignores_nan_rows_per_pair() {
        let a = vec![1.0, 2.0, 3.0, 4.0, f64::NAN];
        let b = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let (sigma, rho) = pairwise_covariance(&[a, b]).unwrap();
        // over the 4 complete pairs: cov(a,b) = 2 * var(a)
        assert!((sigma[(0, 1)] - 2.0 * sigma[(0, 0)]).abs() < 1e-12);
        assert!((rho[(0, 1)] - 1.0).abs() < 1e-12);
        // diagonal of b uses all 5 values
        let full_var_b = {
            let m = 6.0;
            [2.0f64, 4.0, 6.0, 8.0, 10.0].iter().map(|v| (v - m) * (v - m)).sum::<f64>() / 4.0
        };
        assert!((sigma[(1, 1)] - full_var_b).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_complete_pairs_is_computation_error() {
        let a = vec![1.0, f64::NAN, f64::NAN];
        let b = vec![2.0, 3.0, 4.0];
        assert!(matches!(pairwise_covariance(&[a, b]), Err(Error::Computation(_))));
    }

    #[test]
    fn test_recovers_exact_linear_relation() {
        // y = 2x + 3 exactly: conditional mean must reproduce y, conditional
        // variance must vanish
        let xs: Vec<f64> = (0..50).map(|i| i as f64 / 5.0).collect();
        let y: Vec<f64> = xs.iter().map(|&v| 2.0 * v + 3.0).collect();
        let x = DesignMatrix::from_column(xs).unwrap();

        let mut m = MultiVariateGaussian::new(1, TransformKind::None);
        m.fit_raw(&x, &y).unwrap();

        let pred = m.predict_raw(&x).unwrap();
        for (p, t) in pred.iter().zip(&y) {
            assert!((p - t).abs() < 1e-9, "{} vs {}", p, t);
        }
        assert!(m.conditional_variance().unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_known_bivariate_gaussian_conditioning() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        use rand_distr::{Distribution, Normal};

        // x ~ N(0, 1), y = 0.8 x + e with e ~ N(0, 0.6^2):
        // S12 = 0.8, S22 = 1, conditional slope 0.8, Var[y|x] = 0.36
        let mut rng = StdRng::seed_from_u64(42);
        let nx = Normal::new(0.0, 1.0).unwrap();
        let ne = Normal::new(0.0, 0.6).unwrap();
        let xs: Vec<f64> = (0..20000).map(|_| nx.sample(&mut rng)).collect();
        let y: Vec<f64> = xs.iter().map(|&v| 0.8 * v + ne.sample(&mut rng)).collect();
        let x = DesignMatrix::from_column(xs).unwrap();

        let mut m = MultiVariateGaussian::new(1, TransformKind::None);
        m.fit_raw(&x, &y).unwrap();

        let var_cond = m.conditional_variance().unwrap();
        assert!((var_cond - 0.36).abs() < 0.02, "Var[y|x] = {}", var_cond);

        // conditional mean at x = 1 should be close to 0.8
        let probe = DesignMatrix::from_column(vec![1.0, -1.0, 0.0]).unwrap();
        let pred = m.predict_raw(&probe).unwrap();
        assert!((pred[0] - 0.8).abs() < 0.05, "E[y|x=1] = {}", pred[0]);
        assert!((pred[1] + 0.8).abs() < 0.05, "E[y|x=-1] = {}", pred[1]);
        assert!(pred[2].abs() < 0.05, "E[y|x=0] = {}", pred[2]);
    }

    #[test]
    fn test_singular_sigma22_is_computation_error() {
        // duplicated feature columns make Sigma22 singular
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| 1.0 + i as f64).collect();
        let x = DesignMatrix::from_rows(rows).unwrap();

        let mut m = MultiVariateGaussian::new(2, TransformKind::None);
        let err = m.fit_raw(&x, &y).unwrap_err();
        assert!(matches!(err, Error::Computation(_)), "{}", err);
    }
}
