//! Piecewise-linear interpolation over a sorted grid.

use hs_core::{Error, Result};

/// Monotone piecewise-linear lookup table with clamped evaluation.
///
/// The grid must be non-decreasing; evaluation outside the grid returns the
/// boundary value (no extrapolation).
#[derive(Debug, Clone)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Interp1d {
    /// Build a table from matching `xs` (non-decreasing) and `ys`.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.is_empty() {
            return Err(Error::Computation("interpolation table is empty".to_string()));
        }
        if xs.len() != ys.len() {
            return Err(Error::Validation(format!(
                "interpolation grids differ in length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Validation("interpolation grid must be sorted".to_string()));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(Error::Validation("interpolation grids must be finite".to_string()));
        }
        Ok(Self { xs, ys })
    }

    /// Evaluate at `x`, clamping to the boundary values outside the grid.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        // first index with xs[j] >= x; 1 <= j <= n-1 here
        let j = self.xs.partition_point(|&v| v < x);
        if self.xs[j] == x {
            return self.ys[j];
        }
        let (x0, x1) = (self.xs[j - 1], self.xs[j]);
        let (y0, y1) = (self.ys[j - 1], self.ys[j]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Evaluate over a slice.
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}
