//! Common value types shared by the catalog and model crates.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scale in which a scalar predicate or bound is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Compare raw values.
    Linear,
    /// Compare `log10` of the values.
    Log10,
}

impl Scale {
    /// Apply the scale to a single value.
    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            Scale::Linear => v,
            Scale::Log10 => v.log10(),
        }
    }
}

/// Closed mass interval used by the CAM rank reducer and mass cuts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassRange {
    /// Lower edge.
    pub lo: f64,
    /// Upper edge.
    pub hi: f64,
}

impl MassRange {
    /// Create a range, rejecting inverted or non-finite edges.
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(Error::Validation(format!(
                "mass range must satisfy lo < hi with finite edges, got ({}, {})",
                lo, hi
            )));
        }
        Ok(Self { lo, hi })
    }

    /// Midpoint of the range.
    #[inline]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }
}

/// Dense row-major design matrix.
///
/// Stores `n` rows of `p` features each. Construction only enforces shape
/// (rectangular, non-empty); finiteness is checked by the model layer so the
/// matrix can also carry NaN-bearing columns into the pairwise covariance
/// helper.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    n: usize,
    p: usize,
    data: Vec<f64>, // length n*p, row-major
}

impl DesignMatrix {
    /// Build from row vectors. Every row must have the same length.
    pub fn from_rows(x: Vec<Vec<f64>>) -> Result<Self> {
        let n = x.len();
        let p = x.first().map(|r| r.len()).unwrap_or(0);
        if n == 0 || p == 0 {
            return Err(Error::Validation("X must be non-empty (n>0, p>0)".to_string()));
        }
        let mut data = Vec::with_capacity(n * p);
        for (i, row) in x.into_iter().enumerate() {
            if row.len() != p {
                return Err(Error::Validation(format!(
                    "X must be rectangular: row {} has len {}, expected {}",
                    i,
                    row.len(),
                    p
                )));
            }
            data.extend(row);
        }
        Ok(Self { n, p, data })
    }

    /// Build from column vectors. Every column must have the same length.
    pub fn from_columns(cols: Vec<Vec<f64>>) -> Result<Self> {
        let p = cols.len();
        let n = cols.first().map(|c| c.len()).unwrap_or(0);
        if n == 0 || p == 0 {
            return Err(Error::Validation("X must be non-empty (n>0, p>0)".to_string()));
        }
        for (j, col) in cols.iter().enumerate() {
            if col.len() != n {
                return Err(Error::Validation(format!(
                    "X must be rectangular: column {} has len {}, expected {}",
                    j,
                    col.len(),
                    n
                )));
            }
        }
        let mut data = vec![0.0; n * p];
        for (j, col) in cols.iter().enumerate() {
            for (i, &v) in col.iter().enumerate() {
                data[i * p + j] = v;
            }
        }
        Ok(Self { n, p, data })
    }

    /// Build a single-column matrix.
    pub fn from_column(col: Vec<f64>) -> Result<Self> {
        Self::from_columns(vec![col])
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.n
    }

    /// Number of feature columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.p
    }

    /// Borrow row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.p;
        &self.data[start..start + self.p]
    }

    /// Copy out column `j`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.n).map(|i| self.data[i * self.p + j]).collect()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.p)
    }

    /// Whether any entry is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }

    /// Apply `f` to every entry, returning a new matrix of the same shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self { n: self.n, p: self.p, data: self.data.iter().map(|&v| f(v)).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = DesignMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rows_and_columns_agree() {
        let m = DesignMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .unwrap();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.column(1), vec![2.0, 4.0, 6.0]);

        let c = DesignMatrix::from_columns(vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]).unwrap();
        assert_eq!(c, m);
    }

    #[test]
    fn test_has_non_finite() {
        let m = DesignMatrix::from_rows(vec![vec![1.0], vec![f64::NAN]]).unwrap();
        assert!(m.has_non_finite());
        let m = DesignMatrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        assert!(!m.has_non_finite());
    }

    #[test]
    fn test_mass_range_validation() {
        assert!(MassRange::new(0.5, 0.2).is_err());
        assert!(MassRange::new(f64::NAN, 1.0).is_err());
        let r = MassRange::new(0.2, 0.8).unwrap();
        assert!((r.midpoint() - 0.5).abs() < 1e-15);
    }
}
