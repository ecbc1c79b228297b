//! Conditional abundance matching (CAM).
//!
//! The feature array holds each halo's scale history `a(m)` evaluated at a
//! grid of mass bins. An [`AnReducer`] collapses that curve to a single
//! rank statistic `an` per halo; CAM then matches the empirical rank of `an`
//! in the training set to the empirical rank of the target `y`, connecting
//! the two through fractional marks.

use hs_core::{DesignMatrix, Error, MassRange, Result};

use crate::interp::Interp1d;

/// Collaborator reducing a per-halo mass-bin curve to one rank statistic.
///
/// Pure function of the rows; the production pipeline supplies its own
/// implementation, and [`MassBinInterpolator`] ships as a reference one.
pub trait AnReducer {
    /// One derived value per row of `am`.
    fn reduce(&self, am: &DesignMatrix, mass_bins: &[f64], mrange: MassRange) -> Result<Vec<f64>>;
}

/// Reference reducer: linearly interpolates each halo's `a(m)` curve over the
/// mass bins and reads it off at the midpoint of the valid mass range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassBinInterpolator;

impl AnReducer for MassBinInterpolator {
    fn reduce(&self, am: &DesignMatrix, mass_bins: &[f64], mrange: MassRange) -> Result<Vec<f64>> {
        let m = mrange.midpoint();
        am.rows()
            .map(|row| Ok(Interp1d::new(mass_bins.to_vec(), row.to_vec())?.eval(m)))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct CamFit {
    an_to_mark: Interp1d,
    mark_to_y: Interp1d,
}

/// Conditional-abundance-matching model.
pub struct Cam {
    n_features: usize,
    mass_bins: Vec<f64>,
    mrange: MassRange,
    cam_order: i8,
    reducer: Box<dyn AnReducer + Send + Sync>,
    state: Option<CamFit>,
}

impl std::fmt::Debug for Cam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cam")
            .field("n_features", &self.n_features)
            .field("mass_bins", &self.mass_bins)
            .field("mrange", &self.mrange)
            .field("cam_order", &self.cam_order)
            .field("reducer", &"<dyn AnReducer>")
            .field("fitted", &self.state.is_some())
            .finish()
    }
}

impl Cam {
    /// Create an untrained CAM model.
    ///
    /// `mass_bins` must be sorted ascending with one bin per feature;
    /// `cam_order` is `+1` when `an` correlates positively with `y` and `-1`
    /// when it anti-correlates.
    pub fn new(
        n_features: usize,
        mass_bins: Vec<f64>,
        mrange: MassRange,
        cam_order: i8,
        reducer: Box<dyn AnReducer + Send + Sync>,
    ) -> Result<Self> {
        if cam_order != 1 && cam_order != -1 {
            return Err(Error::Config(format!(
                "cam_order must be +1 or -1, got {}",
                cam_order
            )));
        }
        if mass_bins.len() != n_features {
            return Err(Error::Config(format!(
                "expected {} mass bins (one per feature), got {}",
                n_features,
                mass_bins.len()
            )));
        }
        if mass_bins.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Config("mass bins must be strictly ascending".to_string()));
        }
        Ok(Self { n_features, mass_bins, mrange, cam_order, reducer, state: None })
    }

    /// Fixed feature count (== number of mass bins).
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether the model has been fitted.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Sort order: `+1` ascending, `-1` descending.
    pub fn cam_order(&self) -> i8 {
        self.cam_order
    }

    pub(crate) fn fit_raw(&mut self, am: &DesignMatrix, y: &[f64]) -> Result<()> {
        let mut an = self.reducer.reduce(am, &self.mass_bins, self.mrange)?;
        if an.len() != am.nrows() {
            return Err(Error::Computation(format!(
                "rank reducer returned {} values for {} halos",
                an.len(),
                am.nrows()
            )));
        }
        let n = an.len();
        if n < 2 {
            return Err(Error::Computation("CAM needs at least 2 training halos".to_string()));
        }
        if an.iter().any(|v| !v.is_finite()) {
            return Err(Error::Computation(
                "rank reducer produced non-finite values".to_string(),
            ));
        }

        an.sort_by(|a, b| a.partial_cmp(b).expect("checked finite"));
        let mut y_sorted = y.to_vec();
        y_sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite y"));
        if self.cam_order == -1 {
            y_sorted.reverse();
        }

        // evenly spaced fractional ranks, offset by half a step to center bins
        let step = 1.0 / n as f64;
        let marks: Vec<f64> = (0..n).map(|i| i as f64 * step + step / 2.0).collect();

        self.state = Some(CamFit {
            an_to_mark: Interp1d::new(an, marks.clone())?,
            mark_to_y: Interp1d::new(marks, y_sorted)?,
        });
        Ok(())
    }

    pub(crate) fn predict_raw(&self, am: &DesignMatrix) -> Result<Vec<f64>> {
        let fit = self
            .state
            .as_ref()
            .ok_or_else(|| Error::Validation("predict called before fit".to_string()))?;
        let an = self.reducer.reduce(am, &self.mass_bins, self.mrange)?;
        // both interpolators clamp, so out-of-range an pins to the first or
        // last training y
        Ok(an.iter().map(|&a| fit.mark_to_y.eval(fit.an_to_mark.eval(a))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reducer that just reads the first mass-bin column.
    #[derive(Debug)]
    struct FirstBin;

    impl AnReducer for FirstBin {
        fn reduce(&self, am: &DesignMatrix, _bins: &[f64], _mr: MassRange) -> Result<Vec<f64>> {
            Ok(am.column(0))
        }
    }

    fn mrange() -> MassRange {
        MassRange::new(0.1, 1.0).unwrap()
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let r = Box::new(FirstBin);
        assert!(Cam::new(2, vec![0.2, 0.5], mrange(), 0, r).is_err());
        let r = Box::new(FirstBin);
        assert!(Cam::new(3, vec![0.2, 0.5], mrange(), 1, r).is_err());
        let r = Box::new(FirstBin);
        assert!(Cam::new(2, vec![0.5, 0.2], mrange(), 1, r).is_err());
    }

    #[test]
    fn test_monotone_roundtrip_with_positive_order() {
        // an strictly increasing, y strictly increasing with it
        let an: Vec<f64> = (0..20).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = an.iter().map(|&a| 100.0 + 5.0 * a).collect();
        let x = DesignMatrix::from_column(an.clone()).unwrap();

        let mut cam = Cam::new(1, vec![0.5], mrange(), 1, Box::new(FirstBin)).unwrap();
        cam.fit_raw(&x, &y).unwrap();

        let pred = cam.predict_raw(&x).unwrap();
        for (p, t) in pred.iter().zip(&y) {
            assert!((p - t).abs() < 1e-9, "{} vs {}", p, t);
        }
    }

    #[test]
    fn test_clamps_outside_training_range() {
        let an: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = an.iter().map(|&a| 2.0 * a).collect();
        let x = DesignMatrix::from_column(an).unwrap();

        let mut cam = Cam::new(1, vec![0.5], mrange(), 1, Box::new(FirstBin)).unwrap();
        cam.fit_raw(&x, &y).unwrap();

        let probe = DesignMatrix::from_column(vec![-100.0, 100.0]).unwrap();
        let pred = cam.predict_raw(&probe).unwrap();
        assert_eq!(pred[0], 0.0, "below range clamps to the smallest y");
        assert_eq!(pred[1], 18.0, "above range clamps to the largest y");
    }

    #[test]
    fn test_negative_order_anticorrelates() {
        // an increasing but y should be matched in DESCENDING order
        let an: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..10).map(|i| i as f64 * 3.0).collect();
        let x = DesignMatrix::from_column(an).unwrap();

        let mut cam = Cam::new(1, vec![0.5], mrange(), -1, Box::new(FirstBin)).unwrap();
        cam.fit_raw(&x, &y).unwrap();

        let probe = DesignMatrix::from_column(vec![0.0, 9.0]).unwrap();
        let pred = cam.predict_raw(&probe).unwrap();
        assert_eq!(pred[0], 27.0, "smallest an maps to the largest y");
        assert_eq!(pred[1], 0.0, "largest an maps to the smallest y");
    }

    #[test]
    fn test_mass_bin_interpolator_reads_midpoint() {
        // a(m) rows linear in m: value at midpoint 0.55 of (0.1, 1.0)
        let bins = vec![0.1, 0.55, 1.0];
        let am = DesignMatrix::from_rows(vec![
            vec![0.0, 5.0, 10.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let an = MassBinInterpolator.reduce(&am, &bins, mrange()).unwrap();
        assert!((an[0] - 5.0).abs() < 1e-12);
        assert!((an[1] - 1.0).abs() < 1e-12);
    }
}
