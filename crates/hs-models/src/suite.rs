//! Training-suite orchestration.
//!
//! A suite maps run names to training entries (data + model name + feature
//! count + constructor options). The whole suite is validated BEFORE any
//! model is fitted; any mismatch aborts the call and no partial results are
//! returned.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use hs_core::{DesignMatrix, Error, MassRange, Predictor, Result};

use crate::cam::MassBinInterpolator;
use crate::model::Model;
use crate::transform::TransformKind;

/// Known model-variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Ordinary least squares.
    Linear,
    /// L1-regularized least squares.
    Lasso,
    /// Lognormal random-sample baseline.
    LogNormal,
    /// Multivariate-Gaussian conditional mean.
    Gaussian,
    /// Conditional abundance matching.
    Cam,
}

impl ModelKind {
    /// Resolve a suite-vocabulary name; unknown names are a configuration
    /// error.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "linear" => Ok(ModelKind::Linear),
            "lasso" => Ok(ModelKind::Lasso),
            "lognormal" => Ok(ModelKind::LogNormal),
            "gaussian" => Ok(ModelKind::Gaussian),
            "cam" => Ok(ModelKind::Cam),
            other => Err(Error::Config(format!("unknown model name `{}`", other))),
        }
    }
}

/// Constructor options for a suite entry. Fields irrelevant to the chosen
/// variant must be left unset; a set-but-unused option is a configuration
/// error, as is an unknown field in the JSON form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelOptions {
    /// LASSO regularization strength (default 0.1).
    pub alpha: Option<f64>,
    /// Quantile-transform x and y around fit/predict.
    pub use_qt: bool,
    /// Log-transform x and y around fit/predict.
    pub use_logs: bool,
    /// CAM sort order, `+1` or `-1` (default `-1`).
    pub cam_order: Option<i8>,
    /// CAM mass-bin grid, one bin per feature.
    pub mass_bins: Option<Vec<f64>>,
    /// CAM valid mass range `[lo, hi]`.
    pub mrange: Option<[f64; 2]>,
    /// RNG seed for the lognormal sampler.
    pub seed: Option<u64>,
}

/// One training run: data, model name, feature count, options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingEntry {
    /// Feature rows, one per halo.
    pub x: Vec<Vec<f64>>,
    /// Target values, one per halo.
    pub y: Vec<f64>,
    /// Model-variant name (see [`ModelKind::from_name`]).
    pub model: String,
    /// Expected feature count; must equal the column count of `x`.
    pub n_features: usize,
    /// Constructor options.
    #[serde(default)]
    pub options: ModelOptions,
}

fn reject_option(set: bool, option: &str, model: &str) -> Result<()> {
    if set {
        return Err(Error::Config(format!(
            "option `{}` is not valid for model `{}`",
            option, model
        )));
    }
    Ok(())
}

/// Instantiate an untrained model from a suite entry's name and options.
pub fn build_model(kind: ModelKind, n_features: usize, options: &ModelOptions) -> Result<Model> {
    let no_cam = |model: &str| -> Result<()> {
        reject_option(options.cam_order.is_some(), "cam_order", model)?;
        reject_option(options.mass_bins.is_some(), "mass_bins", model)?;
        reject_option(options.mrange.is_some(), "mrange", model)
    };
    match kind {
        ModelKind::Linear => {
            reject_option(options.alpha.is_some(), "alpha", "linear")?;
            reject_option(options.seed.is_some(), "seed", "linear")?;
            no_cam("linear")?;
            Model::linear(n_features, TransformKind::from_flags(options.use_qt, options.use_logs)?)
        }
        ModelKind::Lasso => {
            reject_option(options.seed.is_some(), "seed", "lasso")?;
            no_cam("lasso")?;
            let alpha = options.alpha.unwrap_or(0.1);
            Model::lasso(
                n_features,
                alpha,
                TransformKind::from_flags(options.use_qt, options.use_logs)?,
            )
        }
        ModelKind::LogNormal => {
            reject_option(options.alpha.is_some(), "alpha", "lognormal")?;
            reject_option(options.use_qt || options.use_logs, "use_qt/use_logs", "lognormal")?;
            no_cam("lognormal")?;
            Model::lognormal(n_features, options.seed)
        }
        ModelKind::Gaussian => {
            reject_option(options.alpha.is_some(), "alpha", "gaussian")?;
            reject_option(options.seed.is_some(), "seed", "gaussian")?;
            no_cam("gaussian")?;
            Model::gaussian(
                n_features,
                TransformKind::from_flags(options.use_qt, options.use_logs)?,
            )
        }
        ModelKind::Cam => {
            reject_option(options.alpha.is_some(), "alpha", "cam")?;
            reject_option(options.seed.is_some(), "seed", "cam")?;
            reject_option(options.use_qt || options.use_logs, "use_qt/use_logs", "cam")?;
            let mass_bins = options
                .mass_bins
                .clone()
                .ok_or_else(|| Error::Config("cam requires `mass_bins`".to_string()))?;
            let [lo, hi] = options
                .mrange
                .ok_or_else(|| Error::Config("cam requires `mrange`".to_string()))?;
            Model::cam(
                n_features,
                mass_bins,
                MassRange::new(lo, hi)?,
                options.cam_order.unwrap_or(-1),
                Box::new(MassBinInterpolator),
            )
        }
    }
}

fn entry_context(name: &str, err: Error) -> Error {
    match err {
        Error::Config(msg) => Error::Config(format!("entry `{}`: {}", name, msg)),
        Error::Validation(msg) => Error::Validation(format!("entry `{}`: {}", name, msg)),
        Error::Computation(msg) => Error::Computation(format!("entry `{}`: {}", name, msg)),
        other => other,
    }
}

/// Validate and fit every entry, returning the trained models keyed by run
/// name. Any malformed entry or failed fit aborts the whole suite.
pub fn training_suite(entries: IndexMap<String, TrainingEntry>) -> Result<IndexMap<String, Model>> {
    // validation pass: every entry must be well-formed before any fit runs
    let mut prepared = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        let kind = ModelKind::from_name(&entry.model).map_err(|e| entry_context(&name, e))?;
        let x = DesignMatrix::from_rows(entry.x).map_err(|e| entry_context(&name, e))?;
        if entry.n_features != x.ncols() {
            return Err(Error::Config(format!(
                "entry `{}`: n_features = {} but x has {} columns",
                name,
                entry.n_features,
                x.ncols()
            )));
        }
        let model =
            build_model(kind, entry.n_features, &entry.options).map_err(|e| entry_context(&name, e))?;
        prepared.push((name, model, x, entry.y));
    }

    let mut trained = IndexMap::with_capacity(prepared.len());
    for (name, mut model, x, y) in prepared {
        log::debug!("fitting suite entry `{}` ({})", name, model.kind_name());
        model.fit(&x, &y).map_err(|e| entry_context(&name, e))?;
        trained.insert(name, model);
    }
    Ok(trained)
}

/// Parse a suite description from JSON.
pub fn suite_from_json(json: &str) -> Result<IndexMap<String, TrainingEntry>> {
    Ok(serde_json::from_str(json)?)
}
