//! Parameter registry and bound halo parameters.
//!
//! A [`ParamSpec`] maps a key to its derivation rule (or none for a direct
//! column read), physical units, and display label. The registry is built
//! once via [`ParamRegistry::standard`] and passed explicitly to consumers;
//! there is no module-level mutable state.
//!
//! Conventions: one canonical registry with lowercase snake keys, and base-10
//! logarithms for the log flag on [`HaloParam`].

use crate::catalog::Catalog;
use hs_core::{Error, Result};
use indexmap::IndexMap;

/// Closed set of derived-quantity formulas.
///
/// Each variant is a pure, vectorized function of catalog columns; a missing
/// input column is a validation error naming the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// NFW concentration: `rvir / rs`.
    Concentration,
    /// Dynamical time: `sqrt(2) * rvir / vrms`.
    DynamicalTime,
    /// Mean axis ratio: `(b_to_a + c_to_a) / 2`.
    MeanAxisRatio,
    /// Relative centre-of-mass offset: `xoff / rvir`.
    OffsetFraction,
    /// Relative velocity offset: `voff / vrms`.
    VelocityOffsetFraction,
    /// Virial ratio: `2 * T/|U|`.
    VirialEta,
    /// Angle between the major axis A and the angular momentum J.
    SpinOrbitAngle,
}

impl Derivation {
    /// Evaluate the formula over all rows of `cat`.
    pub fn apply(&self, cat: &Catalog) -> Result<Vec<f64>> {
        match self {
            Derivation::Concentration => {
                let rvir = cat.column("rvir")?;
                let rs = cat.column("rs")?;
                Ok(rvir.iter().zip(rs).map(|(&r, &s)| r / s).collect())
            }
            Derivation::DynamicalTime => {
                let rvir = cat.column("rvir")?;
                let vrms = cat.column("vrms")?;
                Ok(rvir.iter().zip(vrms).map(|(&r, &v)| std::f64::consts::SQRT_2 * r / v).collect())
            }
            Derivation::MeanAxisRatio => {
                let b = cat.column("b_to_a")?;
                let c = cat.column("c_to_a")?;
                Ok(b.iter().zip(c).map(|(&b, &c)| 0.5 * (b + c)).collect())
            }
            Derivation::OffsetFraction => {
                let xoff = cat.column("xoff")?;
                let rvir = cat.column("rvir")?;
                Ok(xoff.iter().zip(rvir).map(|(&x, &r)| x / r).collect())
            }
            Derivation::VelocityOffsetFraction => {
                let voff = cat.column("voff")?;
                let vrms = cat.column("vrms")?;
                Ok(voff.iter().zip(vrms).map(|(&v, &s)| v / s).collect())
            }
            Derivation::VirialEta => {
                let tu = cat.column("t_u")?;
                Ok(tu.iter().map(|&t| 2.0 * t).collect())
            }
            Derivation::SpinOrbitAngle => {
                let (ax, ay, az) = (cat.column("ax")?, cat.column("ay")?, cat.column("az")?);
                let (jx, jy, jz) = (cat.column("jx")?, cat.column("jy")?, cat.column("jz")?);
                let mut out = Vec::with_capacity(cat.len());
                for i in 0..cat.len() {
                    let dot = ax[i] * jx[i] + ay[i] * jy[i] + az[i] * jz[i];
                    let na = (ax[i] * ax[i] + ay[i] * ay[i] + az[i] * az[i]).sqrt();
                    let nj = (jx[i] * jx[i] + jy[i] * jy[i] + jz[i] * jz[i]).sqrt();
                    // clamp against fp noise pushing |cos| past 1
                    out.push((dot / (na * nj)).clamp(-1.0, 1.0).acos());
                }
                Ok(out)
            }
        }
    }
}

/// Immutable parameter descriptor: key, derivation rule, units, display label.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Canonical lowercase key.
    pub key: String,
    /// Derivation rule; `None` means the catalog column is read directly.
    pub derive: Option<Derivation>,
    /// Physical units, TeX-formatted (empty for dimensionless quantities).
    pub units: String,
    /// TeX display label.
    pub label: String,
}

/// Lookup table from parameter key to descriptor.
#[derive(Debug, Clone)]
pub struct ParamRegistry {
    specs: IndexMap<String, ParamSpec>,
}

impl ParamRegistry {
    /// The canonical parameter table.
    pub fn standard() -> Self {
        let mut specs = IndexMap::new();
        let mut direct = |key: &str, units: &str, label: &str| {
            specs.insert(
                key.to_string(),
                ParamSpec {
                    key: key.to_string(),
                    derive: None,
                    units: units.to_string(),
                    label: label.to_string(),
                },
            );
        };

        // fundamental catalog columns
        direct("upid", "", "\\rm upid");
        direct("mvir", "h^{-1} \\, M_{\\odot}", "M_{\\rm vir}");
        direct("rvir", "h^{-1} \\, kpc", "R_{\\rm vir}");
        direct("rs", "h^{-1} \\, kpc", "R_{s}");
        direct("xoff", "h^{-1} \\, kpc", "X_{\\rm off}");
        direct("voff", "km \\, s^{-1}", "V_{\\rm off}");
        direct("vrms", "km \\, s^{-1}", "V_{\\rm rms}");
        direct("spin", "", "\\lambda");
        direct("t_u", "", "T/|U|");
        direct("f_sub", "", "f_{\\rm sub}");
        direct("scale_of_last_mm", "", "\\delta_{\\rm MM}");
        direct("b_to_a", "", "b/a");
        direct("c_to_a", "", "c/a");
        direct("ax", "", "A_x");
        direct("ay", "", "A_y");
        direct("az", "", "A_z");
        direct("jx", "", "J_x");
        direct("jy", "", "J_y");
        direct("jz", "", "J_z");
        direct("acc_rate_inst", "h^{-1} \\, yr^{-1} \\, M_{\\odot}", "\\alpha_{\\rm inst}");
        direct("acc_rate_tdyn", "h^{-1} \\, yr^{-1} \\, M_{\\odot}", "\\alpha_{\\tau_{\\rm dyn}}");

        let mut derived = |key: &str, rule: Derivation, units: &str, label: &str| {
            specs.insert(
                key.to_string(),
                ParamSpec {
                    key: key.to_string(),
                    derive: Some(rule),
                    units: units.to_string(),
                    label: label.to_string(),
                },
            );
        };

        derived("cvir", Derivation::Concentration, "", "c_{\\rm vir}");
        derived("tdyn", Derivation::DynamicalTime, "h^{-1} \\, kpc \\, km^{-1} \\, s", "\\tau_{\\rm dyn}");
        derived("q", Derivation::MeanAxisRatio, "", "q");
        derived("x0", Derivation::OffsetFraction, "", "x_{\\rm off}");
        derived("v0", Derivation::VelocityOffsetFraction, "", "v_{\\rm off}");
        derived("eta", Derivation::VirialEta, "", "\\eta");
        derived("phi_l", Derivation::SpinOrbitAngle, "", "\\Phi_{l}");

        Self { specs }
    }

    /// Look up a descriptor; unknown keys are a configuration error.
    pub fn get(&self, key: &str) -> Result<&ParamSpec> {
        self.specs
            .get(key)
            .ok_or_else(|| Error::Config(format!("unknown parameter key `{}`", key)))
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.specs.contains_key(key)
    }

    /// Registered keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}

/// A parameter descriptor bound to a log flag, with a per-catalog value cache.
///
/// The cache is keyed by the catalog's identity token: evaluating against a
/// different catalog recomputes instead of returning a stale array.
#[derive(Debug, Clone)]
pub struct HaloParam {
    spec: ParamSpec,
    log: bool,
    cache: Option<(u64, Vec<f64>)>,
}

impl HaloParam {
    /// Resolve `key` in `registry` and bind the log flag.
    pub fn new(registry: &ParamRegistry, key: &str, log: bool) -> Result<Self> {
        Ok(Self { spec: registry.get(key)?.clone(), log, cache: None })
    }

    /// The bound descriptor.
    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    /// Whether values are returned in log10 space.
    pub fn is_log(&self) -> bool {
        self.log
    }

    /// Evaluate against `cat` without touching the cache.
    pub fn evaluate(&self, cat: &Catalog) -> Result<Vec<f64>> {
        let values = match self.spec.derive {
            None => cat.column(&self.spec.key)?.to_vec(),
            Some(rule) => rule.apply(cat)?,
        };
        if self.log {
            if values.iter().any(|&v| v <= 0.0) {
                return Err(Error::Computation(format!(
                    "cannot take log10 of non-positive `{}` values",
                    self.spec.key
                )));
            }
            Ok(values.into_iter().map(f64::log10).collect())
        } else {
            Ok(values)
        }
    }

    /// Evaluate against `cat`, memoized per catalog identity.
    pub fn values(&mut self, cat: &Catalog) -> Result<&[f64]> {
        let hit = matches!(&self.cache, Some((uid, _)) if *uid == cat.uid());
        if !hit {
            let values = self.evaluate(cat)?;
            self.cache = Some((cat.uid(), values));
        }
        Ok(&self.cache.as_ref().unwrap().1)
    }

    /// Display text for plot axes: log indicator plus units.
    pub fn text(&self) -> String {
        if self.log {
            format!("$\\log_{{10}}({})$", self.spec.label)
        } else if self.spec.units.is_empty() {
            format!("${}$", self.spec.label)
        } else {
            format!("${} \\; [{}]$", self.spec.label, self.spec.units)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn cat_with(cols: &[(&str, Vec<f64>)]) -> Catalog {
        let n = cols[0].1.len();
        let ids = (0..n as i64).collect();
        let columns: IndexMap<String, Vec<f64>> =
            cols.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Catalog::new("test", ids, columns).unwrap()
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let reg = ParamRegistry::standard();
        let err = reg.get("Mvir").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "keys are case-sensitive: {}", err);
    }

    #[test]
    fn test_direct_and_derived_values() {
        let reg = ParamRegistry::standard();
        let cat = cat_with(&[
            ("rvir", vec![200.0, 300.0]),
            ("rs", vec![20.0, 50.0]),
        ]);

        let mut rvir = HaloParam::new(&reg, "rvir", false).unwrap();
        assert_eq!(rvir.values(&cat).unwrap(), &[200.0, 300.0]);

        let mut cvir = HaloParam::new(&reg, "cvir", false).unwrap();
        assert_eq!(cvir.values(&cat).unwrap(), &[10.0, 6.0]);
    }

    #[test]
    fn test_log_is_base_10() {
        let reg = ParamRegistry::standard();
        let cat = cat_with(&[("mvir", vec![1e12, 1e10])]);
        let mut p = HaloParam::new(&reg, "mvir", true).unwrap();
        let v = p.values(&cat).unwrap();
        assert!((v[0] - 12.0).abs() < 1e-12);
        assert!((v[1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_of_non_positive_fails() {
        let reg = ParamRegistry::standard();
        let cat = cat_with(&[("mvir", vec![1e12, -1.0])]);
        let mut p = HaloParam::new(&reg, "mvir", true).unwrap();
        assert!(matches!(p.values(&cat), Err(Error::Computation(_))));
    }

    #[test]
    fn test_cache_recomputes_for_different_catalog() {
        let reg = ParamRegistry::standard();
        let a = cat_with(&[("mvir", vec![1.0, 2.0])]);
        let b = cat_with(&[("mvir", vec![5.0, 6.0])]);

        let mut p = HaloParam::new(&reg, "mvir", false).unwrap();
        assert_eq!(p.values(&a).unwrap(), &[1.0, 2.0]);
        // rebinding to a different catalog must not return the stale array
        assert_eq!(p.values(&b).unwrap(), &[5.0, 6.0]);
        assert_eq!(p.values(&a).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_derivation_missing_column_names_it() {
        let reg = ParamRegistry::standard();
        let cat = cat_with(&[("rvir", vec![200.0])]);
        let p = HaloParam::new(&reg, "cvir", false).unwrap();
        let err = p.evaluate(&cat).unwrap_err();
        assert!(err.to_string().contains("rs"), "error should name the column: {}", err);
    }

    #[test]
    fn test_display_text() {
        let reg = ParamRegistry::standard();
        let log_m = HaloParam::new(&reg, "mvir", true).unwrap();
        assert_eq!(log_m.text(), "$\\log_{10}(M_{\\rm vir})$");
        let raw_m = HaloParam::new(&reg, "mvir", false).unwrap();
        assert!(raw_m.text().contains("M_{\\odot}"));
        let spin = HaloParam::new(&reg, "spin", false).unwrap();
        assert_eq!(spin.text(), "$\\lambda$");
    }
}
