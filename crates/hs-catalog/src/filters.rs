//! Named physical filters over halo catalogs.
//!
//! A [`Filter`] is a named conjunction of (parameter key, predicate) pairs.
//! Applying it evaluates every predicate on the parameter's REAL-SPACE
//! values (never log space, regardless of how the parameter will later be
//! displayed) and keeps the rows where all predicates hold, producing a new
//! catalog with rows in their original order.

use indexmap::IndexMap;

use hs_core::{Error, Result, Scale};

use crate::catalog::Catalog;
use crate::params::{HaloParam, ParamRegistry};

/// Mask of `ids1` against `ids2`: `mask[i]` is true iff `ids1[i]` is present
/// in `ids2`, found by binary search rather than a hash-set intersection.
///
/// Both inputs must be sorted ascending; this is checked and reported as a
/// validation error. The operation is asymmetric: it answers "is this id
/// present in the other set", not a full set intersection.
pub fn intersect(ids1: &[i64], ids2: &[i64]) -> Result<Vec<bool>> {
    if ids1.windows(2).any(|w| w[0] > w[1]) || ids2.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::Validation("id arrays must be sorted ascending".to_string()));
    }
    Ok(ids1.iter().map(|id| ids2.binary_search(id).is_ok()).collect())
}

/// Boolean predicate over one parameter's values.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Row id is present in the given sorted id set (only valid on `id`).
    MemberOf(Vec<i64>),
    /// Value lies strictly between `low` and `high`, compared in `scale`.
    Between {
        /// Lower bound (exclusive).
        low: f64,
        /// Upper bound (exclusive).
        high: f64,
        /// Comparison scale.
        scale: Scale,
    },
    /// Value is strictly below `bound`, compared in `scale`.
    Below {
        /// Bound (exclusive).
        bound: f64,
        /// Comparison scale.
        scale: Scale,
    },
    /// Value is strictly above `bound`, compared in `scale`.
    Above {
        /// Bound (exclusive).
        bound: f64,
        /// Comparison scale.
        scale: Scale,
    },
    /// Value is greater than or equal to the threshold.
    AtLeast(f64),
    /// Value equals the target exactly (integer-valued columns like `upid`).
    EqualTo(f64),
}

impl Predicate {
    /// Evaluate against a real-space value array.
    ///
    /// [`Predicate::MemberOf`] is handled separately by [`Filter::apply`]
    /// and is rejected here.
    pub fn mask(&self, values: &[f64]) -> Result<Vec<bool>> {
        match self {
            Predicate::MemberOf(_) => Err(Error::Validation(
                "id membership predicate applies only to the `id` column".to_string(),
            )),
            Predicate::Between { low, high, scale } => Ok(values
                .iter()
                .map(|&v| {
                    let s = scale.apply(v);
                    s > *low && s < *high
                })
                .collect()),
            Predicate::Below { bound, scale } => {
                Ok(values.iter().map(|&v| scale.apply(v) < *bound).collect())
            }
            Predicate::Above { bound, scale } => {
                Ok(values.iter().map(|&v| scale.apply(v) > *bound).collect())
            }
            Predicate::AtLeast(t) => Ok(values.iter().map(|&v| v >= *t).collect()),
            Predicate::EqualTo(t) => Ok(values.iter().map(|&v| v == *t).collect()),
        }
    }
}

/// Named conjunction of per-parameter predicates.
#[derive(Debug, Clone)]
pub struct Filter {
    name: String,
    predicates: IndexMap<String, Predicate>,
}

impl Filter {
    /// Build a filter from (key, predicate) pairs.
    pub fn new(
        name: impl Into<String>,
        predicates: impl IntoIterator<Item = (String, Predicate)>,
    ) -> Self {
        Self { name: name.into(), predicates: predicates.into_iter().collect() }
    }

    /// Filter name; becomes the name of filtered catalogs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter keys this filter constrains.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    /// Merge another filter's predicates into this one (later keys win),
    /// keeping this filter's name.
    pub fn and(mut self, other: Filter) -> Filter {
        for (key, pred) in other.predicates {
            self.predicates.insert(key, pred);
        }
        self
    }

    /// Rename the filter.
    pub fn with_name(mut self, name: impl Into<String>) -> Filter {
        self.name = name.into();
        self
    }

    /// Apply conjunctively to `cat`, resolving parameter values through
    /// `registry` in real (non-log) space. Returns a new filtered catalog
    /// named after this filter; the source is untouched.
    pub fn apply(&self, cat: &Catalog, registry: &ParamRegistry) -> Result<Catalog> {
        let mut keep = vec![true; cat.len()];
        for (key, pred) in &self.predicates {
            let mask = if key == "id" {
                match pred {
                    Predicate::MemberOf(ids) => intersect(cat.ids(), ids)?,
                    _ => {
                        return Err(Error::Validation(
                            "only id membership predicates may target `id`".to_string(),
                        ))
                    }
                }
            } else {
                let hparam = HaloParam::new(registry, key, false)?;
                pred.mask(&hparam.evaluate(cat)?)?
            };
            for (k, m) in keep.iter_mut().zip(mask) {
                *k &= m;
            }
        }
        Ok(cat.select(&keep)?.renamed(&self.name))
    }
}

/// Keep rows whose id appears in `ids` (must be sorted ascending).
pub fn id_filter(ids: Vec<i64>) -> Filter {
    Filter::new("id_filtered", [("id".to_string(), Predicate::MemberOf(ids))])
}

/// Keep rows where `key` lies strictly inside `(low, high)`, optionally
/// compared in log10 space.
pub fn bound_filter(key: &str, low: f64, high: f64, scale: Scale) -> Filter {
    Filter::new(
        format!("{}_bounded", key),
        [(key.to_string(), Predicate::Between { low, high, scale })],
    )
}

/// Resolution cut: keep halos with more than 1000 particles, i.e.
/// `log10(mvir) > log10(1000 * particle_mass)`.
///
/// Warns when applied to subhalos, where the same cut as for host halos is
/// used.
pub fn particle_mass_filter(particle_mass: f64, subhalos: bool) -> Filter {
    if subhalos {
        log::warn!("making the same particle-mass cut in subhalos as in host halos");
    }
    let bound = (particle_mass * 1e3).log10();
    Filter::new(
        "particle_mass_cut",
        [("mvir".to_string(), Predicate::Above { bound, scale: Scale::Log10 })],
    )
}

/// Per-simulation upper mass cut. Bolshoi and BolshoiP undersample halos
/// above `log10(mvir) ~ 13.75`; other catalogs are not configured.
pub fn catalog_mass_filter(catalog_name: &str) -> Result<Filter> {
    match catalog_name {
        "Bolshoi" | "BolshoiP" => Ok(Filter::new(
            "catalog_mass_cut",
            [("mvir".to_string(), Predicate::Below { bound: 13.75, scale: Scale::Log10 })],
        )),
        other => Err(Error::Config(format!(
            "no mass ceiling configured for catalog `{}`",
            other
        ))),
    }
}

/// Named relaxedness criteria.
///
/// - `"power2011"`: `x0 < 0.04`
/// - `"neto2007"`: `f_sub < 0.1` and `x0 < 0.07` and `eta < 1.35`
pub fn relaxedness_filter(name: &str) -> Result<Filter> {
    match name {
        "power2011" => Ok(Filter::new(
            "power2011",
            [("x0".to_string(), Predicate::Below { bound: 0.04, scale: Scale::Linear })],
        )),
        "neto2007" => Ok(Filter::new(
            "neto2007",
            [
                ("f_sub".to_string(), Predicate::Below { bound: 0.1, scale: Scale::Linear }),
                ("x0".to_string(), Predicate::Below { bound: 0.07, scale: Scale::Linear }),
                ("eta".to_string(), Predicate::Below { bound: 1.35, scale: Scale::Linear }),
            ],
        )),
        other => Err(Error::Config(format!("unknown relaxedness criteria `{}`", other))),
    }
}

/// Default selection: the particle-mass cut merged with the host/subhalo
/// selector. `upid == -1` marks distinct (host) halos, `upid >= 0` marks
/// subhalos; exactly one of the two is kept, chosen by `subhalos`.
pub fn default_filters(particle_mass: f64, subhalos: bool) -> Filter {
    let upid = if subhalos { Predicate::AtLeast(0.0) } else { Predicate::EqualTo(-1.0) };
    particle_mass_filter(particle_mass, subhalos)
        .and(Filter::new("", [("upid".to_string(), upid)]))
        .with_name(if subhalos { "default_subhalos" } else { "default_hosts" })
}
