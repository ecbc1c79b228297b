//! # hs-catalog
//!
//! Halo catalog handling for halostat:
//! - the in-memory [`Catalog`] table (sorted ids + named columns),
//! - the canonical [`ParamRegistry`] of direct and derived parameters,
//! - named physical [`Filter`]s (mass cuts, relaxedness criteria,
//!   host/subhalo selection, id intersection).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod filters;
pub mod params;

pub use catalog::Catalog;
pub use filters::{
    bound_filter, catalog_mass_filter, default_filters, id_filter, intersect,
    particle_mass_filter, relaxedness_filter, Filter, Predicate,
};
pub use params::{Derivation, HaloParam, ParamRegistry, ParamSpec};
