//! In-memory halo catalog table.
//!
//! One row per halo. A catalog owns a sorted, strictly-ascending integer
//! `id` column plus named `f64` columns of equal length. Row selection by
//! boolean mask produces a new catalog; sources are never mutated.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use hs_core::{Error, Result};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Table of halos indexable by column name.
///
/// Each catalog carries a process-unique identity token (`uid`) so parameter
/// caches can tell two catalogs apart even when they share a name.
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    uid: u64,
    ids: Vec<i64>,
    columns: IndexMap<String, Vec<f64>>,
}

impl Catalog {
    /// Build a catalog, validating that `ids` is strictly ascending and that
    /// every column matches its length.
    pub fn new(
        name: impl Into<String>,
        ids: Vec<i64>,
        columns: IndexMap<String, Vec<f64>>,
    ) -> Result<Self> {
        if ids.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Validation(
                "catalog id column must be strictly ascending".to_string(),
            ));
        }
        let n = ids.len();
        for (key, col) in &columns {
            if col.len() != n {
                return Err(Error::Validation(format!(
                    "column `{}` has {} rows, expected {}",
                    key,
                    col.len(),
                    n
                )));
            }
        }
        Ok(Self { name: name.into(), uid: NEXT_UID.fetch_add(1, Ordering::Relaxed), ids, columns })
    }

    /// Catalog name (e.g. the simulation it came from, or a filter name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process-unique identity token.
    #[inline]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Number of halos.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the catalog has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The sorted halo id column.
    #[inline]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Whether a named column exists.
    pub fn has_column(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    /// Borrow a named column.
    pub fn column(&self, key: &str) -> Result<&[f64]> {
        self.columns
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Validation(format!("catalog `{}` has no column `{}`", self.name, key)))
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Select rows where `mask` is true, preserving order.
    ///
    /// The result is a fresh catalog with its own identity token.
    pub fn select(&self, mask: &[bool]) -> Result<Catalog> {
        if mask.len() != self.len() {
            return Err(Error::Validation(format!(
                "mask has {} entries, catalog has {} rows",
                mask.len(),
                self.len()
            )));
        }
        let ids = self
            .ids
            .iter()
            .zip(mask)
            .filter(|(_, &keep)| keep)
            .map(|(&id, _)| id)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|(key, col)| {
                let kept = col
                    .iter()
                    .zip(mask)
                    .filter(|(_, &keep)| keep)
                    .map(|(&v, _)| v)
                    .collect();
                (key.clone(), kept)
            })
            .collect();
        Catalog::new(self.name.clone(), ids, columns)
    }

    /// Copy of this catalog under a new name (and fresh identity token).
    pub fn renamed(&self, name: impl Into<String>) -> Catalog {
        let mut out = self.clone();
        out.name = name.into();
        out.uid = NEXT_UID.fetch_add(1, Ordering::Relaxed);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cat() -> Catalog {
        let mut cols = IndexMap::new();
        cols.insert("mvir".to_string(), vec![1e12, 3e11, 8e13]);
        cols.insert("upid".to_string(), vec![-1.0, 42.0, -1.0]);
        Catalog::new("test", vec![1, 5, 9], cols).unwrap()
    }

    #[test]
    fn test_rejects_unsorted_ids() {
        let err = Catalog::new("bad", vec![3, 1, 2], IndexMap::new());
        assert!(err.is_err());
        // duplicates are also rejected
        let err = Catalog::new("bad", vec![1, 1, 2], IndexMap::new());
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_mismatched_column_length() {
        let mut cols = IndexMap::new();
        cols.insert("mvir".to_string(), vec![1.0]);
        assert!(Catalog::new("bad", vec![1, 2], cols).is_err());
    }

    #[test]
    fn test_select_preserves_order_and_gets_new_uid() {
        let cat = small_cat();
        let sub = cat.select(&[true, false, true]).unwrap();
        assert_eq!(sub.ids(), &[1, 9]);
        assert_eq!(sub.column("mvir").unwrap(), &[1e12, 8e13]);
        assert_ne!(sub.uid(), cat.uid());
        // source untouched
        assert_eq!(cat.len(), 3);
    }

    #[test]
    fn test_unknown_column_errors() {
        let cat = small_cat();
        assert!(cat.column("rvir").is_err());
    }
}
