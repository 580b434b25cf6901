// src/table/index.rs

use super::Scalar;
use crate::error::{Result, TableError};

/// A (possibly multi-level) row or column index.
///
/// Each entry is a tuple with exactly one key per level. Level names are
/// optional because several on-disk formats only preserve levels by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiIndex {
    names: Vec<Option<String>>,
    tuples: Vec<Vec<Scalar>>,
}

impl MultiIndex {
    /// Build an index, checking every tuple against the level count.
    pub fn new(names: Vec<Option<String>>, tuples: Vec<Vec<Scalar>>) -> Result<Self> {
        let index = Self { names, tuples };
        index.check_consistency()?;
        Ok(index)
    }

    /// Unnamed index built from tuples; the level count is taken from the
    /// first tuple (one level when empty).
    pub fn from_tuples(tuples: Vec<Vec<Scalar>>) -> Result<Self> {
        let nlevels = tuples.first().map_or(1, Vec::len);
        Self::new(vec![None; nlevels], tuples)
    }

    /// Single-level unnamed index.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        Self {
            names: vec![None],
            tuples: keys.into_iter().map(|k| vec![k.into()]).collect(),
        }
    }

    /// Index with no entries and the given level names.
    pub fn empty(names: Vec<Option<String>>) -> Self {
        Self {
            names,
            tuples: Vec::new(),
        }
    }

    /// Skips consistency checks; pair with [`MultiIndex::check_consistency`].
    pub(crate) fn from_raw_parts(names: Vec<Option<String>>, tuples: Vec<Vec<Scalar>>) -> Self {
        Self { names, tuples }
    }

    pub fn nlevels(&self) -> usize {
        self.names.len()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    /// Replace the level names. The count must match the current level count.
    pub fn set_names(&mut self, names: Vec<Option<String>>) -> Result<()> {
        if names.len() != self.nlevels() {
            return Err(TableError::Shape(format!(
                "cannot set {} level name(s) on an index with {} level(s)",
                names.len(),
                self.nlevels()
            )));
        }
        self.names = names;
        Ok(())
    }

    pub fn tuples(&self) -> &[Vec<Scalar>] {
        &self.tuples
    }

    pub fn get(&self, i: usize) -> Option<&[Scalar]> {
        self.tuples.get(i).map(Vec::as_slice)
    }

    pub fn position(&self, key: &[Scalar]) -> Option<usize> {
        self.tuples.iter().position(|t| t.as_slice() == key)
    }

    pub fn push(&mut self, key: Vec<Scalar>) -> Result<()> {
        if key.len() != self.nlevels() {
            return Err(TableError::Shape(format!(
                "key {:?} has {} level(s), index has {}",
                key,
                key.len(),
                self.nlevels()
            )));
        }
        self.tuples.push(key);
        Ok(())
    }

    /// All keys of one level, in index order.
    pub fn level_values(&self, level: usize) -> Vec<Scalar> {
        self.tuples
            .iter()
            .filter_map(|t| t.get(level).cloned())
            .collect()
    }

    /// Stable argsort by the full key tuple.
    pub fn sort_permutation(&self) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..self.tuples.len()).collect();
        perm.sort_by(|&a, &b| self.tuples[a].cmp(&self.tuples[b]));
        perm
    }

    /// Reorder entries by `perm` (as returned by `sort_permutation`).
    pub fn take(&self, perm: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            tuples: perm.iter().map(|&i| self.tuples[i].clone()).collect(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.tuples.windows(2).all(|w| w[0] <= w[1])
    }

    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(TableError::NotATable("index has no levels".into()));
        }
        if let Some((i, t)) = self
            .tuples
            .iter()
            .enumerate()
            .find(|(_, t)| t.len() != self.names.len())
        {
            return Err(TableError::NotATable(format!(
                "index entry {} has {} key(s) but the index has {} level(s)",
                i,
                t.len(),
                self.names.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_permutation_is_stable() {
        let idx = MultiIndex::from_tuples(vec![
            vec![Scalar::from("b"), Scalar::Int(1)],
            vec![Scalar::from("a"), Scalar::Int(2)],
            vec![Scalar::from("a"), Scalar::Int(1)],
        ])
        .unwrap();
        assert_eq!(idx.sort_permutation(), vec![2, 1, 0]);
        assert!(idx.take(&idx.sort_permutation()).is_sorted());
    }

    #[test]
    fn test_ragged_tuples_rejected() {
        let err = MultiIndex::new(
            vec![Some("a".into()), Some("b".into())],
            vec![vec![Scalar::Int(1)]],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::NotATable(_)));
    }

    #[test]
    fn test_set_names_count_must_match() {
        let mut idx = MultiIndex::from_keys([1, 2, 3]);
        assert!(idx.set_names(vec![Some("frame".into())]).is_ok());
        assert!(idx
            .set_names(vec![Some("a".into()), Some("b".into())])
            .is_err());
        assert_eq!(idx.names(), &[Some("frame".to_string())]);
    }
}
