// src/table/mod.rs

pub mod index;
pub mod scalar;

pub use index::MultiIndex;
pub use scalar::Scalar;

use crate::error::{Result, TableError};

/// Two-dimensional table with a multi-level row index and a multi-level
/// column index. Cells are stored column-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    index: MultiIndex,
    columns: MultiIndex,
    data: Vec<Vec<Scalar>>,
}

impl Table {
    /// Checked construction.
    pub fn new(index: MultiIndex, columns: MultiIndex, data: Vec<Vec<Scalar>>) -> Result<Self> {
        let table = Self::from_raw_parts(index, columns, data);
        table.check_consistency()?;
        Ok(table)
    }

    /// Unchecked construction for values that are about to be validated.
    pub fn from_raw_parts(index: MultiIndex, columns: MultiIndex, data: Vec<Vec<Scalar>>) -> Self {
        Self {
            index,
            columns,
            data,
        }
    }

    /// Table with the given row index and no columns.
    pub fn with_index(index: MultiIndex, column_names: Vec<Option<String>>) -> Self {
        Self {
            index,
            columns: MultiIndex::empty(column_names),
            data: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn index(&self) -> &MultiIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut MultiIndex {
        &mut self.index
    }

    pub fn columns(&self) -> &MultiIndex {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut MultiIndex {
        &mut self.columns
    }

    pub fn data(&self) -> &[Vec<Scalar>] {
        &self.data
    }

    pub fn into_parts(self) -> (MultiIndex, MultiIndex, Vec<Vec<Scalar>>) {
        (self.index, self.columns, self.data)
    }

    /// Values of the column labelled `key`.
    pub fn column(&self, key: &[Scalar]) -> Option<&[Scalar]> {
        self.columns
            .position(key)
            .map(|j| self.data[j].as_slice())
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Scalar> {
        self.data.get(col).and_then(|c| c.get(row))
    }

    /// Assign a column, replacing it when `key` already exists.
    pub fn insert_column<K, V>(&mut self, key: K, values: Vec<V>) -> Result<()>
    where
        K: IntoIterator,
        K::Item: Into<Scalar>,
        V: Into<Scalar>,
    {
        let key: Vec<Scalar> = key.into_iter().map(Into::into).collect();
        if values.len() != self.nrows() {
            return Err(TableError::Shape(format!(
                "column {:?} has {} value(s), table has {} row(s)",
                key,
                values.len(),
                self.nrows()
            )));
        }
        let values: Vec<Scalar> = values.into_iter().map(Into::into).collect();
        match self.columns.position(&key) {
            Some(j) => self.data[j] = values,
            None => {
                self.columns.push(key)?;
                self.data.push(values);
            }
        }
        Ok(())
    }

    /// `(row, column)` of every missing cell, column by column.
    pub fn missing_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.data.iter().enumerate().flat_map(|(j, col)| {
            col.iter()
                .enumerate()
                .filter(|(_, v)| v.is_missing())
                .map(move |(i, _)| (i, j))
        })
    }

    pub fn missing_count(&self) -> usize {
        self.missing_positions().count()
    }

    pub fn has_missing(&self) -> bool {
        self.missing_positions().next().is_some()
    }

    /// Stable sort of rows by their full index tuple.
    pub fn sort_rows(&mut self) {
        if self.index.is_sorted() {
            return;
        }
        let perm = self.index.sort_permutation();
        self.index = self.index.take(&perm);
        for col in &mut self.data {
            *col = perm.iter().map(|&i| col[i].clone()).collect();
        }
    }

    /// Stable sort of columns by their full label tuple.
    pub fn sort_columns(&mut self) {
        if self.columns.is_sorted() {
            return;
        }
        let perm = self.columns.sort_permutation();
        self.columns = self.columns.take(&perm);
        let mut old: Vec<Option<Vec<Scalar>>> = self.data.drain(..).map(Some).collect();
        self.data = perm
            .iter()
            .map(|&j| old[j].take().unwrap_or_default())
            .collect();
    }

    /// Structural check: both indexes well formed and the cell grid matches them.
    pub fn check_consistency(&self) -> Result<()> {
        self.index.check_consistency()?;
        self.columns.check_consistency()?;
        if self.data.len() != self.columns.len() {
            return Err(TableError::NotATable(format!(
                "{} data column(s) but {} column label(s)",
                self.data.len(),
                self.columns.len()
            )));
        }
        if let Some((j, col)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != self.index.len())
        {
            return Err(TableError::NotATable(format!(
                "column {} has {} value(s) but the index has {} row(s)",
                j,
                col.len(),
                self.index.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let index = MultiIndex::from_keys([30, 10, 20]);
        let columns = MultiIndex::from_keys(["y", "x"]);
        Table::new(
            index,
            columns,
            vec![
                vec![Scalar::Int(3), Scalar::Int(1), Scalar::Int(2)],
                vec![Scalar::from("c"), Scalar::from("a"), Scalar::from("b")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sort_rows_moves_cells() {
        let mut t = sample();
        t.sort_rows();
        assert_eq!(
            t.index().level_values(0),
            vec![Scalar::Int(10), Scalar::Int(20), Scalar::Int(30)]
        );
        assert_eq!(
            t.column(&[Scalar::from("y")]).unwrap(),
            &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]
        );
    }

    #[test]
    fn test_sort_columns_moves_data() {
        let mut t = sample();
        t.sort_columns();
        assert_eq!(
            t.columns().level_values(0),
            vec![Scalar::from("x"), Scalar::from("y")]
        );
        assert_eq!(t.cell(0, 0), Some(&Scalar::from("c")));
    }

    #[test]
    fn test_insert_column_replaces_and_appends() {
        let mut t = sample();
        t.insert_column(["z"], vec![0.5, 1.5, 2.5]).unwrap();
        assert_eq!(t.ncols(), 3);
        t.insert_column(["z"], vec![1, 1, 1]).unwrap();
        assert_eq!(t.ncols(), 3);
        assert_eq!(t.column(&[Scalar::from("z")]).unwrap()[0], Scalar::Int(1));
        assert!(t.insert_column(["w"], vec![1]).is_err());
    }

    #[test]
    fn test_inconsistent_grid_is_not_a_table() {
        let t = Table::from_raw_parts(
            MultiIndex::from_keys([1, 2]),
            MultiIndex::from_keys(["a"]),
            vec![vec![Scalar::Int(1)]],
        );
        assert!(matches!(t.check_consistency(), Err(TableError::NotATable(_))));
    }

    #[test]
    fn test_missing_positions() {
        let t = Table::new(
            MultiIndex::from_keys([1, 2]),
            MultiIndex::from_keys(["a", "b"]),
            vec![
                vec![Scalar::Int(1), Scalar::Int(2)],
                vec![Scalar::Float(f64::NAN), Scalar::Null],
            ],
        )
        .unwrap();
        assert_eq!(t.missing_positions().collect::<Vec<_>>(), vec![(0, 1), (1, 1)]);
        assert_eq!(t.missing_count(), 2);
    }
}
