// src/schema/skeleton.rs

use tracing::debug;

use super::{validate::normalize, TableSchema};
use crate::error::{Result, TableError};
use crate::table::{MultiIndex, Scalar, Table};

/// Where a skeleton's row keys come from.
#[derive(Debug, Clone)]
pub enum RowSource {
    /// One key per row, single level.
    Keys(Vec<Scalar>),
    /// One tuple per row, one key per level.
    Tuples(Vec<Vec<Scalar>>),
    /// An existing index; its names are replaced.
    Index(MultiIndex),
}

impl RowSource {
    pub fn tuples<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        RowSource::Tuples(
            rows.into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for RowSource {
    fn from(keys: Vec<T>) -> Self {
        RowSource::Keys(keys.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for RowSource {
    fn from(keys: [T; N]) -> Self {
        RowSource::Keys(keys.into_iter().map(Into::into).collect())
    }
}

impl From<MultiIndex> for RowSource {
    fn from(index: MultiIndex) -> Self {
        RowSource::Index(index)
    }
}

impl From<&MultiIndex> for RowSource {
    fn from(index: &MultiIndex) -> Self {
        RowSource::Index(index.clone())
    }
}

/// Build an empty-columns table indexed by `rows`, with both indexes
/// carrying the schema's level names, so later column assignments land
/// under correctly named columns.
pub fn init_skeleton(schema: &TableSchema, rows: impl Into<RowSource>) -> Result<Table> {
    let expected = schema.row_levels().positional_count();
    let index = match rows.into() {
        RowSource::Keys(keys) => {
            MultiIndex::from_raw_parts(vec![None], keys.into_iter().map(|k| vec![k]).collect())
        }
        RowSource::Tuples(tuples) => {
            let nlevels = tuples.first().map_or(expected, Vec::len);
            MultiIndex::new(vec![None; nlevels], tuples)
                .map_err(|e| TableError::Shape(e.to_string()))?
        }
        RowSource::Index(index) => {
            index
                .check_consistency()
                .map_err(|e| TableError::Shape(e.to_string()))?;
            index
        }
    };

    if index.nlevels() == 0 {
        return Err(TableError::Shape("row source has no levels".into()));
    }
    if schema.row_levels().is_constrained() && index.nlevels() != expected {
        return Err(TableError::Shape(format!(
            "row source has {} level(s) but the schema expects {} {}",
            index.nlevels(),
            expected,
            schema.row_levels()
        )));
    }

    let mut index = index;
    let nlevels = index.nlevels();
    index.set_names(schema.row_levels().index_names(nlevels))?;
    let column_names = schema
        .col_levels()
        .index_names(schema.col_levels().positional_count());

    debug!(rows = index.len(), levels = nlevels, "initialised skeleton table");
    normalize(Table::with_index(index, column_names), schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_schema() -> TableSchema {
        TableSchema::builder()
            .row_levels("frame")
            .col_levels("feature")
            .build()
            .unwrap()
    }

    #[test]
    fn test_skeleton_shape() {
        let t = init_skeleton(&frame_schema(), vec![10, 20, 30]).unwrap();
        assert_eq!(t.shape(), (3, 0));
        assert_eq!(t.index().names(), &[Some("frame".to_string())]);
        assert_eq!(t.columns().names(), &[Some("feature".to_string())]);
        assert_eq!(
            t.index().level_values(0),
            vec![Scalar::Int(10), Scalar::Int(20), Scalar::Int(30)]
        );
    }

    #[test]
    fn test_skeleton_sorts_rows() {
        let t = init_skeleton(&frame_schema(), [30, 10, 20]).unwrap();
        assert_eq!(
            t.index().level_values(0),
            vec![Scalar::Int(10), Scalar::Int(20), Scalar::Int(30)]
        );
    }

    #[test]
    fn test_skeleton_columns_land_under_named_levels() {
        let mut t = init_skeleton(&frame_schema(), vec![1, 2]).unwrap();
        t.insert_column(["speed"], vec![0.1, 0.2]).unwrap();
        assert_eq!(t.columns().names(), &[Some("feature".to_string())]);
        assert!(frame_schema().validate(&t).is_ok());
    }

    #[test]
    fn test_multi_level_source() {
        let schema = TableSchema::builder()
            .row_levels(["subject", "frame"])
            .build()
            .unwrap();
        let rows = RowSource::tuples(vec![
            vec![Scalar::from("s2"), Scalar::Int(0)],
            vec![Scalar::from("s1"), Scalar::Int(1)],
        ]);
        let t = init_skeleton(&schema, rows).unwrap();
        assert_eq!(t.index().nlevels(), 2);
        assert_eq!(t.index().get(0).unwrap()[0], Scalar::from("s1"));
        assert_eq!(t.columns().names(), &[None]);
    }

    #[test]
    fn test_level_count_mismatch_is_shape_error() {
        let schema = TableSchema::builder()
            .row_levels(["subject", "frame"])
            .build()
            .unwrap();
        assert!(matches!(
            init_skeleton(&schema, vec![1, 2, 3]),
            Err(TableError::Shape(_))
        ));
    }

    #[test]
    fn test_ragged_tuples_are_shape_error() {
        let rows = RowSource::Tuples(vec![vec![Scalar::Int(1)], vec![Scalar::Int(1), Scalar::Int(2)]]);
        assert!(matches!(
            init_skeleton(&frame_schema(), rows),
            Err(TableError::Shape(_))
        ));
    }

    #[test]
    fn test_existing_index_is_relabelled() {
        let source = MultiIndex::new(vec![Some("old".into())], vec![vec![Scalar::Int(5)]]).unwrap();
        let t = init_skeleton(&frame_schema(), &source).unwrap();
        assert_eq!(t.index().names(), &[Some("frame".to_string())]);
    }
}
