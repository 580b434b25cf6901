// src/formats/csv.rs

//! Positional CSV layout.
//!
//! ```text
//! <blank>...,<col level 0 name>,<label>,<label>,...   one row per column level
//! <row level names...>,<blank>,...                     one row of row level names
//! <row keys...>,<cell>,<cell>,...                      one row per table row
//! ```
//!
//! The file alone does not say how many leading cells are row keys or how
//! many header rows there are, so the reader takes both counts from
//! [`LoadOptions`].

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::Path;
use tracing::debug;

use super::{Format, LoadOptions, TableFormat};
use crate::error::{Result, TableError};
use crate::table::{MultiIndex, Scalar, Table};

/// Round trips are exact only for string column labels and cells whose text
/// does not look like another kind: a label `5` comes back as the string
/// `"5"`, and a string cell `"007"` comes back as the integer `7`.
pub struct CsvFormat;

impl TableFormat for CsvFormat {
    const FORMAT: Format = Format::Csv;

    fn load(path: &Path, options: &LoadOptions) -> Result<Table> {
        let nrow = options.row_levels.max(1);
        let ncol_levels = options.col_levels.max(1);

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut records = rdr.records();

        // 1) Column header rows
        let mut col_names = Vec::with_capacity(ncol_levels);
        let mut label_rows: Vec<Vec<Scalar>> = Vec::with_capacity(ncol_levels);
        for level in 0..ncol_levels {
            let record = next_record(&mut records, || format!("column header row {}", level))?;
            if record.len() < nrow {
                return Err(layout_err(path, format!(
                    "header row {} has {} cell(s), fewer than {} row level(s)",
                    level,
                    record.len(),
                    nrow
                )));
            }
            col_names.push(name_cell(&record[nrow - 1]));
            label_rows.push(
                record
                    .iter()
                    .skip(nrow)
                    .map(|s| Scalar::Str(s.to_string()))
                    .collect(),
            );
        }
        let ncols = label_rows[0].len();
        if label_rows.iter().any(|r| r.len() != ncols) {
            return Err(layout_err(path, "column header rows differ in width".into()));
        }
        let labels: Vec<Vec<Scalar>> = (0..ncols)
            .map(|j| label_rows.iter().map(|r| r[j].clone()).collect())
            .collect();

        // 2) Row level names
        let record = next_record(&mut records, || "row level names".to_string())?;
        let row_names: Vec<Option<String>> = (0..nrow)
            .map(|i| record.get(i).and_then(name_cell))
            .collect();

        // 3) Data rows
        let mut keys = Vec::new();
        let mut data: Vec<Vec<Scalar>> = vec![Vec::new(); ncols];
        for (line, result) in records.enumerate() {
            let record = result?;
            if record.len() != nrow + ncols {
                return Err(layout_err(path, format!(
                    "data row {} has {} cell(s), expected {}",
                    line,
                    record.len(),
                    nrow + ncols
                )));
            }
            keys.push(record.iter().take(nrow).map(parse_cell).collect());
            for (col, raw) in data.iter_mut().zip(record.iter().skip(nrow)) {
                col.push(parse_cell(raw));
            }
        }

        debug!(format = %Self::FORMAT, rows = keys.len(), cols = ncols, "parsed csv");
        Table::new(
            MultiIndex::new(row_names, keys)?,
            MultiIndex::new(col_names, labels)?,
            data,
        )
    }

    fn store(table: &Table, path: &Path) -> Result<()> {
        table.check_consistency()?;
        let nrow = table.index().nlevels();
        let ncols = table.ncols();

        let mut wtr = WriterBuilder::new().flexible(true).from_path(path)?;

        for (level, name) in table.columns().names().iter().enumerate() {
            let mut row = vec![String::new(); nrow];
            row[nrow - 1] = name.clone().unwrap_or_default();
            row.extend(
                table
                    .columns()
                    .tuples()
                    .iter()
                    .map(|t| t[level].to_string()),
            );
            wtr.write_record(&row)?;
        }

        let mut names: Vec<String> = table
            .index()
            .names()
            .iter()
            .map(|n| n.clone().unwrap_or_default())
            .collect();
        names.resize(nrow + ncols, String::new());
        wtr.write_record(&names)?;

        for (i, key) in table.index().tuples().iter().enumerate() {
            let row = key
                .iter()
                .map(Scalar::to_string)
                .chain(table.data().iter().map(|col| col[i].to_string()));
            wtr.write_record(row)?;
        }

        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Infer a scalar from CSV text: empty is missing, then bool, int, float,
/// and finally string.
pub fn parse_cell(raw: &str) -> Scalar {
    match raw {
        "" => Scalar::Null,
        "true" | "True" => Scalar::Bool(true),
        "false" | "False" => Scalar::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Scalar::Int(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                Scalar::Float(f)
            } else {
                Scalar::Str(raw.to_string())
            }
        }
    }
}

fn name_cell(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

fn next_record<I, F>(records: &mut I, what: F) -> Result<StringRecord>
where
    I: Iterator<Item = csv::Result<StringRecord>>,
    F: FnOnce() -> String,
{
    match records.next() {
        Some(record) => Ok(record?),
        None => Err(TableError::Layout(format!("csv ended before {}", what()))),
    }
}

fn layout_err(path: &Path, msg: String) -> TableError {
    TableError::Layout(format!("{}: {}", path.display(), msg))
}
