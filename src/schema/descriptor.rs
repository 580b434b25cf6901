// src/schema/descriptor.rs

use serde::{Deserialize, Serialize};
use std::{fs, io::Write, path::Path};

use super::{levels::Levels, skeleton, skeleton::RowSource, validate};
use crate::error::{IoResultExt, Result, TableError};
use crate::formats::{self, Format};
use crate::fs::{ensure_parent_dir, publish};
use crate::table::Table;

/// Immutable description of a table type: which levels its indexes carry,
/// whether it may hold missing values, and how it is stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableSchemaConfig", into = "TableSchemaConfig")]
pub struct TableSchema {
    nullable: bool,
    row_levels: Levels,
    col_levels: Levels,
    format: Format,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            nullable: true,
            row_levels: Levels::Unconstrained,
            col_levels: Levels::Unconstrained,
            format: Format::Parquet,
        }
    }
}

impl TableSchema {
    pub fn builder() -> TableSchemaBuilder {
        TableSchemaBuilder::default()
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn row_levels(&self) -> &Levels {
        &self.row_levels
    }

    pub fn col_levels(&self) -> &Levels {
        &self.col_levels
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Same schema, stored in another format.
    pub fn with_format(&self, format: Format) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }

    pub fn validate(&self, table: &Table) -> Result<()> {
        validate::validate(table, self)
    }

    pub fn normalize(&self, table: Table) -> Result<Table> {
        validate::normalize(table, self)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<Table> {
        formats::read(self, path)
    }

    pub fn write(&self, table: &Table, path: impl AsRef<Path>) -> Result<()> {
        formats::write(self, table, path)
    }

    pub fn init_skeleton(&self, rows: impl Into<RowSource>) -> Result<Table> {
        skeleton::init_skeleton(self, rows)
    }

    /// Load a descriptor from a `.json`, `.yaml` or `.yml` config file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).at_path(path)?;
        let config: TableSchemaConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            _ => serde_json::from_str(&text)?,
        };
        Self::try_from(config)
    }

    /// Write the descriptor as pretty JSON, creating parent directories.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let config = TableSchemaConfig::from(self.clone());
        publish(path, |tmp| {
            let mut file = fs::File::create(tmp).at_path(tmp)?;
            serde_json::to_writer_pretty(&mut file, &config)?;
            file.write_all(b"\n").at_path(tmp)?;
            Ok(())
        })
    }
}

/// Builder for [`TableSchema`]. Unset fields keep the defaults
/// (nullable, unconstrained levels, parquet).
#[derive(Debug, Clone, Default)]
pub struct TableSchemaBuilder {
    schema: TableSchema,
}

impl TableSchemaBuilder {
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.schema.nullable = nullable;
        self
    }

    pub fn row_levels(mut self, levels: impl Into<Levels>) -> Self {
        self.schema.row_levels = levels.into();
        self
    }

    pub fn col_levels(mut self, levels: impl Into<Levels>) -> Self {
        self.schema.col_levels = levels.into();
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.schema.format = format;
        self
    }

    /// Select the format by name; unknown names fail here, before any I/O.
    pub fn format_name(self, name: &str) -> Result<Self> {
        Ok(self.format(name.parse()?))
    }

    pub fn build(self) -> Result<TableSchema> {
        self.schema.row_levels.check_distinct()?;
        self.schema.col_levels.check_distinct()?;
        Ok(self.schema)
    }
}

/// On-disk spelling of a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSchemaConfig {
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub row_levels: Levels,
    #[serde(default)]
    pub col_levels: Levels,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_nullable() -> bool {
    true
}

fn default_format() -> String {
    Format::Parquet.as_str().to_string()
}

impl TryFrom<TableSchemaConfig> for TableSchema {
    type Error = TableError;

    fn try_from(config: TableSchemaConfig) -> Result<Self> {
        TableSchema::builder()
            .nullable(config.nullable)
            .row_levels(config.row_levels)
            .col_levels(config.col_levels)
            .format_name(&config.format)?
            .build()
    }
}

impl From<TableSchema> for TableSchemaConfig {
    fn from(schema: TableSchema) -> Self {
        Self {
            nullable: schema.nullable,
            row_levels: schema.row_levels,
            col_levels: schema.col_levels,
            format: schema.format.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let schema = TableSchema::builder().build().unwrap();
        assert!(schema.nullable());
        assert_eq!(schema.row_levels(), &Levels::Unconstrained);
        assert_eq!(schema.col_levels(), &Levels::Unconstrained);
        assert_eq!(schema.format(), Format::Parquet);
    }

    #[test]
    fn test_unknown_format_fails_at_construction() {
        let err = TableSchema::builder().format_name("xml").unwrap_err();
        match err {
            TableError::UnsupportedFormat {
                requested,
                supported,
            } => {
                assert_eq!(requested, "xml");
                assert_eq!(supported, vec!["csv", "h5", "feather", "parquet"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_levels_rejected() {
        let err = TableSchema::builder()
            .col_levels(["x", "x"])
            .build()
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateLevel(_)));
    }

    #[test]
    fn test_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keypoints.yaml");
        fs::write(
            &path,
            "nullable: false\nrow_levels: frame\ncol_levels: [individual, bodypart, coord]\nformat: feather\n",
        )
        .unwrap();
        let schema = TableSchema::from_config_file(&path).unwrap();
        assert!(!schema.nullable());
        assert_eq!(schema.row_levels(), &Levels::from("frame"));
        assert_eq!(schema.col_levels().len(), 3);
        assert_eq!(schema.format(), Format::Feather);
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"nullable": true, "index": "frame"}"#).unwrap();
        assert!(matches!(
            TableSchema::from_config_file(&path),
            Err(TableError::Json(_))
        ));
    }

    #[test]
    fn test_config_unknown_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"format": "xml"}"#).unwrap();
        assert!(matches!(
            TableSchema::from_config_file(&path),
            Err(TableError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs").join("analysis.json");
        let schema = TableSchema::builder()
            .nullable(false)
            .row_levels("frame")
            .col_levels(["individual", "behaviour"])
            .format(Format::Csv)
            .build()
            .unwrap();
        schema.to_json_file(&path).unwrap();
        assert_eq!(TableSchema::from_config_file(&path).unwrap(), schema);
    }
}
