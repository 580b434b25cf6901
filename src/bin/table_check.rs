use anyhow::{Context, Result};
use std::{env, path::Path, process::exit};
use structured_table::{fs::file_stem_name, Table, TableSchema};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // Expect exactly two CLI arguments: descriptor config and table file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <DESCRIPTOR_CONFIG> <TABLE_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = check_table(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Load the descriptor, read the table through it and print a summary.
fn check_table(config: &Path, table_path: &Path) -> Result<()> {
    // 1) Descriptor
    let schema = TableSchema::from_config_file(config)
        .with_context(|| format!("loading descriptor {}", config.display()))?;
    info!(
        format = %schema.format(),
        nullable = schema.nullable(),
        "loaded descriptor {}",
        config.display()
    );

    // 2) Table, normalized and validated on the way in
    let table = schema
        .read(table_path)
        .with_context(|| format!("reading {}", table_path.display()))?;

    // 3) Summary
    print_summary(table_path, &table);
    Ok(())
}

fn print_summary(path: &Path, table: &Table) {
    let (rows, cols) = table.shape();
    println!(
        "=== Table: {} ===",
        file_stem_name(path).unwrap_or_else(|| path.display().to_string())
    );
    println!("File:           {}", path.display());
    println!("Shape:          {} x {}", rows, cols);
    println!("Row levels:     {}", level_names(table.index().names()));
    println!("Column levels:  {}", level_names(table.columns().names()));
    println!("Missing cells:  {}", table.missing_count());
}

fn level_names(names: &[Option<String>]) -> String {
    names
        .iter()
        .map(|n| n.as_deref().unwrap_or("<unnamed>"))
        .collect::<Vec<_>>()
        .join(", ")
}
