//! Validate a canonical catalog snapshot.
//!
//! Checks the document against the snapshot JSON Schema, then indexes it so
//! duplicate keys and unresolvable relationships are reported too.
//!
//! Usage:
//!   catalog-validate --file catalogs/demo_storefront.json
//!   catalog-validate --schema schema/catalog_snapshot.schema.json < snapshot.json

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use shopfront_catalog::catalog::index::allowed_schema_versions;
use shopfront_catalog::catalog::{CatalogSnapshot, DEFAULT_SCHEMA_PATH};
use shopfront_catalog::{CatalogIndex, SnapshotSchema, find_data_root, logging, resolve_data_path};
use std::fs::File;
use std::io::{Read, stdin};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catalog-validate")]
#[command(about = "Validate a catalog snapshot against its schema and index it")]
struct Cli {
    /// Optional input file; reads stdin when omitted.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Snapshot schema; defaults to the bundled schema under the data root.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<Value> {
    let mut buf = String::new();
    if let Some(path) = file {
        File::open(path)
            .with_context(|| format!("opening input file {}", path.display()))?
            .read_to_string(&mut buf)
            .with_context(|| format!("reading input file {}", path.display()))?;
    } else {
        stdin()
            .read_to_string(&mut buf)
            .context("reading stdin for input JSON")?;
    }
    let value: Value = serde_json::from_str(&buf).context("parsing input JSON")?;
    Ok(value)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let schema_path = match cli.schema {
        Some(path) => path,
        None => {
            let root = find_data_root().context("locating the bundled schema")?;
            resolve_data_path(&root, DEFAULT_SCHEMA_PATH)
        }
    };
    let schema = SnapshotSchema::load(&schema_path, Some(&allowed_schema_versions()))?;

    let input = read_input(cli.file.as_ref())?;
    schema.validate(&input)?;
    let snapshot: CatalogSnapshot =
        serde_json::from_value(input).context("decoding catalog snapshot")?;
    let index = CatalogIndex::from_snapshot(snapshot)?;

    let uncategorized = index
        .products()
        .iter()
        .filter(|p| p.category_key.is_none())
        .count();
    info!(
        schema = %schema.path().display(),
        version = schema.version(),
        title = %index.metadata().title,
        "snapshot valid"
    );
    println!(
        "{}: ok ({} categories, {} subcategories, {} products, {} uncategorized, {} allow-list entries)",
        index.key(),
        index.categories().len(),
        index.subcategories().len(),
        index.products().len(),
        uncategorized,
        index.allow_list().0.len()
    );
    Ok(())
}
