//! Convert a backend export into a canonical catalog snapshot.
//!
//! Usage:
//!   catalog-import --backend storyblok --input stories.json --out catalogs/shop.json
//!   catalog-import --backend directus --asset-base-url https://cms.example < items.json

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use shopfront_catalog::catalog::{CatalogIndex, CatalogKey};
use shopfront_catalog::config::ENV_ASSET_BASE_URL;
use shopfront_catalog::{BackendKind, ImportOptions, import_snapshot, logging};
use std::fs;
use std::io::{Read, stdin};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catalog-import")]
#[command(about = "Map a CMS or API export onto the canonical snapshot format")]
struct Cli {
    /// Export format: storyblok, directus, local or canonical.
    #[arg(long)]
    backend: String,
    /// Export file; reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Write the snapshot here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Snapshot catalog key (defaults to the backend name).
    #[arg(long)]
    key: Option<String>,
    /// Snapshot title.
    #[arg(long)]
    title: Option<String>,
    /// Base URL for turning asset ids into URLs (falls back to
    /// CATALOG_ASSET_BASE_URL).
    #[arg(long)]
    asset_base_url: Option<String>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
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

    let backend = BackendKind::try_from(cli.backend.as_str())?;
    let mut options = ImportOptions::for_backend(backend);
    if let Some(key) = cli.key {
        options.catalog_key = CatalogKey::from(key);
    }
    if let Some(title) = cli.title {
        options.title = title;
    }
    options.asset_base_url = cli
        .asset_base_url
        .or_else(|| std::env::var(ENV_ASSET_BASE_URL).ok());

    let export = read_input(cli.input.as_ref())?;
    let snapshot = import_snapshot(backend, &export, &options)?;

    // Index a copy so relationship problems surface as warnings now.
    let index = CatalogIndex::from_snapshot(snapshot.clone()).context("indexing imported catalog")?;
    let uncategorized = index
        .products()
        .iter()
        .filter(|p| p.category_key.is_none())
        .count();
    info!(uncategorized, "resolved imported products");

    let rendered = serde_json::to_string_pretty(&snapshot)?;
    match cli.out {
        Some(path) => {
            fs::write(&path, format!("{rendered}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn read_input(file: Option<&PathBuf>) -> Result<Value> {
    let mut buf = String::new();
    if let Some(path) = file {
        buf = fs::read_to_string(path)
            .with_context(|| format!("reading export file {}", path.display()))?;
    } else {
        stdin()
            .read_to_string(&mut buf)
            .context("reading stdin for export JSON")?;
    }
    serde_json::from_str(&buf).context("parsing export JSON")
}
