#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{Value, json};
use shopfront_catalog::catalog::{
    CatalogIndex, CatalogSnapshot, DEFAULT_CATALOG_PATH, DEFAULT_SCHEMA_PATH,
};
use shopfront_catalog::SnapshotSchema;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use crate::support::{fixture_path, repo_root};

pub fn demo_catalog_path() -> PathBuf {
    repo_root().join(DEFAULT_CATALOG_PATH)
}

pub fn schema_path() -> PathBuf {
    repo_root().join(DEFAULT_SCHEMA_PATH)
}

pub fn snapshot_schema() -> Result<SnapshotSchema> {
    SnapshotSchema::load(&schema_path(), None)
}

pub fn demo_index() -> Result<CatalogIndex> {
    CatalogIndex::load_validated(&demo_catalog_path(), &snapshot_schema()?)
}

pub fn load_fixture(name: &str) -> Result<Value> {
    let path = fixture_path(name);
    let data =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

/// A minimal snapshot document with the given tables.
pub fn snapshot_doc(categories: Value, subcategories: Value, products: Value) -> Value {
    json!({
        "schema_version": "catalog_snapshot_v1",
        "catalog": {"key": "fixture", "title": "Fixture"},
        "categories": categories,
        "subcategories": subcategories,
        "products": products,
    })
}

pub fn index_from(doc: Value) -> Result<CatalogIndex> {
    let snapshot: CatalogSnapshot = serde_json::from_value(doc).context("decoding fixture")?;
    CatalogIndex::from_snapshot(snapshot)
}

/// `count` products named `p1..` in `category`, cycling through `subcategories`.
pub fn numbered_products(count: usize, category: &str, subcategories: &[&str]) -> Value {
    Value::Array(
        (1..=count)
            .map(|n| {
                let mut product = json!({
                    "id": format!("{category}-{n}"),
                    "slug": format!("{category}-p{n}"),
                    "name": format!("P{n}"),
                    "category": category,
                });
                if !subcategories.is_empty() {
                    product["subcategory"] = json!(subcategories[(n - 1) % subcategories.len()]);
                }
                product
            })
            .collect(),
    )
}

pub fn write_temp_json(value: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.flush()?;
    Ok(file)
}
