//! Indexed, resolved view of one catalog snapshot.
//!
//! The index enforces the expected snapshot schema version and identity
//! uniqueness, resolves every product's relationship fields once, and keeps
//! deterministic lookups by key, id and slug. Duplicates and unknown schema
//! versions are load errors; dangling references are not.

use crate::catalog::{
    AllowList, CatalogKey, CatalogMetadata, CatalogSnapshot, Category, CategoryKey, Product,
    ProductId, SNAPSHOT_SCHEMA_VERSION, Subcategory, SubcategoryKey, load_snapshot_from_path,
};
use crate::resolver::Resolver;
use crate::schema_loader::SnapshotSchema;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const ENV_ALLOWED_SCHEMA_VERSIONS: &str = "CATALOG_ALLOWED_SCHEMAS";

#[derive(Debug)]
/// Snapshot plus derived indexes; products carry canonical keys.
pub struct CatalogIndex {
    catalog: CatalogMetadata,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    products: Vec<Product>,
    allow_list: AllowList,
    by_category: BTreeMap<CategoryKey, usize>,
    by_subcategory: BTreeMap<SubcategoryKey, usize>,
    by_product_id: BTreeMap<ProductId, usize>,
    by_product_slug: BTreeMap<String, usize>,
}

impl CatalogIndex {
    /// Load a canonical snapshot from disk without schema validation.
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot =
            load_snapshot_from_path(path).with_context(|| format!("loading {}", path.display()))?;
        Self::from_snapshot(snapshot).with_context(|| format!("indexing {}", path.display()))
    }

    /// Load a canonical snapshot and validate it against `schema` first.
    pub fn load_validated(path: &Path, schema: &SnapshotSchema) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading catalog snapshot {}", path.display()))?;
        let document: Value = serde_json::from_str(&data)
            .with_context(|| format!("parsing catalog snapshot {}", path.display()))?;
        schema.validate(&document)?;
        let snapshot: CatalogSnapshot = serde_json::from_value(document)
            .with_context(|| format!("decoding catalog snapshot {}", path.display()))?;
        Self::from_snapshot(snapshot).with_context(|| format!("indexing {}", path.display()))
    }

    /// Validate identities, drop dangling parent links and resolve products.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self> {
        validate_schema_version(&snapshot.schema_version)?;
        validate_catalog_metadata(&snapshot.catalog)?;

        let CatalogSnapshot {
            catalog,
            categories,
            mut subcategories,
            products: records,
            allow_list,
            ..
        } = snapshot;

        let by_category = index_unique(
            categories.iter().map(|c| c.key.clone()),
            "category key",
        )?;
        let by_subcategory = index_unique(
            subcategories.iter().map(|s| s.key.clone()),
            "subcategory key",
        )?;
        let by_product_id = index_unique(records.iter().map(|p| p.id.clone()), "product id")?;
        let by_product_slug =
            index_unique(records.iter().map(|p| p.slug.clone()), "product slug")?;

        for subcategory in &mut subcategories {
            let dangling = subcategory
                .parent_category_key
                .as_ref()
                .is_some_and(|parent| !by_category.contains_key(parent));
            if dangling {
                warn!(
                    subcategory = %subcategory.key,
                    parent = ?subcategory.parent_category_key,
                    "parent category not in snapshot; showing subcategory unscoped"
                );
                subcategory.parent_category_key = None;
            }
        }

        let products = {
            let resolver = Resolver::new(&categories, &subcategories, &allow_list);
            records
                .into_iter()
                .map(|record| {
                    let (resolution, malformed) = resolver.resolve_record(&record);
                    for issue in &malformed {
                        warn!(
                            product = %record.id,
                            field = issue.field.as_str(),
                            shape = issue.shape,
                            "ignoring malformed relationship field"
                        );
                    }
                    if resolution.is_uncategorized() {
                        debug!(product = %record.id, "product is uncategorized");
                    }
                    Product::from_record(
                        record,
                        resolution.category_key,
                        resolution.subcategory_key,
                    )
                })
                .collect::<Vec<_>>()
        };

        Ok(Self {
            catalog,
            categories,
            subcategories,
            products,
            allow_list,
            by_category,
            by_subcategory,
            by_product_id,
            by_product_slug,
        })
    }

    /// The catalog key declared in the snapshot.
    pub fn key(&self) -> &CatalogKey {
        &self.catalog.key
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.catalog
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    /// Resolved products in snapshot order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn category(&self, key: &CategoryKey) -> Option<&Category> {
        self.by_category.get(key).map(|&i| &self.categories[i])
    }

    pub fn subcategory(&self, key: &SubcategoryKey) -> Option<&Subcategory> {
        self.by_subcategory.get(key).map(|&i| &self.subcategories[i])
    }

    /// Look a product up by id, then by slug.
    pub fn product(&self, id_or_slug: &str) -> Option<&Product> {
        self.by_product_id
            .get(&ProductId::from(id_or_slug))
            .or_else(|| self.by_product_slug.get(id_or_slug))
            .map(|&i| &self.products[i])
    }
}

pub fn allowed_schema_versions() -> BTreeSet<String> {
    let mut versions: BTreeSet<String> = BTreeSet::new();
    versions.insert(SNAPSHOT_SCHEMA_VERSION.to_string());
    if let Ok(raw) = std::env::var(ENV_ALLOWED_SCHEMA_VERSIONS) {
        for v in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            versions.insert(v.to_string());
        }
    }
    versions
}

fn validate_schema_version(schema_version: &str) -> Result<()> {
    if schema_version.is_empty() {
        bail!("schema_version must not be empty");
    }

    let allowed = allowed_schema_versions();
    if !allowed.contains(schema_version) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            schema_version,
            allowed
        );
    }

    Ok(())
}

fn validate_catalog_metadata(meta: &CatalogMetadata) -> Result<()> {
    if meta.key.0.trim().is_empty() {
        bail!("catalog.key must not be empty");
    }
    if !meta
        .key
        .0
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        bail!(
            "catalog.key must match ^[A-Za-z0-9_.-]+$, got {}",
            meta.key.0
        );
    }
    if meta.title.trim().is_empty() {
        bail!("catalog.title must not be empty");
    }
    Ok(())
}

fn index_unique<K>(keys: impl Iterator<Item = K>, what: &str) -> Result<BTreeMap<K, usize>>
where
    K: Ord + AsRef<str>,
{
    let mut map = BTreeMap::new();
    for (position, key) in keys.enumerate() {
        if key.as_ref().trim().is_empty() {
            bail!("encountered {what} that is empty (entry {position})");
        }
        if map.contains_key(&key) {
            bail!("duplicate {what} '{}'", key.as_ref());
        }
        map.insert(key, position);
    }
    Ok(map)
}
