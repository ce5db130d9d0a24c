//! Catalog snapshot wiring.
//!
//! This module wraps catalog snapshots on disk (for example
//! `catalogs/demo_storefront.json`) so callers can load a validated,
//! relationship-resolved snapshot and query it through consistent
//! identifiers. Types here mirror the snapshot schema fields; callers use
//! `CatalogIndex` for lookups and `CatalogRepository` when they should not
//! care which backend produced the data.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{CatalogKey, CategoryKey, ProductId, SubcategoryKey};
pub use index::CatalogIndex;
pub use model::{
    AllowList, CatalogMetadata, CatalogSnapshot, Category, MalformedRelationship, Product,
    ProductRecord, RawRelation, RelationField, RelationFields, RelationRef, SNAPSHOT_SCHEMA_VERSION,
    Subcategory,
};
pub use repository::CatalogRepository;

pub use model::load_snapshot_from_path;

/// Default relative path to the bundled demo snapshot.
pub const DEFAULT_CATALOG_PATH: &str = "catalogs/demo_storefront.json";

/// Default relative path to the snapshot JSON Schema.
pub const DEFAULT_SCHEMA_PATH: &str = "schema/catalog_snapshot.schema.json";
