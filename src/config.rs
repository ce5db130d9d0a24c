//! Runtime settings: CLI flags, then `CATALOG_*` environment variables,
//! then defaults under the data root.

use crate::backends::{BackendKind, ImportOptions, import_snapshot};
use crate::catalog::{CatalogIndex, CatalogSnapshot, DEFAULT_CATALOG_PATH, DEFAULT_SCHEMA_PATH};
use crate::catalog::index::allowed_schema_versions;
use crate::filter::SubcategoryListing;
use crate::paginate::PageSize;
use crate::schema_loader::SnapshotSchema;
use crate::view::ViewOptions;
use crate::{find_data_root, resolve_data_path};
use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENV_CATALOG_PATH: &str = "CATALOG_PATH";
pub const ENV_BACKEND: &str = "CATALOG_BACKEND";
pub const ENV_PAGE_SIZE: &str = "CATALOG_PAGE_SIZE";
pub const ENV_SUBCATEGORIES: &str = "CATALOG_SUBCATEGORIES";
pub const ENV_ASSET_BASE_URL: &str = "CATALOG_ASSET_BASE_URL";
pub const ENV_SCHEMA_PATH: &str = "CATALOG_SCHEMA_PATH";

/// Values supplied on the command line; `None` defers to env and defaults.
///
/// Binaries flatten this into their own `clap` parser.
#[derive(Args, Clone, Debug, Default)]
pub struct Overrides {
    /// Snapshot or backend export to load.
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog_path: Option<PathBuf>,
    /// JSON Schema for canonical snapshots.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema_path: Option<PathBuf>,
    /// Format of the catalog file: canonical, storyblok, directus or local.
    #[arg(long)]
    pub backend: Option<String>,
    /// Products per page.
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Subcategory filters to offer: used or all.
    #[arg(long = "subcategories", value_name = "MODE")]
    pub listing: Option<String>,
    /// Base URL for backend asset ids.
    #[arg(long)]
    pub asset_base_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub catalog_path: PathBuf,
    /// `None` when no schema file could be found; loading then skips
    /// JSON Schema validation.
    pub schema_path: Option<PathBuf>,
    pub backend: BackendKind,
    pub page_size: PageSize,
    pub listing: SubcategoryListing,
    pub asset_base_url: Option<String>,
}

impl Settings {
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |name| env::var(name).ok(), find_data_root)
    }

    fn resolve_with(
        overrides: &Overrides,
        lookup: impl Fn(&str) -> Option<String>,
        data_root: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let backend = match overrides.backend.clone().or_else(|| lookup(ENV_BACKEND)) {
            Some(name) => BackendKind::try_from(name.trim())?,
            None => BackendKind::Canonical,
        };

        let page_size = match overrides.page_size {
            Some(size) => PageSize::new(size)?,
            None => match lookup(ENV_PAGE_SIZE) {
                Some(raw) => {
                    let size: usize = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("{ENV_PAGE_SIZE} must be a positive integer"))?;
                    PageSize::new(size)?
                }
                None => PageSize::default(),
            },
        };

        let listing = match overrides.listing.clone().or_else(|| lookup(ENV_SUBCATEGORIES)) {
            Some(raw) => SubcategoryListing::try_from(raw.trim())?,
            None => SubcategoryListing::default(),
        };

        let catalog_path = overrides
            .catalog_path
            .clone()
            .or_else(|| lookup(ENV_CATALOG_PATH).map(PathBuf::from));
        let schema_path = overrides
            .schema_path
            .clone()
            .or_else(|| lookup(ENV_SCHEMA_PATH).map(PathBuf::from));

        let (catalog_path, schema_path) = match (catalog_path, schema_path) {
            (Some(catalog), Some(schema)) => (catalog, Some(schema)),
            (catalog, schema) => {
                let root = data_root();
                let catalog = match (catalog, &root) {
                    (Some(catalog), _) => catalog,
                    (None, Ok(root)) => resolve_data_path(root, DEFAULT_CATALOG_PATH),
                    (None, Err(err)) => {
                        bail!("no catalog path given and {err:#}")
                    }
                };
                let schema = schema.or_else(|| {
                    root.ok()
                        .map(|root| resolve_data_path(&root, DEFAULT_SCHEMA_PATH))
                        .filter(|path| path.is_file())
                });
                (catalog, schema)
            }
        };

        Ok(Self {
            catalog_path,
            schema_path,
            backend,
            page_size,
            listing,
            asset_base_url: overrides
                .asset_base_url
                .clone()
                .or_else(|| lookup(ENV_ASSET_BASE_URL)),
        })
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            page_size: self.page_size,
            listing: self.listing,
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            asset_base_url: self.asset_base_url.clone(),
            ..ImportOptions::for_backend(self.backend)
        }
    }

    /// Read the configured file and turn it into a canonical snapshot.
    ///
    /// Canonical snapshots are checked against the JSON Schema when one is
    /// configured; backend exports are imported first and checked after.
    pub fn load_snapshot(&self) -> Result<CatalogSnapshot> {
        let document = read_json(&self.catalog_path)?;
        let schema = self.load_schema()?;
        let document = match self.backend {
            BackendKind::Canonical => document,
            kind => {
                let imported = import_snapshot(kind, &document, &self.import_options())
                    .with_context(|| format!("importing {}", self.catalog_path.display()))?;
                serde_json::to_value(imported).context("serializing imported snapshot")?
            }
        };
        if let Some(schema) = &schema {
            schema
                .validate(&document)
                .with_context(|| format!("validating {}", self.catalog_path.display()))?;
        }
        serde_json::from_value(document)
            .with_context(|| format!("decoding catalog snapshot {}", self.catalog_path.display()))
    }

    pub fn load_index(&self) -> Result<CatalogIndex> {
        let snapshot = self.load_snapshot()?;
        let index = CatalogIndex::from_snapshot(snapshot)
            .with_context(|| format!("indexing {}", self.catalog_path.display()))?;
        info!(
            catalog = %index.key(),
            categories = index.categories().len(),
            products = index.products().len(),
            "catalog loaded"
        );
        Ok(index)
    }

    fn load_schema(&self) -> Result<Option<SnapshotSchema>> {
        match &self.schema_path {
            Some(path) => {
                let allowed = allowed_schema_versions();
                SnapshotSchema::load(path, Some(&allowed)).map(Some)
            }
            None => {
                debug!("no snapshot schema configured; skipping JSON Schema validation");
                Ok(None)
            }
        }
    }
}

pub fn read_json(path: &Path) -> Result<Value> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing JSON from {}", path.display()))
}
