//! Storefront catalog resolution, filtering and pagination.
//!
//! The core pipeline is [`resolver`] (raw backend relationships to canonical
//! keys), [`filter`] (category/subcategory views) and [`paginate`] (page
//! slices plus windowed navigation). [`catalog`] loads snapshots,
//! [`backends`] maps backend exports onto them, and [`view`] composes the
//! pieces into page data for the binaries.

pub mod backends;
pub mod catalog;
pub mod config;
pub mod filter;
pub mod logging;
pub mod paginate;
pub mod resolver;
pub mod richtext;
pub mod schema_loader;
pub mod view;

pub use backends::{BackendKind, ImportOptions, import_snapshot};
pub use catalog::{CatalogIndex, CatalogRepository, CatalogSnapshot, CategoryKey, SubcategoryKey};
pub use config::Settings;
pub use filter::{CatalogFilter, SubcategoryListing};
pub use paginate::{PageSize, PageView, paginate};
pub use resolver::{Resolution, ResolutionStrategy, Resolver};
pub use schema_loader::SnapshotSchema;
pub use view::{CatalogViewState, ViewOptions, category_page, product_detail};

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const CATALOGS_DIR: &str = "catalogs";
const SCHEMA_DIR: &str = "schema";

fn is_data_root(candidate: &Path) -> bool {
    candidate.join(CATALOGS_DIR).is_dir() && candidate.join(SCHEMA_DIR).is_dir()
}

fn data_root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !is_data_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_data_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the directory holding `catalogs/` and `schema/`.
///
/// Order: `CATALOG_ROOT`, an upward search from the executable and then the
/// working directory, and finally the checkout captured at build time.
pub fn find_data_root() -> Result<PathBuf> {
    if let Ok(env_root) = env::var("CATALOG_ROOT") {
        if let Some(root) = data_root_from_hint(&env_root) {
            return Ok(root);
        }
    }

    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    for start in exe_dir.into_iter().chain(env::current_dir().ok()) {
        if let Some(root) = search_upwards(&start) {
            return Ok(root);
        }
    }

    if let Some(hint) = option_env!("CATALOG_ROOT_HINT") {
        if let Some(root) = data_root_from_hint(hint) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate the catalog data root (a directory with catalogs/ and schema/). Set CATALOG_ROOT or pass explicit paths."
    );
}

/// Join a relative default onto the data root; absolute paths pass through.
pub fn resolve_data_path(root: &Path, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
