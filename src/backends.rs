//! Backend snapshot importers.
//!
//! This module centralizes how each backend's JSON export maps onto the
//! canonical snapshot records: which entries are categories, how keys are
//! derived (slugs for the CMS, stringified numeric ids for the relational
//! APIs), and how relationship fields are passed through for the resolver.
//! Binaries should go through [`import_snapshot`] instead of matching on
//! backend names so a new backend is added in one place. Fetching the
//! exports is out of scope; callers hand in already-parsed JSON.

use crate::catalog::{
    CatalogKey, CatalogMetadata, CatalogSnapshot, Category, CategoryKey, ProductId, ProductRecord,
    SNAPSHOT_SCHEMA_VERSION, Subcategory, SubcategoryKey,
};
use crate::richtext::to_plain_text;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Already in snapshot form.
    Canonical,
    /// Headless CMS stories keyed by slug paths.
    Storyblok,
    /// Relational resource API with numeric ids.
    Directus,
    /// The self-hosted API server's list responses.
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Canonical => "canonical",
            BackendKind::Storyblok => "storyblok",
            BackendKind::Directus => "directus",
            BackendKind::Local => "local",
        }
    }

    fn importer(&self) -> Importer {
        BACKEND_SPECS
            .iter()
            .find(|spec| spec.kind == *self)
            .map(|spec| spec.import)
            .unwrap_or(import_canonical)
    }
}

impl TryFrom<&str> for BackendKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        BACKEND_SPECS
            .iter()
            .find(|spec| spec.kind.as_str() == value)
            .map(|spec| spec.kind)
            .ok_or_else(|| {
                anyhow!(
                    "unknown backend '{value}' (expected one of {})",
                    allowed_backend_names().join(", ")
                )
            })
    }
}

/// Snapshot metadata and URL settings applied during import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    pub catalog_key: CatalogKey,
    pub title: String,
    /// Base URL used to turn asset ids into URLs (`{base}/assets/{id}`).
    pub asset_base_url: Option<String>,
}

impl ImportOptions {
    pub fn for_backend(kind: BackendKind) -> Self {
        Self {
            catalog_key: CatalogKey::from(kind.as_str()),
            title: format!("{} catalog", kind.as_str()),
            asset_base_url: None,
        }
    }

    fn metadata(&self) -> CatalogMetadata {
        CatalogMetadata {
            key: self.catalog_key.clone(),
            title: self.title.clone(),
            description: None,
        }
    }

    fn asset_url(&self, raw: &Value) -> Option<String> {
        let raw = id_text(raw)?;
        if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with('/') {
            return Some(raw);
        }
        match &self.asset_base_url {
            Some(base) => Some(format!("{}/assets/{raw}", base.trim_end_matches('/'))),
            None => {
                debug!(asset = %raw, "no asset base URL configured; dropping image reference");
                None
            }
        }
    }
}

/// Map a backend export into a canonical snapshot.
pub fn import_snapshot(
    kind: BackendKind,
    export: &Value,
    options: &ImportOptions,
) -> Result<CatalogSnapshot> {
    let snapshot = (kind.importer())(export, options)
        .with_context(|| format!("importing {} export", kind.as_str()))?;
    info!(
        backend = kind.as_str(),
        categories = snapshot.categories.len(),
        subcategories = snapshot.subcategories.len(),
        products = snapshot.products.len(),
        "imported catalog export"
    );
    Ok(snapshot)
}

pub fn allowed_backend_names() -> Vec<&'static str> {
    BACKEND_SPECS.iter().map(|spec| spec.kind.as_str()).collect()
}

type Importer = fn(&Value, &ImportOptions) -> Result<CatalogSnapshot>;

struct BackendSpec {
    kind: BackendKind,
    import: Importer,
}

const BACKEND_SPECS: &[BackendSpec] = &[
    BackendSpec {
        kind: BackendKind::Canonical,
        import: import_canonical,
    },
    BackendSpec {
        kind: BackendKind::Storyblok,
        import: import_storyblok,
    },
    BackendSpec {
        kind: BackendKind::Directus,
        import: import_directus,
    },
    BackendSpec {
        kind: BackendKind::Local,
        import: import_local,
    },
];

fn import_canonical(export: &Value, _options: &ImportOptions) -> Result<CatalogSnapshot> {
    serde_json::from_value(export.clone()).context("decoding canonical snapshot")
}

fn empty_snapshot(options: &ImportOptions) -> CatalogSnapshot {
    CatalogSnapshot {
        schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
        catalog: options.metadata(),
        categories: Vec::new(),
        subcategories: Vec::new(),
        products: Vec::new(),
        allow_list: Default::default(),
    }
}

// ---- Storyblok -------------------------------------------------------------

fn import_storyblok(export: &Value, options: &ImportOptions) -> Result<CatalogSnapshot> {
    let stories = export
        .get("stories")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("expected a 'stories' array"))?;

    let mut full_slugs: HashMap<String, String> = stories
        .iter()
        .filter_map(|story| {
            let uuid = story.get("uuid").and_then(Value::as_str)?;
            let full_slug = story.get("full_slug").and_then(Value::as_str)?;
            Some((uuid.to_string(), full_slug.trim_matches('/').to_string()))
        })
        .collect();

    let mut snapshot = empty_snapshot(options);
    let mut subcategories = Vec::new();
    let mut products = Vec::new();
    for story in stories {
        if story.get("is_folder").and_then(Value::as_bool) == Some(true) {
            continue;
        }
        let Some(full_slug) = story.get("full_slug").and_then(Value::as_str) else {
            debug!("skipping story without full_slug");
            continue;
        };
        let segments: Vec<&str> = full_slug.split('/').filter(|s| !s.is_empty()).collect();
        let content = story.get("content").cloned().unwrap_or(Value::Null);
        match segments.as_slice() {
            ["categories", category] => snapshot.categories.push(Category {
                key: CategoryKey::from(*category),
                display_name: first_text(&content, &["category_name"])
                    .or_else(|| first_text(story, &["name"]))
                    .unwrap_or_else(|| category.to_string()),
                description: to_plain_text(content.get("description").unwrap_or(&Value::Null)),
                icon_url: storyblok_asset(&content, &["icon", "image"]),
            }),
            ["categories", category, subcategory] => subcategories.push(storyblok_subcategory(
                subcategory,
                Some(CategoryKey::from(*category)),
                story,
                &content,
            )),
            ["subcategories", .., subcategory] => {
                let parent = content
                    .get("category")
                    .map(|raw| rewrite_story_refs(raw, &full_slugs))
                    .and_then(|raw| storyblok_parent(&raw));
                subcategories.push(storyblok_subcategory(subcategory, parent, story, &content))
            }
            ["products", ..] => products.push((story, content, full_slug)),
            _ => debug!(full_slug, "skipping story outside the catalog folders"),
        }
    }

    snapshot.subcategories = assign_subcategory_keys(subcategories, &mut full_slugs);
    for (story, content, full_slug) in products {
        snapshot
            .products
            .push(storyblok_product(story, &content, full_slug, &full_slugs)?);
    }
    Ok(snapshot)
}

struct SubcategoryStory {
    uuid: Option<String>,
    slug: String,
    record: Subcategory,
}

fn storyblok_subcategory(
    slug: &str,
    parent: Option<CategoryKey>,
    story: &Value,
    content: &Value,
) -> SubcategoryStory {
    SubcategoryStory {
        uuid: first_text(story, &["uuid"]),
        slug: slug.to_string(),
        record: Subcategory {
            key: SubcategoryKey::from(slug),
            parent_category_key: parent,
            display_name: first_text(content, &["subcategory_name"])
                .or_else(|| first_text(story, &["name"]))
                .unwrap_or_else(|| slug.to_string()),
            icon_url: storyblok_asset(content, &["icon"]),
        },
    }
}

// Subcategory slugs are only unique within a category. A slug used under more
// than one parent is keyed `<category>/<slug>`; repeats under the same parent
// (one story per folder) collapse into the first. References to subcategory
// stories are pointed at `categories/<parent>/<slug>` so the resolver finds
// the composite key from the path.
fn assign_subcategory_keys(
    stories: Vec<SubcategoryStory>,
    full_slugs: &mut HashMap<String, String>,
) -> Vec<Subcategory> {
    let mut parents: HashMap<String, Vec<Option<CategoryKey>>> = HashMap::new();
    for story in &stories {
        let seen = parents.entry(story.slug.clone()).or_default();
        if !seen.contains(&story.record.parent_category_key) {
            seen.push(story.record.parent_category_key.clone());
        }
    }

    let mut keys = HashSet::new();
    let mut subcategories = Vec::with_capacity(stories.len());
    for SubcategoryStory {
        uuid,
        slug,
        mut record,
    } in stories
    {
        let shared = parents.get(&slug).is_some_and(|seen| seen.len() > 1);
        if let Some(parent) = &record.parent_category_key {
            if shared {
                record.key = SubcategoryKey::new(format!("{parent}/{slug}"));
            }
            if let Some(uuid) = uuid {
                full_slugs.insert(uuid, format!("categories/{parent}/{slug}"));
            }
        }
        if keys.insert(record.key.clone()) {
            subcategories.push(record);
        } else {
            debug!(key = %record.key, "merging repeated subcategory story");
        }
    }
    subcategories
}

fn storyblok_product(
    story: &Value,
    content: &Value,
    full_slug: &str,
    full_slugs: &HashMap<String, String>,
) -> Result<ProductRecord> {
    let id = ["uuid", "id"]
        .iter()
        .find_map(|field| story.get(*field).and_then(id_text))
        .ok_or_else(|| anyhow!("product story {full_slug} has no uuid or id"))?;
    let slug = first_text(story, &["slug"]).unwrap_or_else(|| id.clone());
    Ok(ProductRecord {
        id: ProductId::from(id),
        name: first_text(content, &["name"])
            .or_else(|| first_text(story, &["name"]))
            .unwrap_or_else(|| slug.clone()),
        slug,
        description: to_plain_text(content.get("description").unwrap_or(&Value::Null)),
        image_url: storyblok_asset(content, &["image"]),
        price: content.get("price").and_then(number_value),
        path: Some(full_slug.trim_matches('/').to_string()),
        category: content
            .get("category")
            .map(|raw| rewrite_story_refs(raw, full_slugs))
            .unwrap_or(Value::Null),
        subcategory: content
            .get("subcategory")
            .map(|raw| rewrite_story_refs(raw, full_slugs))
            .unwrap_or(Value::Null),
        updated_at: ["published_at", "updated_at", "created_at"]
            .iter()
            .find_map(|field| story.get(*field).and_then(Value::as_str))
            .and_then(parse_timestamp),
    })
}

// Story UUIDs become reference objects carrying the target's full slug.
fn rewrite_story_refs(raw: &Value, full_slugs: &HashMap<String, String>) -> Value {
    match raw {
        Value::String(uuid) => match full_slugs.get(uuid) {
            Some(path) => json!({"uuid": uuid, "full_slug": path}),
            None => raw.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rewrite_story_refs(item, full_slugs))
                .collect(),
        ),
        Value::Object(map) if !map.contains_key("full_slug") => {
            let path = map
                .get("uuid")
                .and_then(Value::as_str)
                .and_then(|uuid| full_slugs.get(uuid));
            match path {
                Some(path) => {
                    let mut map: Map<String, Value> = map.clone();
                    map.insert("full_slug".to_string(), Value::String(path.clone()));
                    Value::Object(map)
                }
                None => raw.clone(),
            }
        }
        _ => raw.clone(),
    }
}

// A subcategory story's `category` field names its parent category story.
fn storyblok_parent(raw: &Value) -> Option<CategoryKey> {
    let reference = match raw {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let path = reference.get("full_slug").and_then(Value::as_str)?;
    match path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>().as_slice() {
        ["categories", category] => Some(CategoryKey::from(*category)),
        _ => None,
    }
}

fn storyblok_asset(content: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match content.get(*field)? {
        Value::Object(asset) => asset
            .get("filename")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        _ => None,
    })
}

// ---- Directus --------------------------------------------------------------

fn import_directus(export: &Value, options: &ImportOptions) -> Result<CatalogSnapshot> {
    let mut snapshot = empty_snapshot(options);
    for item in collection(export, "categories")? {
        snapshot.categories.push(Category {
            key: CategoryKey::from(required_id(item, "category")?),
            display_name: first_text(item, &["name", "slug"]).unwrap_or_default(),
            description: to_plain_text(item.get("description").unwrap_or(&Value::Null)),
            icon_url: item.get("image").and_then(|raw| options.asset_url(raw)),
        });
    }
    for item in collection(export, "products")? {
        let id = required_id(item, "product")?;
        snapshot.products.push(ProductRecord {
            slug: first_text(item, &["slug"]).unwrap_or_else(|| id.clone()),
            name: first_text(item, &["name"]).unwrap_or_default(),
            id: ProductId::from(id),
            description: to_plain_text(item.get("description").unwrap_or(&Value::Null)),
            image_url: item.get("image").and_then(|raw| options.asset_url(raw)),
            price: item.get("price").and_then(number_value),
            path: None,
            category: foreign_key(item.get("category")),
            subcategory: foreign_key(item.get("subcategory")),
            updated_at: ["date_updated", "date_created"]
                .iter()
                .find_map(|field| item.get(*field).and_then(Value::as_str))
                .and_then(parse_timestamp),
        });
    }
    Ok(snapshot)
}

// ---- Local API -------------------------------------------------------------

fn import_local(export: &Value, options: &ImportOptions) -> Result<CatalogSnapshot> {
    let mut snapshot = empty_snapshot(options);
    for row in collection(export, "categories")? {
        snapshot.categories.push(Category {
            key: CategoryKey::from(required_id(row, "category")?),
            display_name: first_text(row, &["name", "slug"]).unwrap_or_default(),
            description: to_plain_text(row.get("description").unwrap_or(&Value::Null)),
            icon_url: first_text(row, &["image_url"]),
        });
    }
    for row in collection(export, "products")? {
        let id = required_id(row, "product")?;
        if row.get("published").and_then(published_flag) == Some(false) {
            debug!(product = %id, "skipping unpublished product");
            continue;
        }
        snapshot.products.push(ProductRecord {
            slug: first_text(row, &["slug"]).unwrap_or_else(|| id.clone()),
            name: first_text(row, &["name"]).unwrap_or_default(),
            id: ProductId::from(id),
            description: to_plain_text(row.get("description").unwrap_or(&Value::Null)),
            image_url: first_text(row, &["image_url"]),
            price: row.get("price").and_then(number_value),
            path: None,
            category: foreign_key(row.get("category_id")),
            subcategory: foreign_key(row.get("subcategory_id")),
            updated_at: ["updated_at", "created_at"]
                .iter()
                .find_map(|field| row.get(*field).and_then(Value::as_str))
                .and_then(parse_timestamp),
        });
    }
    Ok(snapshot)
}

// SQLite stores booleans as 0/1.
fn published_flag(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

// ---- shared helpers --------------------------------------------------------

/// Rows of a named collection: a bare array or a `{"data": [...]}` envelope.
fn collection<'a>(export: &'a Value, name: &str) -> Result<&'a [Value]> {
    let Some(raw) = export.get(name) else {
        return Ok(&[]);
    };
    let rows = match raw {
        Value::Array(rows) => rows,
        Value::Object(envelope) => match envelope.get("data") {
            Some(Value::Array(rows)) => rows,
            _ => bail!("'{name}' envelope has no 'data' array"),
        },
        Value::Null => return Ok(&[]),
        _ => bail!("'{name}' must be an array or a {{\"data\": [...]}} envelope"),
    };
    Ok(rows.as_slice())
}

fn required_id(row: &Value, what: &str) -> Result<String> {
    row.get("id")
        .and_then(id_text)
        .ok_or_else(|| anyhow!("{what} row without an id: {row}"))
}

// Numeric foreign keys become literal keys; expanded objects pass through.
fn foreign_key(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::Number(n)) => Value::String(n.to_string()),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

fn first_text(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        value
            .get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn id_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Decimal columns often arrive as strings.
fn number_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => Some(naive.and_utc()),
        Err(_) => {
            debug!(timestamp = raw, "unrecognized timestamp format");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_round_trip() {
        for name in allowed_backend_names() {
            assert_eq!(BackendKind::try_from(name).unwrap().as_str(), name);
        }
        assert!(BackendKind::try_from("strapi").is_err());
    }

    #[test]
    fn timestamps_accept_rfc3339_and_sqlite_forms() {
        assert!(parse_timestamp("2024-03-01T08:30:00.000Z").is_some());
        let sqlite = parse_timestamp("2024-03-01 08:30:00").unwrap();
        assert_eq!(sqlite.to_rfc3339(), "2024-03-01T08:30:00+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn asset_ids_need_a_base_url() {
        let mut options = ImportOptions::for_backend(BackendKind::Directus);
        assert_eq!(options.asset_url(&json!("abc-123")), None);
        assert_eq!(
            options.asset_url(&json!("https://cdn.example/x.png")).as_deref(),
            Some("https://cdn.example/x.png")
        );
        options.asset_base_url = Some("https://cms.example/".to_string());
        assert_eq!(
            options.asset_url(&json!("abc-123")).as_deref(),
            Some("https://cms.example/assets/abc-123")
        );
    }

    #[test]
    fn story_uuids_are_rewritten_to_references() {
        let slugs: HashMap<String, String> =
            [("u-1".to_string(), "subcategories/to82".to_string())].into();
        assert_eq!(
            rewrite_story_refs(&json!(["u-1", "u-9"]), &slugs),
            json!([{"uuid": "u-1", "full_slug": "subcategories/to82"}, "u-9"])
        );
        assert_eq!(
            rewrite_story_refs(&json!({"uuid": "u-1", "name": "TO 82"}), &slugs),
            json!({"uuid": "u-1", "name": "TO 82", "full_slug": "subcategories/to82"})
        );
    }

    #[test]
    fn prices_parse_from_strings() {
        assert_eq!(number_value(&json!("12,50")), Some(12.5));
        assert_eq!(number_value(&json!(3)), Some(3.0));
        assert_eq!(number_value(&json!(null)), None);
    }
}
