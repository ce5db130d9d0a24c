//! Snapshot document types.
//!
//! A snapshot is what one page load works from: categories, subcategories and
//! raw product records exactly as a backend delivered them (after field
//! mapping), plus an optional static allow-list. Relationship fields on
//! product records stay as raw JSON until the resolver normalizes them.

use crate::catalog::{CatalogKey, CategoryKey, ProductId, SubcategoryKey};
use crate::richtext::{self, deserialize_text};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Schema version written into canonical snapshot documents.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "catalog_snapshot_v1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub key: CatalogKey,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub key: CategoryKey,
    pub display_name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub key: SubcategoryKey,
    #[serde(default)]
    pub parent_category_key: Option<CategoryKey>,
    pub display_name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// A product as delivered by a backend, before relationship resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// The record's own slug path (for example a CMS `full_slug`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub category: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub subcategory: Value,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A product with canonical relationship keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub category_key: Option<CategoryKey>,
    pub subcategory_key: Option<SubcategoryKey>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Attach canonical keys to a raw record.
    pub fn from_record(
        record: ProductRecord,
        category_key: Option<CategoryKey>,
        subcategory_key: Option<SubcategoryKey>,
    ) -> Self {
        Self {
            id: record.id,
            slug: record.slug,
            name: record.name,
            description: record.description,
            image_url: record.image_url,
            price: record.price,
            category_key,
            subcategory_key,
            updated_at: record.updated_at,
        }
    }

    /// Card-sized description, or `None` when the product has none.
    pub fn excerpt(&self, max_chars: usize) -> Option<String> {
        let trimmed = self.description.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(richtext::excerpt(trimmed, max_chars))
        }
    }
}

/// Static table of the subcategories each category may contain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(pub BTreeMap<CategoryKey, Vec<SubcategoryKey>>);

impl AllowList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Categories (in key order) whose allow-list contains `subcategory`.
    pub fn categories_allowing<'a>(
        &'a self,
        subcategory: &'a str,
    ) -> impl Iterator<Item = &'a CategoryKey> + 'a {
        self.0
            .iter()
            .filter(move |(_, subs)| subs.iter().any(|sub| sub.as_str() == subcategory))
            .map(|(category, _)| category)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub schema_version: String,
    pub catalog: CatalogMetadata,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default, skip_serializing_if = "AllowList::is_empty")]
    pub allow_list: AllowList,
}

/// Read a canonical snapshot document without validating it.
pub fn load_snapshot_from_path(path: &Path) -> Result<CatalogSnapshot> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading catalog snapshot {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("parsing catalog snapshot {}", path.display()))
}

/// Which raw field of a product record a relationship came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationField {
    Category,
    Subcategory,
}

impl RelationField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationField::Category => "category",
            RelationField::Subcategory => "subcategory",
        }
    }
}

/// A reference object: a slug path, an identifier, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationRef {
    pub path: Option<String>,
    pub id: Option<String>,
}

impl RelationRef {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    None
                } else if raw.contains('/') {
                    Some(Self {
                        path: Some(raw.to_string()),
                        id: None,
                    })
                } else {
                    Some(Self {
                        path: None,
                        id: Some(raw.to_string()),
                    })
                }
            }
            Value::Object(map) => {
                let path = ["full_slug", "slug", "path"]
                    .iter()
                    .filter_map(|field| map.get(*field).and_then(Value::as_str))
                    .map(str::trim)
                    .find(|s| !s.is_empty())
                    .map(str::to_string);
                let id = ["uuid", "id"]
                    .iter()
                    .filter_map(|field| map.get(*field))
                    .find_map(identifier_text);
                if path.is_none() && id.is_none() {
                    None
                } else {
                    Some(Self { path, id })
                }
            }
            _ => None,
        }
    }
}

/// Relationship field after shape detection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RawRelation {
    Literal(String),
    Reference(RelationRef),
    ReferenceList(Vec<RelationRef>),
    #[default]
    Absent,
}

impl RawRelation {
    /// Classify a raw JSON field. `None` means the shape is unrecognized.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(RawRelation::Absent),
            Value::String(raw) if raw.trim().is_empty() => Some(RawRelation::Absent),
            Value::String(raw) => Some(RawRelation::Literal(raw.trim().to_string())),
            Value::Object(_) => RelationRef::from_json(value).map(RawRelation::Reference),
            Value::Array(items) => {
                let Some(first) = items.first() else {
                    return Some(RawRelation::Absent);
                };
                let first = RelationRef::from_json(first)?;
                let mut refs = vec![first];
                refs.extend(items.iter().skip(1).filter_map(RelationRef::from_json));
                Some(RawRelation::ReferenceList(refs))
            }
            Value::Number(_) | Value::Bool(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, RawRelation::Absent)
    }
}

/// A relationship field whose shape could not be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MalformedRelationship {
    pub field: RelationField,
    pub shape: &'static str,
}

/// Both relationship fields of a record, classified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationFields {
    pub category: RawRelation,
    pub subcategory: RawRelation,
    pub path: Option<String>,
}

impl ProductRecord {
    /// Classify the record's relationship fields.
    ///
    /// Unrecognized shapes come back as `Absent` together with a diagnostic;
    /// reporting it is up to the caller.
    pub fn relation_fields(&self) -> (RelationFields, Vec<MalformedRelationship>) {
        let mut malformed = Vec::new();
        let mut classify = |field: RelationField, value: &Value| {
            RawRelation::from_json(value).unwrap_or_else(|| {
                malformed.push(MalformedRelationship {
                    field,
                    shape: json_shape(value),
                });
                RawRelation::Absent
            })
        };
        let category = classify(RelationField::Category, &self.category);
        let subcategory = classify(RelationField::Subcategory, &self.subcategory);
        let path = self
            .path
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| Some(self.slug.clone()).filter(|s| !s.trim().is_empty()));
        (
            RelationFields {
                category,
                subcategory,
                path,
            },
            malformed,
        )
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(category: Value, subcategory: Value) -> ProductRecord {
        ProductRecord {
            id: ProductId::from("p1"),
            slug: "vicko-to82".to_string(),
            name: "Víčko TO 82".to_string(),
            description: String::new(),
            image_url: None,
            price: None,
            path: None,
            category,
            subcategory,
            updated_at: None,
        }
    }

    #[test]
    fn classifies_every_supported_shape() {
        assert_eq!(
            RawRelation::from_json(&json!("3")),
            Some(RawRelation::Literal("3".to_string()))
        );
        assert_eq!(
            RawRelation::from_json(&json!({"full_slug": "categories/vicka/to82", "uuid": "u-1"})),
            Some(RawRelation::Reference(RelationRef {
                path: Some("categories/vicka/to82".to_string()),
                id: Some("u-1".to_string()),
            }))
        );
        assert_eq!(
            RawRelation::from_json(&json!([{"id": 7}, "categories/vicka/to63"])),
            Some(RawRelation::ReferenceList(vec![
                RelationRef {
                    path: None,
                    id: Some("7".to_string()),
                },
                RelationRef {
                    path: Some("categories/vicka/to63".to_string()),
                    id: None,
                },
            ]))
        );
        assert_eq!(RawRelation::from_json(&json!([])), Some(RawRelation::Absent));
        assert_eq!(RawRelation::from_json(&json!("  ")), Some(RawRelation::Absent));
        assert_eq!(RawRelation::from_json(&json!(12)), None);
        assert_eq!(RawRelation::from_json(&json!({"name": "x"})), None);
        assert_eq!(RawRelation::from_json(&json!([true, "a"])), None);
    }

    #[test]
    fn malformed_fields_are_reported_and_treated_as_absent() {
        let (fields, malformed) = record(json!(3), json!({"title": "?"})).relation_fields();
        assert!(fields.category.is_absent());
        assert!(fields.subcategory.is_absent());
        assert_eq!(
            malformed,
            vec![
                MalformedRelationship {
                    field: RelationField::Category,
                    shape: "number",
                },
                MalformedRelationship {
                    field: RelationField::Subcategory,
                    shape: "object",
                },
            ]
        );
        assert_eq!(fields.path.as_deref(), Some("vicko-to82"));
    }

    #[test]
    fn allow_list_lookup_is_ordered_by_category_key() {
        let list: AllowList = serde_json::from_value(json!({
            "vicka": ["to82", "to66"],
            "plechovky": ["to82"]
        }))
        .unwrap();
        let found: Vec<_> = list.categories_allowing("to82").map(|c| c.as_str()).collect();
        assert_eq!(found, vec!["plechovky", "vicka"]);
        assert_eq!(list.categories_allowing("none").count(), 0);
    }
}
