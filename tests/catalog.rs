// Snapshot loading, indexing and repository lookups.
mod support;
#[path = "support/common.rs"]
mod common;

use anyhow::Result;
use serde_json::json;
use shopfront_catalog::catalog::{CatalogIndex, CategoryKey, SubcategoryKey};
use shopfront_catalog::{CatalogRepository, SnapshotSchema};

use common::{
    demo_catalog_path, demo_index, index_from, numbered_products, schema_path, snapshot_doc,
    snapshot_schema, write_temp_json,
};

fn keys(index: &CatalogIndex, id: &str) -> (Option<String>, Option<String>) {
    let product = index.product(id).expect("product present");
    (
        product.category_key.as_ref().map(|k| k.to_string()),
        product.subcategory_key.as_ref().map(|k| k.to_string()),
    )
}

fn pair(category: &str, subcategory: Option<&str>) -> (Option<String>, Option<String>) {
    (Some(category.to_string()), subcategory.map(str::to_string))
}

#[test]
fn demo_catalog_loads_and_validates() -> Result<()> {
    let index = demo_index()?;
    assert_eq!(index.key().as_str(), "demo_storefront");
    assert_eq!(index.categories().len(), 3);
    assert_eq!(index.subcategories().len(), 6);
    assert_eq!(index.products().len(), 17);
    assert_eq!(index.allow_list().0.len(), 2);

    let unvalidated = CatalogIndex::load(&demo_catalog_path())?;
    assert_eq!(unvalidated.products(), index.products());
    assert_eq!(unvalidated.metadata().title, "Demo storefront");
    Ok(())
}

#[test]
fn demo_catalog_resolves_every_relationship_shape() -> Result<()> {
    let index = demo_index()?;
    // reference object
    assert_eq!(keys(&index, "v01"), pair("vicka", Some("to82")));
    // reference list
    assert_eq!(keys(&index, "v02"), pair("vicka", Some("to82")));
    // explicit literals
    assert_eq!(keys(&index, "v03"), pair("vicka", Some("to66")));
    // literal subcategory only; category comes from its parent
    assert_eq!(keys(&index, "s03"), pair("sklenice", Some("medove")));
    // reference objects on both fields
    assert_eq!(keys(&index, "s02"), pair("sklenice", Some("zavarovaci")));
    // nothing set; the allow-list matches a path segment
    assert_eq!(keys(&index, "p01"), pair("plechovky", Some("konzervy")));
    assert_eq!(keys(&index, "p02"), pair("plechovky", Some("konzervy")));
    assert_eq!(keys(&index, "x01"), (None, None));
    Ok(())
}

#[test]
fn products_are_found_by_id_or_slug() -> Result<()> {
    let index = demo_index()?;
    let by_slug = index.product("sklenice-medova-250").expect("slug lookup");
    assert_eq!(by_slug.id.as_str(), "s03");
    assert_eq!(index.product("s03").map(|p| p.slug.as_str()), Some("sklenice-medova-250"));
    assert!(index.product("missing").is_none());
    Ok(())
}

#[test]
fn rich_text_descriptions_become_plain_text() -> Result<()> {
    let index = demo_index()?;
    let sklenice = index.category(&CategoryKey::from("sklenice")).expect("category");
    assert_eq!(sklenice.description, "Zavařovací a medové sklenice.");
    let jar = index.product("s03").expect("product");
    assert_eq!(
        jar.description,
        "Šestihranná sklenice na med.\n- objem 250 ml\n- závit TO 66"
    );
    Ok(())
}

#[test]
fn repository_filters_by_category() -> Result<()> {
    let index = demo_index()?;
    let vicka = CategoryKey::from("vicka");
    assert_eq!(index.list_categories().len(), 3);
    let subs: Vec<_> = index
        .list_subcategories(Some(&vicka))
        .into_iter()
        .map(|s| s.key)
        .collect();
    assert_eq!(
        subs,
        vec![
            SubcategoryKey::from("to82"),
            SubcategoryKey::from("to66"),
            SubcategoryKey::from("to100")
        ]
    );
    assert_eq!(index.list_products(Some(&vicka)).len(), 11);
    assert_eq!(index.list_products(None).len(), 17);
    assert_eq!(
        index.get_product("vicko-to66-cerne").map(|p| p.id.to_string()),
        Some("v03".to_string())
    );
    Ok(())
}

#[test]
fn duplicate_category_keys_are_rejected() {
    let doc = snapshot_doc(
        json!([
            {"key": "vicka", "display_name": "A"},
            {"key": "vicka", "display_name": "B"}
        ]),
        json!([]),
        json!([]),
    );
    let err = index_from(doc).unwrap_err();
    assert!(format!("{err:#}").contains("vicka"));
}

#[test]
fn duplicate_product_ids_are_rejected() {
    let doc = snapshot_doc(
        json!([]),
        json!([]),
        json!([
            {"id": "1", "slug": "a", "name": "A"},
            {"id": "1", "slug": "b", "name": "B"}
        ]),
    );
    assert!(index_from(doc).is_err());
}

#[test]
fn empty_catalog_key_is_rejected() {
    let mut doc = snapshot_doc(json!([]), json!([]), json!([]));
    doc["catalog"]["key"] = json!("  ");
    assert!(index_from(doc).is_err());
}

#[test]
fn dangling_parent_is_detached_not_fatal() -> Result<()> {
    let doc = snapshot_doc(
        json!([{"key": "vicka", "display_name": "Víčka"}]),
        json!([{"key": "to82", "parent_category_key": "gone", "display_name": "TO 82"}]),
        json!([{"id": "1", "slug": "a", "name": "A", "subcategory": "to82"}]),
    );
    let index = index_from(doc)?;
    let sub = index.subcategory(&SubcategoryKey::from("to82")).expect("sub");
    assert!(sub.parent_category_key.is_none());
    let product = index.product("1").expect("product");
    assert_eq!(product.category_key, None);
    assert_eq!(product.subcategory_key, Some(SubcategoryKey::from("to82")));
    Ok(())
}

#[test]
fn malformed_relationships_leave_products_loadable() -> Result<()> {
    let doc = snapshot_doc(
        json!([{"key": "vicka", "display_name": "Víčka"}]),
        json!([]),
        json!([{"id": "1", "slug": "a", "name": "A", "category": 42, "subcategory": true}]),
    );
    let index = index_from(doc)?;
    let product = index.product("1").expect("product");
    assert!(product.category_key.is_none());
    assert!(product.subcategory_key.is_none());
    Ok(())
}

#[test]
fn schema_rejects_structurally_invalid_snapshots() -> Result<()> {
    let schema = snapshot_schema()?;
    let mut doc = snapshot_doc(json!([]), json!([]), numbered_products(2, "vicka", &[]));
    schema.validate(&doc)?;

    doc["products"][0]["slug"] = json!(7);
    let err = schema.validate(&doc).unwrap_err();
    assert!(format!("{err:#}").contains("/products/0/slug"));

    let mut wrong_version = snapshot_doc(json!([]), json!([]), json!([]));
    wrong_version["schema_version"] = json!("catalog_snapshot_v0");
    assert!(schema.validate(&wrong_version).is_err());
    Ok(())
}

#[test]
fn load_validated_reads_from_disk() -> Result<()> {
    let doc = snapshot_doc(
        json!([{"key": "vicka", "display_name": "Víčka"}]),
        json!([{"key": "to82", "parent_category_key": "vicka", "display_name": "TO 82"}]),
        numbered_products(3, "vicka", &["to82"]),
    );
    let file = write_temp_json(&doc)?;
    let schema = SnapshotSchema::load(&schema_path(), None)?;
    assert_eq!(schema.version(), "catalog_snapshot_v1");
    let index = CatalogIndex::load_validated(file.path(), &schema)?;
    assert_eq!(index.products().len(), 3);
    assert!(
        index
            .products()
            .iter()
            .all(|p| p.subcategory_key == Some(SubcategoryKey::from("to82")))
    );
    Ok(())
}
