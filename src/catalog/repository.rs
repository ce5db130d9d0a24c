//! Backend-neutral read interface over a catalog.
//!
//! Any adapter (CMS content delivery, relational resource API, local
//! database) can sit behind [`CatalogRepository`]; the view layer only needs
//! these four reads. [`CatalogIndex`] is the in-memory implementation used
//! once a snapshot has been materialized.

use crate::catalog::{CatalogIndex, Category, CategoryKey, Product, Subcategory};

pub trait CatalogRepository {
    fn list_categories(&self) -> Vec<Category>;

    /// Subcategories, optionally restricted to one parent category.
    fn list_subcategories(&self, category: Option<&CategoryKey>) -> Vec<Subcategory>;

    /// Products in snapshot order, optionally restricted to one category.
    fn list_products(&self, category: Option<&CategoryKey>) -> Vec<Product>;

    /// Look a product up by id, falling back to slug.
    fn get_product(&self, id_or_slug: &str) -> Option<Product>;
}

impl CatalogRepository for CatalogIndex {
    fn list_categories(&self) -> Vec<Category> {
        self.categories().to_vec()
    }

    fn list_subcategories(&self, category: Option<&CategoryKey>) -> Vec<Subcategory> {
        self.subcategories()
            .iter()
            .filter(|sub| category.is_none() || sub.parent_category_key.as_ref() == category)
            .cloned()
            .collect()
    }

    fn list_products(&self, category: Option<&CategoryKey>) -> Vec<Product> {
        self.products()
            .iter()
            .filter(|product| category.is_none() || product.category_key.as_ref() == category)
            .cloned()
            .collect()
    }

    fn get_product(&self, id_or_slug: &str) -> Option<Product> {
        self.product(id_or_slug).cloned()
    }
}
