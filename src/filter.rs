//! Category scoping for resolved products.

use crate::catalog::{Category, CategoryKey, Product, Subcategory, SubcategoryKey};
use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::BTreeSet;

/// How the subcategory filter controls are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubcategoryListing {
    /// Only subcategories referenced by at least one product in the category.
    #[default]
    UsedOnly,
    /// Every subcategory defined for the category.
    ShowAll,
}

impl SubcategoryListing {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubcategoryListing::UsedOnly => "used",
            SubcategoryListing::ShowAll => "all",
        }
    }
}

impl TryFrom<&str> for SubcategoryListing {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "used" | "used-only" => Ok(SubcategoryListing::UsedOnly),
            "all" | "show-all" => Ok(SubcategoryListing::ShowAll),
            other => bail!("unknown subcategory listing '{other}' (expected 'used' or 'all')"),
        }
    }
}

/// Products in scope plus the subcategories to offer as filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filtered<'a> {
    pub items: Vec<&'a Product>,
    pub active_subcategories: Vec<&'a Subcategory>,
}

pub struct CatalogFilter<'a> {
    categories: &'a [Category],
    subcategories: &'a [Subcategory],
    listing: SubcategoryListing,
}

impl<'a> CatalogFilter<'a> {
    pub fn new(
        categories: &'a [Category],
        subcategories: &'a [Subcategory],
        listing: SubcategoryListing,
    ) -> Self {
        Self {
            categories,
            subcategories,
            listing,
        }
    }

    /// Scope `products` to `category` and optionally `subcategory`.
    ///
    /// Input order is preserved. An unknown category yields an empty result.
    /// Subcategory usage is measured over the whole category, so the filter
    /// controls do not collapse while a subcategory is selected.
    pub fn apply(
        &self,
        products: &'a [Product],
        category: &CategoryKey,
        subcategory: Option<&SubcategoryKey>,
    ) -> Filtered<'a> {
        if !self.categories.iter().any(|c| &c.key == category) {
            return Filtered::default();
        }

        let in_category: Vec<&'a Product> = products
            .iter()
            .filter(|product| product.category_key.as_ref() == Some(category))
            .collect();

        let used: BTreeSet<&SubcategoryKey> = in_category
            .iter()
            .filter_map(|product| product.subcategory_key.as_ref())
            .collect();

        let active_subcategories = self
            .subcategories
            .iter()
            .filter(|sub| match &sub.parent_category_key {
                Some(parent) => parent == category,
                None => used.contains(&sub.key),
            })
            .filter(|sub| match self.listing {
                SubcategoryListing::ShowAll => true,
                SubcategoryListing::UsedOnly => used.contains(&sub.key),
            })
            .collect();

        let items = match subcategory {
            Some(selected) => in_category
                .into_iter()
                .filter(|product| product.subcategory_key.as_ref() == Some(selected))
                .collect(),
            None => in_category,
        };

        Filtered {
            items,
            active_subcategories,
        }
    }
}
