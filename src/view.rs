//! Page composition over a resolved catalog.
//!
//! [`CatalogViewState`] is owned by the caller (one per page load or CLI
//! invocation) and threaded through [`category_page`]; nothing here keeps
//! state between calls.

use crate::catalog::{CatalogIndex, Category, CategoryKey, Product, Subcategory, SubcategoryKey};
use crate::filter::{CatalogFilter, SubcategoryListing};
use crate::paginate::{PageSize, PageView, paginate};
use serde::{Deserialize, Serialize};

/// Upper bound on "similar products" shown on a product page.
pub const SIMILAR_PRODUCTS_LIMIT: usize = 6;

/// Description length on product cards.
pub const CARD_EXCERPT_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub page_size: PageSize,
    pub listing: SubcategoryListing,
}

/// What the visitor currently looks at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogViewState {
    pub category: Option<CategoryKey>,
    pub subcategory: Option<SubcategoryKey>,
    pub page: i64,
}

impl Default for CatalogViewState {
    fn default() -> Self {
        Self {
            category: None,
            subcategory: None,
            page: 1,
        }
    }
}

impl CatalogViewState {
    pub fn for_category(category: CategoryKey) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Switch category; clears the subcategory filter and rewinds to page 1.
    pub fn select_category(&mut self, category: CategoryKey) {
        self.category = Some(category);
        self.subcategory = None;
        self.page = 1;
    }

    /// Pick a subcategory filter (`None` = all) and rewind to page 1.
    pub fn select_subcategory(&mut self, subcategory: Option<SubcategoryKey>) {
        self.subcategory = subcategory;
        self.page = 1;
    }

    /// Store the requested page as-is; pagination clamps it.
    pub fn go_to_page(&mut self, page: i64) {
        self.page = page;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryPage<'a> {
    /// Key the page was rendered for, after the first-category fallback.
    pub category_key: Option<CategoryKey>,
    /// `None` when the key does not name a known category.
    pub category: Option<&'a Category>,
    pub subcategories: Vec<&'a Subcategory>,
    pub selected_subcategory: Option<SubcategoryKey>,
    pub page: PageView<&'a Product>,
}

/// Resolve the state into one page of products plus filter controls.
///
/// A state without a category falls back to the snapshot's first category.
pub fn category_page<'a>(
    index: &'a CatalogIndex,
    state: &CatalogViewState,
    options: ViewOptions,
) -> CategoryPage<'a> {
    let category_key = state
        .category
        .clone()
        .or_else(|| index.categories().first().map(|c| c.key.clone()));

    let filtered = category_key
        .as_ref()
        .map(|key| {
            CatalogFilter::new(index.categories(), index.subcategories(), options.listing).apply(
                index.products(),
                key,
                state.subcategory.as_ref(),
            )
        })
        .unwrap_or_default();

    CategoryPage {
        category: category_key.as_ref().and_then(|key| index.category(key)),
        category_key,
        subcategories: filtered.active_subcategories,
        selected_subcategory: state.subcategory.clone(),
        page: paginate(&filtered.items, options.page_size, state.page),
    }
}

/// Listing-sized projection of a product.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductCard<'a> {
    pub id: &'a str,
    pub slug: &'a str,
    pub name: &'a str,
    pub excerpt: Option<String>,
    pub image_url: Option<&'a str>,
    pub price: Option<f64>,
}

impl<'a> From<&'a Product> for ProductCard<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            id: product.id.as_str(),
            slug: &product.slug,
            name: &product.name,
            excerpt: product.excerpt(CARD_EXCERPT_CHARS),
            image_url: product.image_url.as_deref(),
            price: product.price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductDetail<'a> {
    pub product: &'a Product,
    pub category: Option<&'a Category>,
    pub subcategory: Option<&'a Subcategory>,
    pub similar: Vec<&'a Product>,
}

/// Product page data: the product, its placement, and products sharing its
/// subcategory.
pub fn product_detail<'a>(index: &'a CatalogIndex, id_or_slug: &str) -> Option<ProductDetail<'a>> {
    let product = index.product(id_or_slug)?;
    let similar = match &product.subcategory_key {
        Some(subcategory) => index
            .products()
            .iter()
            .filter(|other| other.id != product.id)
            .filter(|other| other.subcategory_key.as_ref() == Some(subcategory))
            .take(SIMILAR_PRODUCTS_LIMIT)
            .collect(),
        None => Vec::new(),
    };
    Some(ProductDetail {
        product,
        category: product
            .category_key
            .as_ref()
            .and_then(|key| index.category(key)),
        subcategory: product
            .subcategory_key
            .as_ref()
            .and_then(|key| index.subcategory(key)),
        similar,
    })
}
