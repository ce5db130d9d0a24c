//! Relationship resolution.
//!
//! Backends link products to the catalog tree in incompatible ways: plain
//! foreign keys, CMS reference objects carrying a slug path, lists of such
//! references, or nothing at all. [`Resolver`] tries each strategy in a fixed
//! priority order and returns the first match as canonical keys. It never
//! fails; a product nothing matches is simply uncategorized.

use crate::catalog::{
    AllowList, Category, CategoryKey, MalformedRelationship, ProductRecord, RawRelation,
    RelationFields, RelationRef, Subcategory, SubcategoryKey,
};
use serde::Serialize;
use std::collections::HashMap;

/// Which strategy produced a [`Resolution`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    Literal,
    Reference,
    ReferenceList,
    AllowList,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub category_key: Option<CategoryKey>,
    pub subcategory_key: Option<SubcategoryKey>,
    pub strategy: Option<ResolutionStrategy>,
}

impl Resolution {
    pub fn is_uncategorized(&self) -> bool {
        self.category_key.is_none() && self.subcategory_key.is_none()
    }
}

type Strategy<'a> = fn(&Resolver<'a>, &RelationFields) -> Option<Resolution>;

/// Lookup tables over one category/subcategory snapshot.
pub struct Resolver<'a> {
    categories: HashMap<&'a str, &'a Category>,
    subcategories: HashMap<&'a str, &'a Subcategory>,
    allow_list: &'a AllowList,
}

impl<'a> Resolver<'a> {
    pub fn new(
        categories: &'a [Category],
        subcategories: &'a [Subcategory],
        allow_list: &'a AllowList,
    ) -> Self {
        let mut category_map = HashMap::with_capacity(categories.len());
        for category in categories {
            category_map.entry(category.key.as_str()).or_insert(category);
        }
        let mut subcategory_map = HashMap::with_capacity(subcategories.len());
        for subcategory in subcategories {
            subcategory_map
                .entry(subcategory.key.as_str())
                .or_insert(subcategory);
        }
        Self {
            categories: category_map,
            subcategories: subcategory_map,
            allow_list,
        }
    }

    /// Classify and resolve a raw record in one step.
    ///
    /// Shape diagnostics are returned for the caller to report.
    pub fn resolve_record(
        &self,
        record: &ProductRecord,
    ) -> (Resolution, Vec<MalformedRelationship>) {
        let (fields, malformed) = record.relation_fields();
        (self.resolve(&fields), malformed)
    }

    /// The first strategy that matches decides the placement. When it only
    /// found a category, later strategies may still supply a subcategory that
    /// agrees with it.
    pub fn resolve(&self, fields: &RelationFields) -> Resolution {
        let strategies: [Strategy<'a>; 4] = [
            Self::by_literal,
            Self::by_reference,
            Self::by_reference_list,
            Self::by_allow_list,
        ];
        let mut matches = strategies
            .into_iter()
            .filter_map(|strategy| strategy(self, fields));
        let Some(mut resolution) = matches.next() else {
            return Resolution::default();
        };
        if resolution.subcategory_key.is_none() {
            resolution.subcategory_key = matches.find_map(|later| {
                let agrees = later.category_key.is_none()
                    || later.category_key == resolution.category_key;
                later.subcategory_key.filter(|_| agrees)
            });
        }
        resolution
    }

    fn by_literal(&self, fields: &RelationFields) -> Option<Resolution> {
        let category = match &fields.category {
            RawRelation::Literal(key) => self.category(key),
            _ => None,
        };
        let subcategory = match &fields.subcategory {
            RawRelation::Literal(key) => self.subcategory(key),
            _ => None,
        };
        combine(category, subcategory, ResolutionStrategy::Literal)
    }

    fn by_reference(&self, fields: &RelationFields) -> Option<Resolution> {
        let category_ref = match &fields.category {
            RawRelation::Reference(reference) => Some(reference),
            _ => None,
        };
        let subcategory_ref = match &fields.subcategory {
            RawRelation::Reference(reference) => Some(reference),
            _ => None,
        };
        self.from_refs(category_ref, subcategory_ref, ResolutionStrategy::Reference)
    }

    // Only the head of each list is consulted.
    fn by_reference_list(&self, fields: &RelationFields) -> Option<Resolution> {
        let category_ref = match &fields.category {
            RawRelation::ReferenceList(refs) => refs.first(),
            _ => None,
        };
        let subcategory_ref = match &fields.subcategory {
            RawRelation::ReferenceList(refs) => refs.first(),
            _ => None,
        };
        self.from_refs(
            category_ref,
            subcategory_ref,
            ResolutionStrategy::ReferenceList,
        )
    }

    fn by_allow_list(&self, fields: &RelationFields) -> Option<Resolution> {
        if !fields.category.is_absent() || !fields.subcategory.is_absent() {
            return None;
        }
        let path = fields.path.as_deref()?;
        for segment in path_segments(path).iter().rev() {
            let known_parent = self
                .subcategory(segment)
                .and_then(|sub| sub.parent_category_key.as_ref());
            let category = self
                .allow_list
                .categories_allowing(segment)
                .filter(|key| known_parent.is_none_or(|parent| parent == *key))
                .find_map(|key| self.category(key.as_str()));
            if let Some(category) = category {
                return Some(Resolution {
                    category_key: Some(category.key.clone()),
                    subcategory_key: Some(SubcategoryKey::from(*segment)),
                    strategy: Some(ResolutionStrategy::AllowList),
                });
            }
        }
        None
    }

    fn from_refs(
        &self,
        category_ref: Option<&RelationRef>,
        subcategory_ref: Option<&RelationRef>,
        strategy: ResolutionStrategy,
    ) -> Option<Resolution> {
        let (path_category, subcategory) = subcategory_ref
            .map(|reference| self.subcategory_ref(reference))
            .unwrap_or_default();
        let category = category_ref
            .and_then(|reference| self.category_ref(reference))
            .or(path_category);
        combine(category, subcategory, strategy)
    }

    // `.../<category>/<subcategory>`, tried as the scoped key `<category>/<subcategory>`
    // before the bare one; a single segment is a bare subcategory key.
    fn subcategory_ref(
        &self,
        reference: &RelationRef,
    ) -> (Option<&'a Category>, Option<&'a Subcategory>) {
        if let Some(path) = reference.path.as_deref() {
            let segments = path_segments(path);
            let found = match segments.as_slice() {
                [] => (None, None),
                [only] => (None, self.subcategory(only)),
                [.., category, subcategory] => {
                    let scoped = format!("{category}/{subcategory}");
                    (
                        self.category(category),
                        self.subcategory(&scoped)
                            .or_else(|| self.subcategory(subcategory)),
                    )
                }
            };
            if found.0.is_some() || found.1.is_some() {
                return found;
            }
        }
        let by_id = reference.id.as_deref().and_then(|id| self.subcategory(id));
        (None, by_id)
    }

    fn category_ref(&self, reference: &RelationRef) -> Option<&'a Category> {
        reference
            .path
            .as_deref()
            .and_then(|path| path_segments(path).last().copied())
            .and_then(|segment| self.category(segment))
            .or_else(|| reference.id.as_deref().and_then(|id| self.category(id)))
    }

    fn category(&self, key: &str) -> Option<&'a Category> {
        self.categories.get(key).copied()
    }

    fn subcategory(&self, key: &str) -> Option<&'a Subcategory> {
        self.subcategories.get(key).copied()
    }
}

// An explicit category wins over a subcategory whose known parent disagrees.
fn combine(
    category: Option<&Category>,
    subcategory: Option<&Subcategory>,
    strategy: ResolutionStrategy,
) -> Option<Resolution> {
    if category.is_none() && subcategory.is_none() {
        return None;
    }
    let subcategory = subcategory.filter(|sub| match (category, &sub.parent_category_key) {
        (Some(category), Some(parent)) => &category.key == parent,
        _ => true,
    });
    let category_key = category
        .map(|c| c.key.clone())
        .or_else(|| subcategory.and_then(|sub| sub.parent_category_key.clone()));
    Some(Resolution {
        category_key,
        subcategory_key: subcategory.map(|sub| sub.key.clone()),
        strategy: Some(strategy),
    })
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}
