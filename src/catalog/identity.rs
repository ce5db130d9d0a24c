//! Canonical identifiers shared by every backend.
//!
//! Backends hand out UUIDs, numeric ids or slug paths; by the time a value is
//! wrapped in one of these newtypes it is just an opaque string key.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_key!(
    /// Key of a top-level category (slug or numeric id, backend dependent).
    CategoryKey
);
string_key!(
    /// Key of a subcategory.
    SubcategoryKey
);
string_key!(
    /// Product identifier; unique within a snapshot.
    ProductId
);
string_key!(
    /// Key naming the snapshot itself (`catalog.key`).
    CatalogKey
);
