use std::fmt;

use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A product detail page normalized into a flat record.
///
/// Only `product_code` and `url` are guaranteed. Every other field is absent
/// when the page does not show it (e.g. no price on "quote required" items).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The vendor catalog number that was searched for, e.g. `"76181-190"`.
    pub product_code: String,
    pub product_name: Option<String>,
    pub model_number: Option<String>,
    pub description: Option<String>,
    /// Numeric price with thousands separators removed, e.g. `"1234.50"`.
    pub price: Option<Decimal>,
    /// Currency as printed on the page: an ISO code (`"USD"`) or a symbol (`"$"`).
    pub currency: Option<String>,
    pub specifications: Specifications,
    pub availability: Option<String>,
    /// URL of the product page the record was extracted from.
    pub url: String,
}

/// Key/value attribute table scraped from a product page.
///
/// Keys are unique and keep the order in which they were first seen on the
/// page. Inserting an existing key overwrites its value in place, so the
/// last value on the page wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specifications {
    entries: Vec<(String, String)>,
}

impl Specifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive lookup, used for loosely labelled attributes such
    /// as `"Model No."` versus `"model no."`.
    #[must_use]
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Folds `other` into `self`, overwriting duplicates.
    pub fn extend(&mut self, other: Specifications) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Specifications {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut specs = Specifications::new();
        for (k, v) in iter {
            specs.insert(k, v);
        }
        specs
    }
}

impl Serialize for Specifications {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Specifications {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecsVisitor;

        impl<'de> Visitor<'de> for SpecsVisitor {
            type Value = Specifications;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of specification names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut specs = Specifications::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    specs.insert(k, v);
                }
                Ok(specs)
            }
        }

        deserializer.deserialize_map(SpecsVisitor)
    }
}
