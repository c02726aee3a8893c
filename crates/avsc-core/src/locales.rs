//! Country/locale values captured from the vendor's country popup.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A vendor site variant, e.g. `"USA"` served under `/us/`.
///
/// Identity is the `name`; two locales with the same name are the same
/// locale regardless of region or URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub name: String,
    /// Heading of the popup column the locale was listed under, e.g. `"Europe"`.
    /// Empty when the locale was inferred from a URL rather than the popup.
    pub region_label: String,
    /// Absent for disabled placeholder entries that carry no `href`.
    pub url: Option<String>,
}

impl Locale {
    /// Case-insensitive identity comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

/// One popup column: a region heading and its locales in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub label: String,
    pub locales: Vec<Locale>,
}

/// Locales grouped by region, in the order they appear in the popup.
///
/// Every locale appears in exactly one region: [`CountryIndex::insert`]
/// refuses a name that is already present anywhere in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryIndex {
    regions: Vec<Region>,
}

/// Flat `{region, country, url}` row used for the flat country list artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatCountry {
    pub region: String,
    pub country: String,
    pub url: Option<String>,
}

/// `{country, url}` entry as persisted under each region key.
#[derive(Serialize, Deserialize)]
struct CountryEntry {
    country: String,
    url: Option<String>,
}

impl CountryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `locale` under its `region_label`, creating the region on first use.
    ///
    /// Returns `false` (and leaves the index untouched) when a locale with the
    /// same name is already indexed.
    pub fn insert(&mut self, locale: Locale) -> bool {
        if self.find(&locale.name).is_some() {
            return false;
        }
        match self
            .regions
            .iter_mut()
            .find(|r| r.label == locale.region_label)
        {
            Some(region) => region.locales.push(locale),
            None => self.regions.push(Region {
                label: locale.region_label.clone(),
                locales: vec![locale],
            }),
        }
        true
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn region(&self, label: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.label == label)
    }

    /// Looks a locale up by name, ignoring ASCII case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Locale> {
        self.regions
            .iter()
            .flat_map(|r| r.locales.iter())
            .find(|l| l.is_named(name))
    }

    /// Total number of locales across all regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.iter().map(|r| r.locales.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn flatten(&self) -> Vec<FlatCountry> {
        self.regions
            .iter()
            .flat_map(|r| {
                r.locales.iter().map(|l| FlatCountry {
                    region: r.label.clone(),
                    country: l.name.clone(),
                    url: l.url.clone(),
                })
            })
            .collect()
    }
}

impl Serialize for CountryIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.regions.len()))?;
        for region in &self.regions {
            let entries: Vec<CountryEntry> = region
                .locales
                .iter()
                .map(|l| CountryEntry {
                    country: l.name.clone(),
                    url: l.url.clone(),
                })
                .collect();
            map.serialize_entry(&region.label, &entries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CountryIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IndexVisitor;

        impl<'de> Visitor<'de> for IndexVisitor {
            type Value = CountryIndex;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of region labels to lists of {country, url}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut index = CountryIndex::new();
                while let Some((label, entries)) =
                    access.next_entry::<String, Vec<CountryEntry>>()?
                {
                    for entry in entries {
                        index.insert(Locale {
                            name: entry.country,
                            region_label: label.clone(),
                            url: entry.url,
                        });
                    }
                }
                Ok(index)
            }
        }

        deserializer.deserialize_map(IndexVisitor)
    }
}
