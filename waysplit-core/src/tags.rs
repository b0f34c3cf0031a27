//! Way tag-sets and the keys the engine recognises.
//!
//! Provides helpers to:
//! - read the classification (`highway`), `name` and `oneway` tags; and
//! - collect borrowed key/value pairs into an owned tag-set.
use std::collections::BTreeMap;

/// Key whose presence makes a polyline a highway.
pub const CLASSIFICATION_KEY: &str = "highway";
/// Optional human-readable name.
pub const NAME_KEY: &str = "name";
/// Optional one-directional flag.
pub const ONEWAY_KEY: &str = "oneway";

/// OpenStreetMap-style key/value tags attached to a way.
///
/// Keys are kept ordered so tag-sets serialise deterministically.
///
/// # Examples
/// ```
/// use waysplit_core::Tags;
///
/// let tags = Tags::from_pairs([("highway", "residential"), ("oneway", "yes")]);
/// assert_eq!(tags.classification(), Some("residential"));
/// assert!(tags.is_oneway());
/// assert_eq!(tags.name(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Create an empty tag-set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Collect borrowed pairs, as yielded by OSM readers, into owned tags.
    pub fn from_pairs<'a, T>(pairs: T) -> Self
    where
        T: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect()
    }

    /// Insert a tag, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a tag value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of the classification tag, if any.
    #[must_use]
    pub fn classification(&self) -> Option<&str> {
        self.get(CLASSIFICATION_KEY)
    }

    /// Whether the classification tag is present.
    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.0.contains_key(CLASSIFICATION_KEY)
    }

    /// Value of the `name` tag, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY)
    }

    /// Only the literal value `yes` marks a way as one-directional.
    #[must_use]
    pub fn is_oneway(&self) -> bool {
        self.get(ONEWAY_KEY) == Some("yes")
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tag-set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Returns true when any key classifies the element as a highway.
pub fn has_classification<'a, T>(tags: T) -> bool
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter().any(|(key, _)| key == CLASSIFICATION_KEY)
}

impl FromIterator<(String, String)> for Tags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for Tags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
