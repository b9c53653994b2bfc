//! Feature types: a polygon geometry plus an ordered attribute payload.
//!
//! Both targets (roof footprints) and references (cadastral parcels) are
//! represented as [`Feature`]s. Attributes are opaque to the alignment core;
//! they pass through unmodified except for the result fields the pipeline
//! appends to each output target.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// A scalar attribute value.
///
/// Covers the value types that survive a round trip through the tabular
/// formats upstream loaders produce (shapefile/GeoPackage fields).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Text field
    Str(String),
    /// Integer field
    Int(i64),
    /// Floating-point field
    Float(f64),
    /// Boolean field
    Bool(bool),
    /// Missing value
    Null,
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

/// An ordered string → scalar mapping.
///
/// Preserves insertion order (attribute column order matters to downstream
/// writers). Duplicate keys are last-write-wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set a value, replacing any existing entry with the same key.
    ///
    /// A replaced entry keeps its original position; a new key is appended.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

/// One target or reference record: a geometry plus its attribute payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// Planar polygon geometry (possibly multi-part), metric coordinates.
    pub geometry: MultiPolygon<f64>,
    /// Opaque attribute payload.
    pub attributes: Attributes,
}

impl Feature {
    /// Create a feature with an empty attribute map.
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            attributes: Attributes::new(),
        }
    }

    /// Create a feature with attributes.
    pub fn with_attributes(geometry: MultiPolygon<f64>, attributes: Attributes) -> Self {
        Self {
            geometry,
            attributes,
        }
    }
}

/// An immutable collection of features, optionally tagged with its CRS.
///
/// The CRS tag exists only so the pipeline can fail fast when target and
/// reference collections disagree. The core itself treats coordinates as
/// dimensionless real pairs; reprojection is an upstream concern.
#[derive(Clone, Debug, Default)]
pub struct FeatureCollection {
    /// CRS identifier as reported by the loader (e.g. "EPSG:2154").
    pub crs: Option<String>,
    /// The features, in load order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create an untagged collection.
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            crs: None,
            features,
        }
    }

    /// Create a collection tagged with its CRS.
    pub fn with_crs(features: Vec<Feature>, crs: impl Into<String>) -> Self {
        Self {
            crs: Some(crs.into()),
            features,
        }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_preserve_insertion_order() {
        let mut attrs = Attributes::new();
        attrs.set("nom", "Lyon");
        attrs.set("surface", 120.5);
        attrs.set("etages", 3i64);

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["nom", "surface", "etages"]);
    }

    #[test]
    fn test_attributes_overwrite_keeps_position() {
        let mut attrs = Attributes::new();
        attrs.set("a", 1i64);
        attrs.set("b", 2i64);
        attrs.set("a", 9i64);

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(attrs.get("a"), Some(&AttrValue::Int(9)));
    }

    #[test]
    fn test_attributes_get_missing() {
        let attrs = Attributes::new();
        assert_eq!(attrs.get("missing"), None);
    }
}
