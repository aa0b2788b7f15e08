//! Size-independent graph schemas.
//!
//! A [`GraphSchema`] describes which sets and features a graph carries and the
//! per-item shape of each feature, without sizes or adjacency indices. Models
//! and record parsers declare schemas so an exporter can check, before
//! writing anything, that every graph the parser emits can be consumed by the
//! model.

use std::collections::BTreeMap;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::feature::Feature;
use crate::name::Name;

/// Per-item shape of a feature (its logical shape without the item dimension).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Trailing dimensions; empty for one scalar per item.
    #[serde(default)]
    pub item_dims: Vec<usize>,
}

impl FeatureSchema {
    /// Schema for features with `item_dims` values per item.
    #[must_use]
    pub fn new(item_dims: Vec<usize>) -> Self {
        Self { item_dims }
    }

    /// One scalar per item.
    #[must_use]
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Schema of an existing feature.
    pub fn of<B: Backend>(feature: &Feature<B>) -> Self {
        Self::new(feature.item_dims().to_vec())
    }
}

/// Schema of a node set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSetSchema {
    /// Feature schemas by name.
    #[serde(default)]
    pub features: BTreeMap<Name, FeatureSchema>,
}

/// Schema of an edge set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSetSchema {
    /// Node set the edges start from.
    pub source: Name,
    /// Node set the edges point to.
    pub target: Name,
    /// Feature schemas by name.
    #[serde(default)]
    pub features: BTreeMap<Name, FeatureSchema>,
}

/// Schema of a whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Context feature schemas by name.
    #[serde(default)]
    pub context: BTreeMap<Name, FeatureSchema>,
    /// Node set schemas by name.
    #[serde(default)]
    pub node_sets: BTreeMap<Name, NodeSetSchema>,
    /// Edge set schemas by name.
    #[serde(default)]
    pub edge_sets: BTreeMap<Name, EdgeSetSchema>,
}

impl GraphSchema {
    /// Check that graphs of schema `produced` can be fed where `self` is expected.
    ///
    /// The schemas must agree exactly: same set names, same adjacency
    /// endpoints, same feature names and per-item shapes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TopologyMismatch`] describing the first difference.
    pub fn check_accepts(&self, produced: &GraphSchema) -> Result<()> {
        compare_features("context", &self.context, &produced.context)?;

        same_keys("node sets", &self.node_sets, &produced.node_sets)?;
        for (name, expected) in &self.node_sets {
            let got = &produced.node_sets[name];
            compare_features(&format!("nodes/{}", name), &expected.features, &got.features)?;
        }

        same_keys("edge sets", &self.edge_sets, &produced.edge_sets)?;
        for (name, expected) in &self.edge_sets {
            let got = &produced.edge_sets[name];
            if expected.source != got.source || expected.target != got.target {
                return Err(CoreError::TopologyMismatch(format!(
                    "edge set '{}' connects {} -> {}, expected {} -> {}",
                    name, got.source, got.target, expected.source, expected.target
                )));
            }
            compare_features(&format!("edges/{}", name), &expected.features, &got.features)?;
        }

        Ok(())
    }

    /// Load a schema from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::SerializationError(e.to_string()))
    }
}

fn same_keys<V>(what: &str, expected: &BTreeMap<Name, V>, got: &BTreeMap<Name, V>) -> Result<()> {
    if expected.keys().ne(got.keys()) {
        return Err(CoreError::TopologyMismatch(format!(
            "{}: expected {:?}, got {:?}",
            what,
            expected.keys().map(Name::as_str).collect::<Vec<_>>(),
            got.keys().map(Name::as_str).collect::<Vec<_>>()
        )));
    }
    Ok(())
}

fn compare_features(
    owner: &str,
    expected: &BTreeMap<Name, FeatureSchema>,
    got: &BTreeMap<Name, FeatureSchema>,
) -> Result<()> {
    same_keys(&format!("{} features", owner), expected, got)?;
    for (name, schema) in expected {
        if schema != &got[name] {
            return Err(CoreError::TopologyMismatch(format!(
                "{}/{}: expected item shape {:?}, got {:?}",
                owner, name, schema.item_dims, got[name].item_dims
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_SCHEMA: &str = r#"{
        "context": {"h": {}},
        "node_sets": {"node": {"features": {"h": {}}}},
        "edge_sets": {
            "edge": {"source": "node", "target": "node", "features": {"weight": {}}}
        }
    }"#;

    #[test]
    fn test_schema_from_json() {
        let schema = GraphSchema::from_json(LINE_SCHEMA).unwrap();
        assert_eq!(schema.context.len(), 1);
        assert_eq!(schema.edge_sets["edge"].source.as_str(), "node");
        assert_eq!(schema.node_sets["node"].features["h"], FeatureSchema::scalar());
    }

    #[test]
    fn test_schema_accepts_itself() {
        let schema = GraphSchema::from_json(LINE_SCHEMA).unwrap();
        assert!(schema.check_accepts(&schema).is_ok());
    }

    #[test]
    fn test_schema_rejects_item_shape() {
        let expected = GraphSchema::from_json(LINE_SCHEMA).unwrap();
        let mut produced = expected.clone();
        produced
            .node_sets
            .get_mut("node")
            .unwrap()
            .features
            .insert(Name::new("h").unwrap(), FeatureSchema::new(vec![4]));

        assert!(matches!(
            expected.check_accepts(&produced),
            Err(CoreError::TopologyMismatch(_))
        ));
    }

    #[test]
    fn test_schema_rejects_missing_edge_set() {
        let expected = GraphSchema::from_json(LINE_SCHEMA).unwrap();
        let mut produced = expected.clone();
        produced.edge_sets.clear();

        assert!(matches!(
            expected.check_accepts(&produced),
            Err(CoreError::TopologyMismatch(_))
        ));
    }

    #[test]
    fn test_schema_rejects_reserved_names() {
        let result = GraphSchema::from_json(r##"{"context": {"#size": {}}}"##);
        assert!(matches!(result, Err(CoreError::SerializationError(_))));
    }
}
