//! Structured (JSON) records of graphs.
//!
//! Records are the serialized form graphs take at the edges of the system:
//! parsed input examples, and the attribution graphs returned by an exported
//! unit. Every feature is stored as `{shape, values}` in row-major order.
//!
//! ```json
//! {
//!   "context": {"h": {"shape": [2], "values": [514, 433]}},
//!   "node_sets": {"node": {"size": 3, "features": {"h": {"shape": [3], "values": [8191, 9474, 1634]}}}},
//!   "edge_sets": {"edge": {
//!     "size": 2,
//!     "adjacency": {"source": ["node", [0, 1]], "target": ["node", [1, 2]]},
//!     "features": {"weight": {"shape": [2], "values": [153, 9]}}
//!   }}
//! }
//! ```

use std::collections::BTreeMap;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::feature::Feature;
use crate::graph::{Adjacency, EdgeSet, FeatureMap, Graph, NodeSet};

/// A feature tensor: logical shape and row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Logical shape, leading dimension first.
    pub shape: Vec<usize>,
    /// Row-major values.
    pub values: Vec<f32>,
}

/// A node set with its features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSetRecord {
    /// Number of nodes.
    pub size: usize,
    /// Features by name.
    #[serde(default)]
    pub features: BTreeMap<String, FeatureRecord>,
}

/// Edge endpoints as `(node set, indices)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyRecord {
    /// Source node set and indices.
    pub source: (String, Vec<usize>),
    /// Target node set and indices.
    pub target: (String, Vec<usize>),
}

/// An edge set with adjacency and features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSetRecord {
    /// Number of edges.
    pub size: usize,
    /// Edge endpoints.
    pub adjacency: AdjacencyRecord,
    /// Features by name.
    #[serde(default)]
    pub features: BTreeMap<String, FeatureRecord>,
}

/// A whole graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Context features by name.
    #[serde(default)]
    pub context: BTreeMap<String, FeatureRecord>,
    /// Node sets by name.
    #[serde(default)]
    pub node_sets: BTreeMap<String, NodeSetRecord>,
    /// Edge sets by name.
    #[serde(default)]
    pub edge_sets: BTreeMap<String, EdgeSetRecord>,
}

impl GraphRecord {
    /// Parse a record from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] on malformed input.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// Serialize the record to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::SerializationError(e.to_string()))
    }
}

impl<B: Backend> Graph<B> {
    /// Build and validate a graph from a record.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is invalid, values do not fit their shape,
    /// a declared size disagrees with the adjacency, or the graph fails
    /// structural validation.
    pub fn from_record(record: &GraphRecord, device: &B::Device) -> Result<Self> {
        let mut builder = Graph::builder();

        for (name, feature) in &record.context {
            builder = builder.context_feature(name, feature_from_record(feature, device)?)?;
        }

        for (name, set) in &record.node_sets {
            let mut node_set = NodeSet::new(set.size);
            for (feature_name, feature) in &set.features {
                node_set = node_set.with_feature(feature_name, feature_from_record(feature, device)?)?;
            }
            builder = builder.node_set(name, node_set)?;
        }

        for (name, set) in &record.edge_sets {
            let adjacency = Adjacency::from_indices(
                (set.adjacency.source.0.as_str(), set.adjacency.source.1.clone()),
                (set.adjacency.target.0.as_str(), set.adjacency.target.1.clone()),
            )?;
            if adjacency.len() != set.size {
                return Err(CoreError::InvalidGraph(format!(
                    "edge set '{}' declares {} edges but lists {}",
                    name,
                    set.size,
                    adjacency.len()
                )));
            }
            let mut edge_set = EdgeSet::new(adjacency);
            for (feature_name, feature) in &set.features {
                edge_set = edge_set.with_feature(feature_name, feature_from_record(feature, device)?)?;
            }
            builder = builder.edge_set(name, edge_set)?;
        }

        builder.build()
    }

    /// Copy the graph to the host as a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] if feature values cannot be read.
    pub fn to_record(&self) -> Result<GraphRecord> {
        let node_sets: BTreeMap<String, NodeSetRecord> = self
            .node_sets()
            .iter()
            .map(|(name, set)| -> Result<(String, NodeSetRecord)> {
                Ok((
                    name.to_string(),
                    NodeSetRecord {
                        size: set.size(),
                        features: features_to_record(set.features())?,
                    },
                ))
            })
            .collect::<Result<_>>()?;

        let edge_sets: BTreeMap<String, EdgeSetRecord> = self
            .edge_sets()
            .iter()
            .map(|(name, set)| -> Result<(String, EdgeSetRecord)> {
                let adjacency = set.adjacency();
                Ok((
                    name.to_string(),
                    EdgeSetRecord {
                        size: set.size(),
                        adjacency: AdjacencyRecord {
                            source: (
                                adjacency.source_set().to_string(),
                                adjacency.source_indices().to_vec(),
                            ),
                            target: (
                                adjacency.target_set().to_string(),
                                adjacency.target_indices().to_vec(),
                            ),
                        },
                        features: features_to_record(set.features())?,
                    },
                ))
            })
            .collect::<Result<_>>()?;

        Ok(GraphRecord {
            context: features_to_record(self.context().features())?,
            node_sets,
            edge_sets,
        })
    }
}

fn feature_from_record<B: Backend>(record: &FeatureRecord, device: &B::Device) -> Result<Feature<B>> {
    Feature::from_values(record.values.clone(), &record.shape, device)
}

fn features_to_record<B: Backend>(features: &FeatureMap<B>) -> Result<BTreeMap<String, FeatureRecord>> {
    features
        .iter()
        .map(|(name, feature)| -> Result<(String, FeatureRecord)> {
            Ok((
                name.to_string(),
                FeatureRecord {
                    shape: feature.dims().to_vec(),
                    values: feature.to_values()?,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    const LINE_GRAPH: &str = r#"{
        "context": {"h": {"shape": [2], "values": [514, 433]}},
        "node_sets": {"node": {"size": 3, "features": {"h": {"shape": [3], "values": [8191, 9474, 1634]}}}},
        "edge_sets": {"edge": {
            "size": 2,
            "adjacency": {"source": ["node", [0, 1]], "target": ["node", [1, 2]]},
            "features": {"weight": {"shape": [2], "values": [153, 9]}}
        }}
    }"#;

    #[test]
    fn test_graph_from_json_record() {
        let device = Default::default();
        let record = GraphRecord::from_json(LINE_GRAPH.as_bytes()).unwrap();
        let graph = Graph::<TestBackend>::from_record(&record, &device).unwrap();

        let edge = graph.edge_set("edge").unwrap();
        assert_eq!(edge.adjacency().source_indices(), &[0, 1]);
        assert_eq!(edge.adjacency().target_indices(), &[1, 2]);
        assert_eq!(
            graph.node_set("node").unwrap().feature("h").unwrap().to_values().unwrap(),
            vec![8191.0, 9474.0, 1634.0]
        );
    }

    #[test]
    fn test_graph_to_record_preserves_structure() {
        let device = Default::default();
        let record = GraphRecord::from_json(LINE_GRAPH.as_bytes()).unwrap();
        let graph = Graph::<TestBackend>::from_record(&record, &device).unwrap();

        assert_eq!(graph.to_record().unwrap(), record);
    }

    #[test]
    fn test_scalar_context_feature_round_trip() {
        let device = Default::default();
        let mut record = GraphRecord::from_json(LINE_GRAPH.as_bytes()).unwrap();
        record.context.insert(
            "label".to_string(),
            FeatureRecord {
                shape: vec![],
                values: vec![1.5],
            },
        );

        let graph = Graph::<TestBackend>::from_record(&record, &device).unwrap();
        let label = graph.context().feature("label").unwrap();
        assert!(label.dims().is_empty());
        assert_eq!(label.tensor().dims(), [1, 1]);

        assert_eq!(graph.to_record().unwrap(), record);
    }

    #[test]
    fn test_record_size_disagrees_with_adjacency() {
        let device = Default::default();
        let mut record = GraphRecord::from_json(LINE_GRAPH.as_bytes()).unwrap();
        record.edge_sets.get_mut("edge").unwrap().size = 3;

        let result = Graph::<TestBackend>::from_record(&record, &device);
        assert!(matches!(result, Err(CoreError::InvalidGraph(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = GraphRecord::from_json(b"{\"context\": 3}");
        assert!(matches!(result, Err(CoreError::SerializationError(_))));
    }
}
