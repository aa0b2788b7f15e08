//! Immutable graph values: context, node sets and edge sets with features.

use std::collections::BTreeMap;
use std::fmt;

use burn::prelude::*;

use crate::error::{CoreError, Result};
use crate::feature::Feature;
use crate::name::Name;
use crate::schema::{EdgeSetSchema, FeatureSchema, GraphSchema, NodeSetSchema};

/// Named features of one graph piece, in name order.
pub type FeatureMap<B> = BTreeMap<Name, Feature<B>>;

/// Location of a feature inside a graph.
///
/// Ordering follows graph traversal order: context features first, then node
/// set features, then edge set features, each sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeaturePath {
    /// A context feature.
    Context(Name),
    /// A feature of a node set: `(set, feature)`.
    Node(Name, Name),
    /// A feature of an edge set: `(set, feature)`.
    Edge(Name, Name),
}

impl FeaturePath {
    /// The feature name, without the owning set.
    #[must_use]
    pub fn feature(&self) -> &Name {
        match self {
            Self::Context(f) | Self::Node(_, f) | Self::Edge(_, f) => f,
        }
    }
}

impl fmt::Display for FeaturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(name) => write!(f, "context/{}", name),
            Self::Node(set, name) => write!(f, "nodes/{}/{}", set, name),
            Self::Edge(set, name) => write!(f, "edges/{}/{}", set, name),
        }
    }
}

/// Graph-wide features.
#[derive(Debug, Clone)]
pub struct Context<B: Backend> {
    features: FeatureMap<B>,
}

impl<B: Backend> Context<B> {
    /// Get a feature by name.
    pub fn feature(&self, name: &str) -> Option<&Feature<B>> {
        self.features.get(name)
    }

    /// All features in name order.
    pub fn features(&self) -> &FeatureMap<B> {
        &self.features
    }
}

/// A set of nodes with per-node features.
#[derive(Debug, Clone)]
pub struct NodeSet<B: Backend> {
    size: usize,
    features: FeatureMap<B>,
}

impl<B: Backend> NodeSet<B> {
    /// Create a node set with `size` nodes and no features.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            features: BTreeMap::new(),
        }
    }

    /// Add a feature shaped `[size, ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already used.
    pub fn with_feature(mut self, name: &str, feature: Feature<B>) -> Result<Self> {
        insert_feature(&mut self.features, name, feature)?;
        Ok(self)
    }

    /// Number of nodes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Get a feature by name.
    pub fn feature(&self, name: &str) -> Option<&Feature<B>> {
        self.features.get(name)
    }

    /// All features in name order.
    pub fn features(&self) -> &FeatureMap<B> {
        &self.features
    }
}

/// Source and target node indices of the edges in an edge set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    source_set: Name,
    source: Vec<usize>,
    target_set: Name,
    target: Vec<usize>,
}

impl Adjacency {
    /// Create an adjacency from `(node set, indices)` pairs for sources and targets.
    ///
    /// # Errors
    ///
    /// Returns an error if a set name is invalid or the index lists differ in length.
    pub fn from_indices(
        source: (&str, Vec<usize>),
        target: (&str, Vec<usize>),
    ) -> Result<Self> {
        if source.1.len() != target.1.len() {
            return Err(CoreError::InvalidGraph(format!(
                "adjacency has {} sources but {} targets",
                source.1.len(),
                target.1.len()
            )));
        }
        Ok(Self {
            source_set: Name::new(source.0)?,
            source: source.1,
            target_set: Name::new(target.0)?,
            target: target.1,
        })
    }

    /// Name of the node set edges start from.
    #[must_use]
    pub fn source_set(&self) -> &Name {
        &self.source_set
    }

    /// Name of the node set edges point to.
    #[must_use]
    pub fn target_set(&self) -> &Name {
        &self.target_set
    }

    /// Source node index of every edge.
    #[must_use]
    pub fn source_indices(&self) -> &[usize] {
        &self.source
    }

    /// Target node index of every edge.
    #[must_use]
    pub fn target_indices(&self) -> &[usize] {
        &self.target
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Source indices as an integer tensor, for gathers in models.
    pub fn source_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1, Int> {
        index_tensor(&self.source, device)
    }

    /// Target indices as an integer tensor, for gathers in models.
    pub fn target_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1, Int> {
        index_tensor(&self.target, device)
    }
}

fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    let len = data.len();
    Tensor::from_data(burn::tensor::TensorData::new(data, [len]), device)
}

/// A set of edges with adjacency and per-edge features.
#[derive(Debug, Clone)]
pub struct EdgeSet<B: Backend> {
    size: usize,
    adjacency: Adjacency,
    features: FeatureMap<B>,
}

impl<B: Backend> EdgeSet<B> {
    /// Create an edge set; the size is the adjacency length.
    pub fn new(adjacency: Adjacency) -> Self {
        Self {
            size: adjacency.len(),
            adjacency,
            features: BTreeMap::new(),
        }
    }

    /// Add a feature shaped `[size, ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already used.
    pub fn with_feature(mut self, name: &str, feature: Feature<B>) -> Result<Self> {
        insert_feature(&mut self.features, name, feature)?;
        Ok(self)
    }

    /// Number of edges.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Edge endpoints.
    #[must_use]
    pub const fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Get a feature by name.
    pub fn feature(&self, name: &str) -> Option<&Feature<B>> {
        self.features.get(name)
    }

    /// All features in name order.
    pub fn features(&self) -> &FeatureMap<B> {
        &self.features
    }
}

fn insert_feature<B: Backend>(
    features: &mut FeatureMap<B>,
    name: &str,
    feature: Feature<B>,
) -> Result<()> {
    let name = Name::new(name)?;
    if features.contains_key(&name) {
        return Err(CoreError::InvalidGraph(format!(
            "feature '{}' defined twice",
            name
        )));
    }
    features.insert(name, feature);
    Ok(())
}

/// An immutable graph: context, node sets and edge sets with their features.
///
/// Graphs are built once through [`Graph::builder`] and never mutated; every
/// transform produces a new graph. Two graphs are *topology-compatible* when
/// [`Graph::check_compatible`] succeeds.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_core::{Adjacency, EdgeSet, Feature, Graph, NodeSet};
///
/// let graph = Graph::<NdArray>::builder()
///     .context_feature("h", Feature::from_values(vec![514.0, 433.0], &[2], &device)?)?
///     .node_set("node", NodeSet::new(3).with_feature("h", node_h)?)?
///     .edge_set(
///         "edge",
///         EdgeSet::new(Adjacency::from_indices(("node", vec![0, 1]), ("node", vec![1, 2]))?)
///             .with_feature("weight", weight)?,
///     )?
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct Graph<B: Backend> {
    context: Context<B>,
    node_sets: BTreeMap<Name, NodeSet<B>>,
    edge_sets: BTreeMap<Name, EdgeSet<B>>,
}

impl<B: Backend> Graph<B> {
    /// Start building a graph.
    pub fn builder() -> GraphBuilder<B> {
        GraphBuilder::default()
    }

    /// Graph-wide features.
    pub const fn context(&self) -> &Context<B> {
        &self.context
    }

    /// Get a node set by name.
    pub fn node_set(&self, name: &str) -> Option<&NodeSet<B>> {
        self.node_sets.get(name)
    }

    /// Get an edge set by name.
    pub fn edge_set(&self, name: &str) -> Option<&EdgeSet<B>> {
        self.edge_sets.get(name)
    }

    /// All node sets in name order.
    pub fn node_sets(&self) -> &BTreeMap<Name, NodeSet<B>> {
        &self.node_sets
    }

    /// All edge sets in name order.
    pub fn edge_sets(&self) -> &BTreeMap<Name, EdgeSet<B>> {
        &self.edge_sets
    }

    /// Look up a feature by path.
    pub fn feature(&self, path: &FeaturePath) -> Option<&Feature<B>> {
        match path {
            FeaturePath::Context(f) => self.context.features.get(f),
            FeaturePath::Node(set, f) => self.node_sets.get(set)?.features.get(f),
            FeaturePath::Edge(set, f) => self.edge_sets.get(set)?.features.get(f),
        }
    }

    /// Every feature with its path, in traversal order.
    pub fn features(&self) -> Vec<(FeaturePath, &Feature<B>)> {
        let context = self
            .context
            .features
            .iter()
            .map(|(f, feature)| (FeaturePath::Context(f.clone()), feature));
        let nodes = self.node_sets.iter().flat_map(|(set, node_set)| {
            node_set
                .features
                .iter()
                .map(move |(f, feature)| (FeaturePath::Node(set.clone(), f.clone()), feature))
        });
        let edges = self.edge_sets.iter().flat_map(|(set, edge_set)| {
            edge_set
                .features
                .iter()
                .map(move |(f, feature)| (FeaturePath::Edge(set.clone(), f.clone()), feature))
        });
        context.chain(nodes).chain(edges).collect()
    }

    /// Total number of feature tensors.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.context.features.len()
            + self.node_sets.values().map(|s| s.features.len()).sum::<usize>()
            + self.edge_sets.values().map(|s| s.features.len()).sum::<usize>()
    }

    /// Check that `other` has the same topology as `self`.
    ///
    /// Compares context/node-set/edge-set names, set sizes, adjacency, feature
    /// names and feature shapes. Feature dtypes agree by construction, since
    /// both graphs store `B::FloatElem`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TopologyMismatch`] describing the first difference.
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        compare_features("context", &self.context.features, &other.context.features)?;

        compare_keys("node sets", &self.node_sets, &other.node_sets)?;
        for (name, a) in &self.node_sets {
            let b = &other.node_sets[name];
            if a.size != b.size {
                return Err(CoreError::TopologyMismatch(format!(
                    "node set '{}' has {} nodes vs {}",
                    name, a.size, b.size
                )));
            }
            compare_features(&format!("nodes/{}", name), &a.features, &b.features)?;
        }

        compare_keys("edge sets", &self.edge_sets, &other.edge_sets)?;
        for (name, a) in &self.edge_sets {
            let b = &other.edge_sets[name];
            if a.size != b.size {
                return Err(CoreError::TopologyMismatch(format!(
                    "edge set '{}' has {} edges vs {}",
                    name, a.size, b.size
                )));
            }
            if a.adjacency != b.adjacency {
                return Err(CoreError::TopologyMismatch(format!(
                    "edge set '{}' has different adjacency",
                    name
                )));
            }
            compare_features(&format!("edges/{}", name), &a.features, &b.features)?;
        }

        Ok(())
    }

    /// Build a graph of identical topology by transforming every feature.
    ///
    /// The transform may move features to another backend but must keep each
    /// feature's shape.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`, or a
    /// [`CoreError::ShapeMismatch`] if a transformed feature changed shape.
    pub fn map_features<B2, E, F>(&self, mut f: F) -> std::result::Result<Graph<B2>, E>
    where
        B2: Backend,
        E: From<CoreError>,
        F: FnMut(&FeaturePath, &Feature<B>) -> std::result::Result<Feature<B2>, E>,
    {
        let mut apply = |path: FeaturePath,
                         feature: &Feature<B>|
         -> std::result::Result<(Name, Feature<B2>), E> {
            let mapped = f(&path, feature)?;
            if mapped.dims() != feature.dims() {
                return Err(E::from(CoreError::ShapeMismatch(format!(
                    "{} changed shape from {:?} to {:?}",
                    path,
                    feature.dims(),
                    mapped.dims()
                ))));
            }
            Ok((path.feature().clone(), mapped))
        };

        let context: FeatureMap<B2> = self
            .context
            .features
            .iter()
            .map(|(name, feature)| apply(FeaturePath::Context(name.clone()), feature))
            .collect::<std::result::Result<_, E>>()?;

        let mut node_sets = BTreeMap::new();
        for (set, node_set) in &self.node_sets {
            let features: FeatureMap<B2> = node_set
                .features
                .iter()
                .map(|(name, feature)| apply(FeaturePath::Node(set.clone(), name.clone()), feature))
                .collect::<std::result::Result<_, E>>()?;
            node_sets.insert(
                set.clone(),
                NodeSet {
                    size: node_set.size,
                    features,
                },
            );
        }

        let mut edge_sets = BTreeMap::new();
        for (set, edge_set) in &self.edge_sets {
            let features: FeatureMap<B2> = edge_set
                .features
                .iter()
                .map(|(name, feature)| apply(FeaturePath::Edge(set.clone(), name.clone()), feature))
                .collect::<std::result::Result<_, E>>()?;
            edge_sets.insert(
                set.clone(),
                EdgeSet {
                    size: edge_set.size,
                    adjacency: edge_set.adjacency.clone(),
                    features,
                },
            );
        }

        Ok(Graph {
            context: Context { features: context },
            node_sets,
            edge_sets,
        })
    }

    /// Combine two topology-compatible graphs feature by feature.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TopologyMismatch`] (converted into `E`) if the
    /// graphs are not compatible, otherwise propagates errors from `f`.
    pub fn zip_features<B2, E, F>(&self, other: &Self, mut f: F) -> std::result::Result<Graph<B2>, E>
    where
        B2: Backend,
        E: From<CoreError>,
        F: FnMut(&FeaturePath, &Feature<B>, &Feature<B>) -> std::result::Result<Feature<B2>, E>,
    {
        self.check_compatible(other)?;
        self.map_features(|path, a| {
            let b = other.feature(path).ok_or_else(|| {
                CoreError::TopologyMismatch(format!("{} missing from second graph", path))
            })?;
            f(path, a, b)
        })
    }

    /// Size-independent schema of this graph.
    pub fn schema(&self) -> GraphSchema {
        let features = |map: &FeatureMap<B>| -> BTreeMap<Name, FeatureSchema> {
            map.iter()
                .map(|(name, feature)| (name.clone(), FeatureSchema::of(feature)))
                .collect()
        };

        GraphSchema {
            context: features(&self.context.features),
            node_sets: self
                .node_sets
                .iter()
                .map(|(name, set)| {
                    (
                        name.clone(),
                        NodeSetSchema {
                            features: features(&set.features),
                        },
                    )
                })
                .collect(),
            edge_sets: self
                .edge_sets
                .iter()
                .map(|(name, set)| {
                    (
                        name.clone(),
                        EdgeSetSchema {
                            source: set.adjacency.source_set.clone(),
                            target: set.adjacency.target_set.clone(),
                            features: features(&set.features),
                        },
                    )
                })
                .collect(),
        }
    }
}

fn compare_keys<V>(what: &str, a: &BTreeMap<Name, V>, b: &BTreeMap<Name, V>) -> Result<()> {
    if a.keys().ne(b.keys()) {
        return Err(CoreError::TopologyMismatch(format!(
            "{} differ: {:?} vs {:?}",
            what,
            a.keys().map(Name::as_str).collect::<Vec<_>>(),
            b.keys().map(Name::as_str).collect::<Vec<_>>()
        )));
    }
    Ok(())
}

fn compare_features<B: Backend>(
    owner: &str,
    a: &FeatureMap<B>,
    b: &FeatureMap<B>,
) -> Result<()> {
    compare_keys(&format!("{} features", owner), a, b)?;
    for (name, fa) in a {
        let fb = &b[name];
        if fa.dims() != fb.dims() {
            return Err(CoreError::TopologyMismatch(format!(
                "{}/{} has shape {:?} vs {:?}",
                owner,
                name,
                fa.dims(),
                fb.dims()
            )));
        }
    }
    Ok(())
}

/// Builder for [`Graph`] that validates structure in [`GraphBuilder::build`].
#[derive(Debug, Clone)]
pub struct GraphBuilder<B: Backend> {
    context: FeatureMap<B>,
    node_sets: BTreeMap<Name, NodeSet<B>>,
    edge_sets: BTreeMap<Name, EdgeSet<B>>,
}

impl<B: Backend> Default for GraphBuilder<B> {
    fn default() -> Self {
        Self {
            context: BTreeMap::new(),
            node_sets: BTreeMap::new(),
            edge_sets: BTreeMap::new(),
        }
    }
}

impl<B: Backend> GraphBuilder<B> {
    /// Add a context feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already used.
    pub fn context_feature(mut self, name: &str, feature: Feature<B>) -> Result<Self> {
        insert_feature(&mut self.context, name, feature)?;
        Ok(self)
    }

    /// Add a node set.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already used.
    pub fn node_set(mut self, name: &str, node_set: NodeSet<B>) -> Result<Self> {
        let name = Name::new(name)?;
        if self.node_sets.contains_key(&name) {
            return Err(CoreError::InvalidGraph(format!("node set '{}' defined twice", name)));
        }
        self.node_sets.insert(name, node_set);
        Ok(self)
    }

    /// Add an edge set.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already used.
    pub fn edge_set(mut self, name: &str, edge_set: EdgeSet<B>) -> Result<Self> {
        let name = Name::new(name)?;
        if self.edge_sets.contains_key(&name) {
            return Err(CoreError::InvalidGraph(format!("edge set '{}' defined twice", name)));
        }
        self.edge_sets.insert(name, edge_set);
        Ok(self)
    }

    /// Validate and build the graph.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGraph`] if a feature's item count differs
    /// from its set size, or an edge set references a missing node set or an
    /// out-of-range node.
    pub fn build(self) -> Result<Graph<B>> {
        for (set, node_set) in &self.node_sets {
            check_items(&format!("nodes/{}", set), node_set.size, &node_set.features)?;
        }

        for (set, edge_set) in &self.edge_sets {
            check_items(&format!("edges/{}", set), edge_set.size, &edge_set.features)?;

            let adjacency = &edge_set.adjacency;
            for (endpoint, node_set, indices) in [
                ("source", &adjacency.source_set, &adjacency.source),
                ("target", &adjacency.target_set, &adjacency.target),
            ] {
                let nodes = self.node_sets.get(node_set).ok_or_else(|| {
                    CoreError::InvalidGraph(format!(
                        "edge set '{}' {} refers to unknown node set '{}'",
                        set, endpoint, node_set
                    ))
                })?;
                if let Some(&bad) = indices.iter().find(|&&i| i >= nodes.size) {
                    return Err(CoreError::InvalidGraph(format!(
                        "edge set '{}' {} index {} out of range for node set '{}' of size {}",
                        set, endpoint, bad, node_set, nodes.size
                    )));
                }
            }
        }

        Ok(Graph {
            context: Context {
                features: self.context,
            },
            node_sets: self.node_sets,
            edge_sets: self.edge_sets,
        })
    }
}

fn check_items<B: Backend>(owner: &str, size: usize, features: &FeatureMap<B>) -> Result<()> {
    for (name, feature) in features {
        if feature.items() != size {
            return Err(CoreError::InvalidGraph(format!(
                "{}/{} has {} items but the set has size {}",
                owner,
                name,
                feature.items(),
                size
            )));
        }
    }
    Ok(())
}
