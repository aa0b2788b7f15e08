//! Edge message passing with a first-node readout.
//!
//! One round of message passing over a single edge set whose endpoints lie in
//! the same node set:
//!
//! 1. each edge gathers the feature of its target node and concatenates its
//!    own feature,
//! 2. a dense layer turns that into a message,
//! 3. messages are sum-pooled onto their source nodes,
//! 4. the pooled message is concatenated with the node's own feature and a
//!    second dense layer produces one score per node,
//! 5. the score of node 0 is the output.
//!
//! Only edges leaving node 0, and the nodes they point to, can influence the
//! output.

use burn::module::Ignored;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use graphig_core::{CoreError, Feature, Graph, GraphSchema, Name};
use serde::{Deserialize, Serialize};

/// Configuration for [`EdgeMessageReadout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMessageReadoutConfig {
    /// Schema of the graphs the model is built for.
    pub input_spec: GraphSchema,
    /// Edge set carrying the messages.
    pub edge_set: Name,
    /// Node feature read at both endpoints.
    pub node_feature: Name,
    /// Edge feature concatenated to each message.
    pub edge_feature: Name,
    /// Width of the message layer.
    pub hidden: usize,
}

impl EdgeMessageReadoutConfig {
    /// Create a config for graphs of `input_spec`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TopologyMismatch`] if the edge set is missing,
    /// does not start and end in the same node set, or a named feature is
    /// missing.
    pub fn new(
        input_spec: GraphSchema,
        edge_set: &str,
        node_feature: &str,
        edge_feature: &str,
    ) -> Result<Self, CoreError> {
        let config = Self {
            input_spec,
            edge_set: Name::new(edge_set)?,
            node_feature: Name::new(node_feature)?,
            edge_feature: Name::new(edge_feature)?,
            hidden: 16,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the message width.
    #[must_use]
    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Check that the schema carries everything the model reads.
    ///
    /// # Errors
    ///
    /// See [`EdgeMessageReadoutConfig::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        self.node_width()?;
        self.edge_width()?;
        Ok(())
    }

    /// Node set both endpoints of the edge set belong to.
    ///
    /// # Errors
    ///
    /// See [`EdgeMessageReadoutConfig::new`].
    pub fn node_set(&self) -> Result<&Name, CoreError> {
        let edges = self.input_spec.edge_sets.get(&self.edge_set).ok_or_else(|| {
            CoreError::TopologyMismatch(format!("no edge set '{}'", self.edge_set))
        })?;
        if edges.source != edges.target {
            return Err(CoreError::TopologyMismatch(format!(
                "edge set '{}' connects {} -> {}, expected one node set",
                self.edge_set, edges.source, edges.target
            )));
        }
        Ok(&edges.source)
    }

    /// Values per node of the node feature.
    ///
    /// # Errors
    ///
    /// See [`EdgeMessageReadoutConfig::new`].
    pub fn node_width(&self) -> Result<usize, CoreError> {
        let node_set = self.node_set()?;
        self.input_spec
            .node_sets
            .get(node_set)
            .and_then(|set| set.features.get(&self.node_feature))
            .map(|schema| schema.item_dims.iter().product())
            .ok_or_else(|| {
                CoreError::TopologyMismatch(format!(
                    "no feature nodes/{}/{}",
                    node_set, self.node_feature
                ))
            })
    }

    /// Values per edge of the edge feature.
    ///
    /// # Errors
    ///
    /// See [`EdgeMessageReadoutConfig::new`].
    pub fn edge_width(&self) -> Result<usize, CoreError> {
        self.input_spec
            .edge_sets
            .get(&self.edge_set)
            .and_then(|set| set.features.get(&self.edge_feature))
            .map(|schema| schema.item_dims.iter().product())
            .ok_or_else(|| {
                CoreError::TopologyMismatch(format!(
                    "no feature edges/{}/{}",
                    self.edge_set, self.edge_feature
                ))
            })
    }

    /// Initialize the model.
    ///
    /// # Errors
    ///
    /// See [`EdgeMessageReadoutConfig::new`].
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<EdgeMessageReadout<B>, CoreError> {
        let node_width = self.node_width()?;
        let edge_width = self.edge_width()?;

        Ok(EdgeMessageReadout {
            message: LinearConfig::new(node_width + edge_width, self.hidden).init(device),
            readout: LinearConfig::new(self.hidden + node_width, 1).init(device),
            config: Ignored(self.clone()),
        })
    }
}

/// One round of edge messages followed by a readout of node 0.
///
/// Architecture:
/// - gather target node feature per edge, concat edge feature
/// - Linear(node_width + edge_width, hidden)
/// - sum-pool messages onto source nodes
/// - concat node feature, Linear(hidden + node_width, 1)
/// - score of node 0
///
/// # Example
///
/// ```rust,ignore
/// use graphig_models::EdgeMessageReadoutConfig;
///
/// let config = EdgeMessageReadoutConfig::new(graph.schema(), "edge", "h", "weight")?;
/// let model = config.init::<Autodiff<NdArray>>(&device)?;
/// let score = model.forward(&graph)?; // shape [1]
/// ```
#[derive(Module, Debug)]
pub struct EdgeMessageReadout<B: Backend> {
    /// Message layer.
    message: Linear<B>,
    /// Node score layer.
    readout: Linear<B>,
    /// Configuration the model was built from.
    config: Ignored<EdgeMessageReadoutConfig>,
}

impl<B: Backend> EdgeMessageReadout<B> {
    /// Configuration the model was built from.
    pub fn config(&self) -> &EdgeMessageReadoutConfig {
        &self.config
    }

    /// Forward pass.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[1]` holding the score of node 0.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TopologyMismatch`] if the graph lacks the edge
    /// set, its node set, or either feature,
    /// [`CoreError::ShapeMismatch`] if a feature width differs from the
    /// configured one, and [`CoreError::InvalidGraph`] if the node set is empty.
    pub fn forward(&self, graph: &Graph<B>) -> Result<Tensor<B, 1>, CoreError> {
        let config = &*self.config;
        let edges = graph.edge_set(config.edge_set.as_str()).ok_or_else(|| {
            CoreError::TopologyMismatch(format!("graph has no edge set '{}'", config.edge_set))
        })?;
        let adjacency = edges.adjacency();
        if adjacency.source_set() != adjacency.target_set() {
            return Err(CoreError::TopologyMismatch(format!(
                "edge set '{}' connects {} -> {}, expected one node set",
                config.edge_set,
                adjacency.source_set(),
                adjacency.target_set()
            )));
        }
        let nodes = graph.node_set(adjacency.source_set().as_str()).ok_or_else(|| {
            CoreError::TopologyMismatch(format!(
                "graph has no node set '{}'",
                adjacency.source_set()
            ))
        })?;
        if nodes.size() == 0 {
            return Err(CoreError::InvalidGraph(format!(
                "node set '{}' is empty, nothing to read out",
                adjacency.source_set()
            )));
        }

        let h = read(nodes.feature(config.node_feature.as_str()), || {
            format!("nodes/{}/{}", adjacency.source_set(), config.node_feature)
        })?;
        let weight = read(edges.feature(config.edge_feature.as_str()), || {
            format!("edges/{}/{}", config.edge_set, config.edge_feature)
        })?;
        let (node_width, edge_width) = (config.node_width()?, config.edge_width()?);
        if h.dims()[1] != node_width || weight.dims()[1] != edge_width {
            return Err(CoreError::ShapeMismatch(format!(
                "model reads {} node and {} edge values per item, graph has {} and {}",
                node_width,
                edge_width,
                h.dims()[1],
                weight.dims()[1]
            )));
        }
        let device = h.device();

        // [edges, node_width + edge_width]
        let gathered = h.clone().select(0, adjacency.target_tensor::<B>(&device));
        let messages = self.message.forward(Tensor::cat(vec![gathered, weight], 1));

        // [nodes, hidden]
        let pooled = Tensor::<B, 2>::zeros([nodes.size(), config.hidden], &device).select_assign(
            0,
            adjacency.source_tensor::<B>(&device),
            messages,
        );

        let scores = self.readout.forward(Tensor::cat(vec![pooled, h], 1));
        Ok(scores.slice([0..1, 0..1]).reshape([1]))
    }
}

fn read<B: Backend>(
    feature: Option<&Feature<B>>,
    path: impl FnOnce() -> String,
) -> Result<Tensor<B, 2>, CoreError> {
    feature
        .map(|f| f.tensor().clone())
        .ok_or_else(|| CoreError::TopologyMismatch(format!("graph has no feature {}", path())))
}
