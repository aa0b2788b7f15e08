//! Turning raw records into graphs.

use std::fmt::Debug;

use burn::prelude::*;
use graphig_core::{CoreError, Feature, Graph, GraphRecord, GraphSchema, Name};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Parses one raw record into a graph and an optional label.
///
/// Implementations are saved as JSON inside an export, so a loaded export
/// parses records exactly as the exported one did.
pub trait Preprocess: Clone + Debug + Serialize + DeserializeOwned {
    /// Schema of every graph [`Preprocess::parse`] returns.
    fn output_spec(&self) -> GraphSchema;

    /// Parse a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is malformed or its graph does not
    /// match [`Preprocess::output_spec`].
    fn parse<B: Backend>(
        &self,
        record: &[u8],
        device: &B::Device,
    ) -> Result<(Graph<B>, Option<Feature<B>>), CoreError>;
}

/// Parses JSON [`GraphRecord`]s, optionally splitting off a context feature
/// as the label.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_export::{JsonRecordParser, Preprocess};
///
/// let parser = JsonRecordParser::new(spec).with_label_feature(Name::new("label")?);
/// let (graph, label) = parser.parse::<NdArray>(line.as_bytes(), &device)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecordParser {
    /// Schema of incoming records, label included.
    pub spec: GraphSchema,
    /// Context feature holding the label.
    #[serde(default)]
    pub label_feature: Option<Name>,
}

impl JsonRecordParser {
    /// Parser for records of `spec` without a label.
    pub fn new(spec: GraphSchema) -> Self {
        Self {
            spec,
            label_feature: None,
        }
    }

    /// Take the label from context feature `name`.
    #[must_use]
    pub fn with_label_feature(mut self, name: Name) -> Self {
        self.label_feature = Some(name);
        self
    }
}

impl Preprocess for JsonRecordParser {
    fn output_spec(&self) -> GraphSchema {
        let mut spec = self.spec.clone();
        if let Some(label) = &self.label_feature {
            spec.context.remove(label);
        }
        spec
    }

    fn parse<B: Backend>(
        &self,
        record: &[u8],
        device: &B::Device,
    ) -> Result<(Graph<B>, Option<Feature<B>>), CoreError> {
        let mut record = GraphRecord::from_json(record)?;

        let label = match &self.label_feature {
            Some(name) => {
                let feature = record.context.remove(name.as_str()).ok_or_else(|| {
                    CoreError::TopologyMismatch(format!("record has no label context/{}", name))
                })?;
                Some(Feature::from_values(feature.values, &feature.shape, device)?)
            }
            None => None,
        };

        let graph = Graph::from_record(&record, device)?;
        self.output_spec().check_accepts(&graph.schema())?;
        Ok((graph, label))
    }
}
