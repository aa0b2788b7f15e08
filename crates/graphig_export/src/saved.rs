//! Loading and invoking exported attribution units.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use graphig_core::GraphRecord;
use graphig_explain::{integrated_gradients, ReverseMode};
use graphig_models::ExportableModel;
use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::exporter::{
    load_json, ExportMetadata, MODEL_CONFIG_FILE, MODEL_WEIGHTS_FILE, PREPROCESS_FILE,
};
use crate::preprocess::{JsonRecordParser, Preprocess};

/// A loaded attribution unit.
///
/// Loading needs the destination and the model type only; the preprocess and
/// the model weights come from the export.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_export::SavedAttribution;
///
/// let saved: SavedAttribution<Autodiff<NdArray>, EdgeMessageReadout<_>> =
///     SavedAttribution::load("./attribution", &device)?;
/// let outputs = saved.invoke("integrated_gradients", &[line.as_bytes()])?;
/// let attributions = &outputs["output"];
/// ```
pub struct SavedAttribution<B: AutodiffBackend, M, P = JsonRecordParser> {
    path: PathBuf,
    metadata: ExportMetadata,
    preprocess: P,
    model: M,
    device: B::Device,
}

impl<B, M, P> SavedAttribution<B, M, P>
where
    B: AutodiffBackend,
    M: ExportableModel<B>,
    P: Preprocess,
{
    /// Load an export from a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if a file cannot be read,
    /// [`ExportError::Serialization`] if one is malformed, and
    /// [`ExportError::IncompatibleSchema`] if the saved model and preprocess
    /// no longer agree.
    pub fn load(destination: impl AsRef<Path>, device: &B::Device) -> Result<Self> {
        let path = destination.as_ref().to_path_buf();

        let metadata = ExportMetadata::load(&path)?;
        let config: M::Config = load_json(&path.join(MODEL_CONFIG_FILE))?;
        let preprocess: P = load_json(&path.join(PREPROCESS_FILE))?;

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record: <M as Module<B>>::Record =
            Recorder::<B>::load(&recorder, path.join(MODEL_WEIGHTS_FILE), device).map_err(|e| {
                ExportError::Serialization(format!("Failed to load model: {}", e))
            })?;
        let model = M::init(&config, device)?.load_record(record);

        model
            .input_spec()
            .check_accepts(&preprocess.output_spec())
            .map_err(|e| ExportError::IncompatibleSchema(e.to_string()))?;

        info!(
            path = %path.display(),
            arch = %metadata.arch,
            export_name = %metadata.options.export_name,
            "loaded attribution unit"
        );

        Ok(Self {
            path,
            metadata,
            preprocess,
            model,
            device: device.clone(),
        })
    }

    /// Export directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Export metadata.
    pub fn metadata(&self) -> &ExportMetadata {
        &self.metadata
    }

    /// Names of the exported operations.
    pub fn signatures(&self) -> Vec<&str> {
        vec![self.metadata.options.export_name.as_str()]
    }

    /// Run the operation `name` on a batch of records.
    ///
    /// Every record is parsed with the saved preprocess and explained with
    /// the saved options. The result maps the output name to one attribution
    /// record per input record, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownSignature`] for an unknown `name`,
    /// [`ExportError::Record`] for a record the preprocess rejects, and
    /// [`ExportError::Explain`] if attribution fails. No partial batch is
    /// returned.
    pub fn invoke<R: AsRef<[u8]>>(
        &self,
        name: &str,
        records: &[R],
    ) -> Result<BTreeMap<String, Vec<GraphRecord>>> {
        let options = &self.metadata.options;
        if name != options.export_name {
            return Err(ExportError::UnknownSignature {
                name: name.to_string(),
                available: vec![options.export_name.clone()],
            });
        }

        let config = options.attribution_config();
        let model = ReverseMode::<B, M>::new(&self.model);

        let attributions = records
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<GraphRecord> {
                let (graph, _label) = self
                    .preprocess
                    .parse::<B::InnerBackend>(record.as_ref(), &self.device)
                    .map_err(|e| ExportError::Record {
                        index,
                        reason: e.to_string(),
                    })?;
                let attribution = integrated_gradients(&model, &graph, &config)?;
                debug!(index, "explained record");
                Ok(attribution.values.to_record()?)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(records = attributions.len(), signature = name, "invoked attribution unit");

        Ok(BTreeMap::from([(options.output_name.clone(), attributions)]))
    }
}
