//! Saving a preprocess and a model as one attribution unit.
//!
//! An export is a directory holding:
//! - `model.mpk` - module record
//! - `model_config.json` - model configuration
//! - `preprocess.json` - the saved preprocess
//! - `export_meta.json` - [`ExportMetadata`]
//!
//! # Example
//!
//! ```rust,ignore
//! use graphig_export::{IntegratedGradientsExporter, ModelExporter};
//!
//! let exporter = IntegratedGradientsExporter::new("output", 3);
//! exporter.save(&parser, &model, Path::new("./attribution"))?;
//! ```

use std::path::Path;

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use graphig_core::{GraphSchema, Seed};
use graphig_explain::{BaselineType, ExplainError, IntegratedGradientsConfig};
use graphig_models::ExportableModel;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use crate::error::{ExportError, Result};
use crate::preprocess::Preprocess;

/// Module record file name.
pub(crate) const MODEL_WEIGHTS_FILE: &str = "model.mpk";
/// Model config file name.
pub(crate) const MODEL_CONFIG_FILE: &str = "model_config.json";
/// Preprocess file name.
pub(crate) const PREPROCESS_FILE: &str = "preprocess.json";
/// Export metadata file name.
pub(crate) const METADATA_FILE: &str = "export_meta.json";
/// Directory inside the destination that artifacts are written to first.
const STAGING_DIR: &str = ".staging";

/// Export format version.
const FORMAT_VERSION: &str = "1.0";

/// Options for an attribution export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Name the operation is exported under.
    pub export_name: String,
    /// Name of the operation's output.
    pub output_name: String,
    /// Number of interpolation steps.
    pub steps: usize,
    /// Baseline the path starts from.
    pub baseline: BaselineType,
    /// Seed for random baselines.
    pub seed: Option<Seed>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            export_name: "integrated_gradients".to_string(),
            output_name: "output".to_string(),
            steps: 32,
            baseline: BaselineType::Zeros,
            seed: None,
        }
    }
}

impl ExportOptions {
    /// Set the exported operation name.
    #[must_use]
    pub fn with_export_name(mut self, name: impl Into<String>) -> Self {
        self.export_name = name.into();
        self
    }

    /// Set the output name.
    #[must_use]
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Set the number of interpolation steps.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set the baseline type.
    #[must_use]
    pub fn with_baseline(mut self, baseline: BaselineType) -> Self {
        self.baseline = baseline;
        self
    }

    /// Set the random baseline seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attribution configuration the exported operation runs with.
    pub fn attribution_config(&self) -> IntegratedGradientsConfig {
        IntegratedGradientsConfig {
            n_steps: self.steps,
            baseline: self.baseline,
            seed: self.seed,
        }
    }

    /// Reject options the exported operation could never run with.
    fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(ExplainError::EmptyInput("export needs at least one step".to_string()).into());
        }
        if self.baseline == BaselineType::Random && self.seed.is_none() {
            return Err(
                ExplainError::InvalidSeed("random baseline exported without a seed".to_string())
                    .into(),
            );
        }
        Ok(())
    }
}

/// Metadata about an exported attribution unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Export format version.
    pub version: String,
    /// Model architecture name.
    pub arch: String,
    /// Options the unit runs with.
    pub options: ExportOptions,
    /// Schema the model accepts.
    pub model_spec: GraphSchema,
    /// Schema the preprocess produces.
    pub preprocess_spec: GraphSchema,
    /// Export timestamp, seconds since the Unix epoch.
    pub timestamp: String,
}

impl ExportMetadata {
    /// Create new export metadata.
    pub fn new(arch: impl Into<String>, options: ExportOptions) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string());

        Self {
            version: FORMAT_VERSION.to_string(),
            arch: arch.into(),
            options,
            model_spec: GraphSchema::default(),
            preprocess_spec: GraphSchema::default(),
            timestamp,
        }
    }

    /// Read the metadata of an export without loading it.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be read and
    /// [`ExportError::Serialization`] if it is malformed.
    pub fn load(destination: impl AsRef<Path>) -> Result<Self> {
        load_json(&destination.as_ref().join(METADATA_FILE))
    }

    /// Set the model and preprocess schemas.
    #[must_use]
    pub fn with_specs(mut self, model_spec: GraphSchema, preprocess_spec: GraphSchema) -> Self {
        self.model_spec = model_spec;
        self.preprocess_spec = preprocess_spec;
        self
    }
}

/// Saves a preprocess and model pair as a self-contained callable unit.
pub trait ModelExporter<B: AutodiffBackend> {
    /// Save to `destination`, creating it if needed.
    ///
    /// All artifacts are written to a staging directory first and moved into
    /// `destination` only once every one of them was written, so a failed
    /// save leaves an earlier export in place.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::IncompatibleSchema`] if the model does not accept
    /// what the preprocess produces, and [`ExportError::Destination`] if the
    /// destination cannot be written.
    fn save<P, M>(&self, preprocess: &P, model: &M, destination: &Path) -> Result<ExportMetadata>
    where
        P: Preprocess,
        M: ExportableModel<B>;
}

/// Exports a model wrapped in Integrated Gradients.
///
/// The saved operation takes a batch of records, parses each with the saved
/// preprocess and returns one attribution graph per record.
#[derive(Debug, Clone, Default)]
pub struct IntegratedGradientsExporter {
    options: ExportOptions,
}

impl IntegratedGradientsExporter {
    /// Exporter with the default options except output name and steps.
    pub fn new(output_name: impl Into<String>, steps: usize) -> Self {
        Self::from_options(
            ExportOptions::default()
                .with_output_name(output_name)
                .with_steps(steps),
        )
    }

    /// Exporter with explicit options.
    pub fn from_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Options the saved unit runs with.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }
}

impl<B: AutodiffBackend> ModelExporter<B> for IntegratedGradientsExporter {
    fn save<P, M>(&self, preprocess: &P, model: &M, destination: &Path) -> Result<ExportMetadata>
    where
        P: Preprocess,
        M: ExportableModel<B>,
    {
        self.options.validate()?;

        let model_spec = model.input_spec();
        let preprocess_spec = preprocess.output_spec();
        model_spec
            .check_accepts(&preprocess_spec)
            .map_err(|e| ExportError::IncompatibleSchema(e.to_string()))?;

        let staging = destination.join(STAGING_DIR);
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging).map_err(|e| {
            ExportError::Destination(format!("cannot create {}: {}", destination.display(), e))
        })?;

        let metadata = ExportMetadata::new(M::ARCH, self.options.clone())
            .with_specs(model_spec, preprocess_spec);

        let written = write_artifacts::<B, P, M>(preprocess, model, &metadata, &staging)
            .and_then(|()| publish(&staging, destination));
        if written.is_err() {
            let _ = std::fs::remove_dir_all(&staging);
        }
        written?;

        info!(
            destination = %destination.display(),
            arch = M::ARCH,
            export_name = %self.options.export_name,
            steps = self.options.steps,
            "exported attribution unit"
        );

        Ok(metadata)
    }
}

/// Export `model` and `preprocess` with Integrated Gradients under `options`.
///
/// # Errors
///
/// See [`ModelExporter::save`].
pub fn export<B, P, M>(
    preprocess: &P,
    model: &M,
    destination: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<ExportMetadata>
where
    B: AutodiffBackend,
    P: Preprocess,
    M: ExportableModel<B>,
{
    ModelExporter::<B>::save(
        &IntegratedGradientsExporter::from_options(options.clone()),
        preprocess,
        model,
        destination.as_ref(),
    )
}

fn write_artifacts<B, P, M>(
    preprocess: &P,
    model: &M,
    metadata: &ExportMetadata,
    dir: &Path,
) -> Result<()>
where
    B: AutodiffBackend,
    P: Preprocess,
    M: ExportableModel<B>,
{
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    Recorder::<B>::record(&recorder, model.clone().into_record(), dir.join(MODEL_WEIGHTS_FILE))
        .map_err(|e| ExportError::Destination(format!("failed to save model: {}", e)))?;

    save_json(&model.config(), &dir.join(MODEL_CONFIG_FILE))?;
    save_json(preprocess, &dir.join(PREPROCESS_FILE))?;
    save_json(metadata, &dir.join(METADATA_FILE))
}

/// Move staged artifacts into `destination`, metadata last.
fn publish(staging: &Path, destination: &Path) -> Result<()> {
    for file in [MODEL_WEIGHTS_FILE, MODEL_CONFIG_FILE, PREPROCESS_FILE, METADATA_FILE] {
        std::fs::rename(staging.join(file), destination.join(file)).map_err(|e| {
            ExportError::Destination(format!("failed to move {} into place: {}", file, e))
        })?;
    }
    std::fs::remove_dir(staging)?;
    Ok(())
}

/// Helper to save JSON file.
fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ExportError::Serialization(format!("Failed to serialize: {}", e)))?;
    std::fs::write(path, json)
        .map_err(|e| ExportError::Destination(format!("Failed to write {}: {}", path.display(), e)))
}

/// Helper to load JSON file.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json)
        .map_err(|e| ExportError::Serialization(format!("Failed to deserialize {}: {}", path.display(), e)))
}
