//! graphig CLI for exporting, invoking and inspecting attribution units.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use graphig_core::{GraphSchema, Name, Seed};
use graphig_explain::BaselineType;
use graphig_export::{
    export, ExportMetadata, ExportOptions, ExportableModel, JsonRecordParser, Preprocess,
    SavedAttribution,
};
use graphig_models::{EdgeMessageReadout, EdgeMessageReadoutConfig};

/// Backend type for attribution.
type AttributionBackend = Autodiff<NdArray>;

/// Model type of units built by this CLI.
type Model = EdgeMessageReadout<AttributionBackend>;

#[derive(Parser)]
#[command(name = "graphig")]
#[command(author, version)]
#[command(about = "Integrated Gradients for graph models - export, invoke and inspect attribution units")]
#[command(long_about = "graphig: Integrated Gradients attribution for graph-structured inputs.

EXAMPLES:
  # Export an edge message readout model for records of spec.json
  graphig export --spec spec.json --out ./unit --steps 32

  # Export with a seeded random baseline and a label feature
  graphig export --spec spec.json --out ./unit --baseline random --seed 8191 --label-feature label

  # Explain every record of a JSON lines file
  graphig attribute --export ./unit --records graphs.jsonl

  # Show what a unit was exported with
  graphig inspect --export ./unit")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an edge message readout model and export it with Integrated Gradients
    Export {
        /// Graph schema of the input records (JSON)
        #[arg(long, value_name = "FILE")]
        spec: PathBuf,

        /// Output directory
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Number of interpolation steps
        #[arg(long, default_value = "32", value_name = "N")]
        steps: usize,

        /// Baseline the interpolation path starts from
        #[arg(long, value_enum, default_value = "zeros")]
        baseline: Baseline,

        /// Seed for the random baseline
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Width of the message layer
        #[arg(long, default_value = "16", value_name = "H")]
        hidden: usize,

        /// Seed for model weight initialization
        #[arg(long, default_value = "42", value_name = "SEED")]
        model_seed: u64,

        /// Context feature holding the label, removed before attribution
        #[arg(long, value_name = "NAME")]
        label_feature: Option<String>,

        /// Edge set carrying the messages
        #[arg(long, default_value = "edge", value_name = "NAME")]
        edge_set: String,

        /// Node feature read by the model
        #[arg(long, default_value = "h", value_name = "NAME")]
        node_feature: String,

        /// Edge feature read by the model
        #[arg(long, default_value = "weight", value_name = "NAME")]
        edge_feature: String,

        /// Name the operation is exported under
        #[arg(long, default_value = "integrated_gradients", value_name = "NAME")]
        export_name: String,

        /// Name of the operation's output
        #[arg(long, default_value = "output", value_name = "NAME")]
        output_name: String,
    },
    /// Explain a batch of JSON graph records with an exported unit
    Attribute {
        /// Export directory
        #[arg(long, value_name = "DIR")]
        export: PathBuf,

        /// JSON lines file, one graph record per line
        #[arg(long, value_name = "FILE")]
        records: PathBuf,

        /// Operation to invoke (defaults to the exported one)
        #[arg(long, value_name = "NAME")]
        signature: Option<String>,
    },
    /// Show export metadata
    Inspect {
        /// Export directory
        #[arg(long, value_name = "DIR")]
        export: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Baseline {
    /// All-zero features
    Zeros,
    /// Seeded uniform values within each feature's range
    Random,
}

impl From<Baseline> for BaselineType {
    fn from(baseline: Baseline) -> Self {
        match baseline {
            Baseline::Zeros => BaselineType::Zeros,
            Baseline::Random => BaselineType::Random,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Export {
            spec,
            out,
            steps,
            baseline,
            seed,
            hidden,
            model_seed,
            label_feature,
            edge_set,
            node_feature,
            edge_feature,
            export_name,
            output_name,
        } => {
            let mut options = ExportOptions::default()
                .with_export_name(export_name)
                .with_output_name(output_name)
                .with_steps(steps)
                .with_baseline(baseline.into());
            if let Some(seed) = seed {
                options = options.with_seed(Seed::new(seed));
            }
            let args = ModelArgs {
                hidden,
                model_seed,
                edge_set,
                node_feature,
                edge_feature,
            };
            handle_export(&spec, &out, label_feature, args, &options)
        }
        Commands::Attribute {
            export: dir,
            records,
            signature,
        } => handle_attribute(&dir, &records, signature),
        Commands::Inspect { export: dir } => handle_inspect(&dir),
    }
}

struct ModelArgs {
    hidden: usize,
    model_seed: u64,
    edge_set: String,
    node_feature: String,
    edge_feature: String,
}

fn handle_export(
    spec: &Path,
    out: &Path,
    label_feature: Option<String>,
    args: ModelArgs,
    options: &ExportOptions,
) -> Result<()> {
    let json = std::fs::read_to_string(spec)
        .with_context(|| format!("Failed to read schema {}", spec.display()))?;
    let schema = GraphSchema::from_json(&json)
        .with_context(|| format!("Invalid schema {}", spec.display()))?;

    let mut parser = JsonRecordParser::new(schema);
    if let Some(label) = label_feature {
        parser = parser.with_label_feature(Name::new(label)?);
    }

    let device = Default::default();
    AttributionBackend::seed(args.model_seed);
    let model: Model = EdgeMessageReadoutConfig::new(
        parser.output_spec(),
        &args.edge_set,
        &args.node_feature,
        &args.edge_feature,
    )?
    .with_hidden(args.hidden)
    .init(&device)?;

    let metadata = export::<AttributionBackend, _, _>(&parser, &model, out, options)
        .with_context(|| format!("Failed to export to {}", out.display()))?;

    println!("Exported '{}' to {}", metadata.options.export_name, out.display());
    print_metadata(&metadata);
    Ok(())
}

fn handle_attribute(dir: &Path, records: &Path, signature: Option<String>) -> Result<()> {
    let metadata = ExportMetadata::load(dir)
        .with_context(|| format!("Failed to read export {}", dir.display()))?;
    if metadata.arch != <Model as ExportableModel<AttributionBackend>>::ARCH {
        bail!(
            "Export {} holds a '{}' model; this CLI runs '{}' exports only",
            dir.display(),
            metadata.arch,
            <Model as ExportableModel<AttributionBackend>>::ARCH
        );
    }

    let device = Default::default();
    let saved: SavedAttribution<AttributionBackend, Model> =
        SavedAttribution::load(dir, &device)
            .with_context(|| format!("Failed to load export {}", dir.display()))?;

    let lines = std::fs::read_to_string(records)
        .with_context(|| format!("Failed to read records {}", records.display()))?;
    let batch: Vec<&str> = lines.lines().filter(|line| !line.trim().is_empty()).collect();
    if batch.is_empty() {
        bail!("No records in {}", records.display());
    }

    let signature = signature.unwrap_or_else(|| metadata.options.export_name.clone());
    let outputs = saved
        .invoke(&signature, &batch)
        .with_context(|| format!("Failed to explain {}", records.display()))?;

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

fn handle_inspect(dir: &Path) -> Result<()> {
    let metadata = ExportMetadata::load(dir)
        .with_context(|| format!("Failed to read export {}", dir.display()))?;

    println!("Export: {}", dir.display());
    print_metadata(&metadata);
    Ok(())
}

fn print_metadata(metadata: &ExportMetadata) {
    let options = &metadata.options;
    println!("─────────────────────────────────────────");
    println!("  Architecture:   {}", metadata.arch);
    println!("  Format version: {}", metadata.version);
    println!("  Timestamp:      {}", metadata.timestamp);
    println!("  Signature:      {} -> {}", options.export_name, options.output_name);
    println!("  Steps:          {}", options.steps);
    println!("  Baseline:       {:?}", options.baseline);
    match options.seed {
        Some(seed) => println!("  Seed:           {}", seed.value()),
        None => println!("  Seed:           -"),
    }
    println!();
    println!("  Model input:");
    print_schema(&metadata.model_spec);
    if metadata.preprocess_spec != metadata.model_spec {
        println!("  Preprocess output:");
        print_schema(&metadata.preprocess_spec);
    }
}

fn print_schema(schema: &GraphSchema) {
    for (name, feature) in &schema.context {
        println!("    context/{} {:?}", name, feature.item_dims);
    }
    for (set, nodes) in &schema.node_sets {
        for (name, feature) in &nodes.features {
            println!("    nodes/{}/{} {:?}", set, name, feature.item_dims);
        }
    }
    for (set, edges) in &schema.edge_sets {
        println!("    edges/{} ({} -> {})", set, edges.source, edges.target);
        for (name, feature) in &edges.features {
            println!("    edges/{}/{} {:?}", set, name, feature.item_dims);
        }
    }
}
