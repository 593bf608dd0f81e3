//! The `linnea hierarchy` command: build "is-a" hierarchies for labels.

use super::datasets::{DatasetKind, DatasetSelector};
use clap::{Args, ValueEnum};
use linnea_core::hierarchy::{ConceptNet, DbPedia, Gbif, HierarchySource, Wikidata, WordNet};
use linnea_core::output::write_json_file;
use linnea_core::{Config, HierarchyEntry};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments for the `hierarchy` command.
#[derive(Args, Debug)]
pub struct HierarchyArgs {
    /// Label to look up (omit with --dataset to enumerate its classes)
    pub label: Option<String>,

    /// Knowledge source
    #[arg(long, value_enum, default_value = "wordnet")]
    pub source: SourceKind,

    /// Build hierarchies for every class of this dataset
    #[arg(long, value_enum, conflicts_with = "label")]
    pub dataset: Option<DatasetKind>,

    /// Dataset root directory (defaults to the configured data dir)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// iNaturalist version directory (with --dataset inaturalist)
    #[arg(long, default_value = "2021_train")]
    pub inat_version: String,

    /// iNaturalist target rank (with --dataset inaturalist)
    #[arg(long, default_value = "full")]
    pub inat_rank: String,

    /// Override the configured maximum chain depth
    #[arg(long)]
    pub depth: Option<usize>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Supported knowledge sources.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SourceKind {
    /// Local WordNet noun index
    Wordnet,
    /// ConceptNet REST API
    Conceptnet,
    /// Wikidata entity API + SPARQL
    Wikidata,
    /// GBIF biological taxonomy
    Gbif,
    /// DBpedia Lookup + SPARQL
    Dbpedia,
}

/// Execute the hierarchy command.
pub async fn execute(args: HierarchyArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let source = create_source(args.source, &args, &config)?;

    let labels = collect_labels(&args, &config)?;
    if labels.is_empty() {
        anyhow::bail!("Nothing to look up: pass a label or --dataset");
    }

    let mut hierarchies: BTreeMap<String, Vec<HierarchyEntry>> = BTreeMap::new();
    for label in &labels {
        tracing::info!(source = source.name(), label, "Building hierarchy");
        match source.hierarchy(label).await {
            Ok(entries) => {
                hierarchies.insert(label.clone(), entries);
            }
            Err(e) => {
                tracing::error!(label, "Hierarchy lookup failed: {e}");
                hierarchies.insert(label.clone(), vec![HierarchyEntry::leaf(label)]);
            }
        }
    }

    match &args.output {
        Some(path) => {
            write_json_file(path, &hierarchies)?;
            tracing::info!("Hierarchies written to {:?}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(&hierarchies)?),
    }
    Ok(())
}

/// Labels to look up: the positional label, or a dataset's class list.
fn collect_labels(args: &HierarchyArgs, config: &Config) -> anyhow::Result<Vec<String>> {
    if let Some(label) = &args.label {
        return Ok(vec![label.clone()]);
    }
    let Some(dataset) = args.dataset else {
        return Ok(Vec::new());
    };
    let selector = DatasetSelector {
        dataset,
        root: args.root.clone(),
        split: None,
        split_file: None,
        inat_version: args.inat_version.clone(),
        inat_rank: args.inat_rank.clone(),
    };
    let dataset = selector.open(config)?;
    Ok(dataset.classes().to_vec())
}

/// Build a hierarchy source from config, with optional depth override.
fn create_source(
    kind: SourceKind,
    args: &HierarchyArgs,
    config: &Config,
) -> anyhow::Result<Box<dyn HierarchySource>> {
    let h = &config.hierarchy;
    let depth = args.depth.unwrap_or(h.max_depth);
    let timeout = h.request_timeout_ms;

    let source: Box<dyn HierarchySource> = match kind {
        SourceKind::Wordnet => Box::new(WordNet::load(&config.wordnet_index(), depth)?),
        SourceKind::Conceptnet => Box::new(ConceptNet::with_endpoint(
            &h.conceptnet_endpoint,
            depth,
            timeout,
        )),
        SourceKind::Wikidata => Box::new(Wikidata::with_endpoints(
            &h.wikidata_endpoint,
            &h.wikidata_sparql_endpoint,
            args.depth.unwrap_or(h.wikidata_max_depth),
            timeout,
        )),
        SourceKind::Gbif => Box::new(Gbif::with_endpoint(&h.gbif_endpoint, timeout)),
        SourceKind::Dbpedia => Box::new(DbPedia::with_endpoints(
            &h.dbpedia_lookup_endpoint,
            &h.dbpedia_sparql_endpoint,
            depth,
            timeout,
        )),
    };
    Ok(source)
}
