//! The `linnea datasets` command for downloading and inspecting datasets.

use clap::{Args, Subcommand, ValueEnum};
use linnea_core::dataset::{
    class_counts, fetch_and_extract, Caltech101, Cub200, Dataset, Flowers102, INaturalist, Split,
    TaxonRank,
};
use linnea_core::Config;
use std::path::PathBuf;

/// Arguments for the `datasets` command.
#[derive(Args, Debug)]
pub struct DatasetsArgs {
    #[command(subcommand)]
    pub command: DatasetsCommand,
}

/// Subcommands for dataset management.
#[derive(Subcommand, Debug)]
pub enum DatasetsCommand {
    /// Download and extract a dataset archive
    Download {
        /// Archive URL (.tar.gz, .tgz, or .zip)
        #[arg(long)]
        url: String,

        /// Expected BLAKE3 checksum of the archive (hex)
        #[arg(long)]
        checksum: Option<String>,

        /// Destination directory (defaults to the configured data dir)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Show per-class sample counts
    Stats(DatasetSelector),

    /// List class labels
    Classes(DatasetSelector),
}

/// Supported benchmark datasets.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DatasetKind {
    /// Caltech-101 object categories
    Caltech101,
    /// CUB-200-2011 bird species
    Cub200,
    /// Oxford Flowers-102
    Flowers102,
    /// iNaturalist taxa
    Inaturalist,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetKind::Caltech101 => write!(f, "caltech101"),
            DatasetKind::Cub200 => write!(f, "cub200"),
            DatasetKind::Flowers102 => write!(f, "flowers102"),
            DatasetKind::Inaturalist => write!(f, "inaturalist"),
        }
    }
}

/// Shared dataset selection flags, flattened into `eval` and the inspection
/// subcommands.
#[derive(Args, Debug)]
pub struct DatasetSelector {
    /// Dataset to load
    #[arg(value_enum)]
    pub dataset: DatasetKind,

    /// Dataset root directory (defaults to the configured data dir)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Split to load (train/val/test); omit for the whole dataset
    #[arg(long)]
    pub split: Option<String>,

    /// Split lookup CSV for Caltech-101 (`filename,split` rows)
    #[arg(long)]
    pub split_file: Option<PathBuf>,

    /// iNaturalist version directory (e.g., "2021_train")
    #[arg(long, default_value = "2021_train")]
    pub inat_version: String,

    /// iNaturalist target rank (kingdom..species, or "full")
    #[arg(long, default_value = "full")]
    pub inat_rank: String,
}

impl DatasetSelector {
    /// Resolve the dataset root: `--root` (tilde-expanded) or the config's
    /// data dir.
    pub fn resolve_root(&self, config: &Config) -> PathBuf {
        match &self.root {
            Some(root) => {
                PathBuf::from(shellexpand::tilde(&root.to_string_lossy()).into_owned())
            }
            None => config.data_dir(),
        }
    }

    /// Open the selected dataset.
    pub fn open(&self, config: &Config) -> anyhow::Result<Box<dyn Dataset>> {
        let root = self.resolve_root(config);
        let split = self
            .split
            .as_deref()
            .map(|s| Split::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown split: {s}")))
            .transpose()?;

        let dataset: Box<dyn Dataset> = match self.dataset {
            DatasetKind::Caltech101 => match (split, &self.split_file) {
                (Some(split), Some(file)) => Box::new(Caltech101::open_split(&root, split, file)?),
                (Some(_), None) => {
                    anyhow::bail!("Caltech-101 split selection requires --split-file")
                }
                _ => Box::new(Caltech101::open(&root)?),
            },
            DatasetKind::Cub200 => match split {
                Some(split) => Box::new(Cub200::open_split(&root, split)?),
                None => Box::new(Cub200::open(&root)?),
            },
            DatasetKind::Flowers102 => Box::new(Flowers102::open(&root, split)?),
            DatasetKind::Inaturalist => {
                let rank = TaxonRank::parse(&self.inat_rank)
                    .ok_or_else(|| anyhow::anyhow!("Unknown taxon rank: {}", self.inat_rank))?;
                Box::new(INaturalist::open(&root, &self.inat_version, rank)?)
            }
        };
        Ok(dataset)
    }
}

/// Execute the datasets command.
pub async fn execute(args: DatasetsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    match args.command {
        DatasetsCommand::Download {
            url,
            checksum,
            dest,
        } => {
            let dest = dest.unwrap_or_else(|| config.data_dir());
            fetch_and_extract(&url, &dest, checksum.as_deref()).await?;
            println!("Extracted to {}", dest.display());
        }

        DatasetsCommand::Stats(selector) => {
            let dataset = selector.open(&config)?;
            print_stats(dataset.as_ref())?;
        }

        DatasetsCommand::Classes(selector) => {
            let dataset = selector.open(&config)?;
            for class in dataset.classes() {
                println!("{class}");
            }
        }
    }

    Ok(())
}

/// Print a per-class sample count table.
fn print_stats(dataset: &dyn Dataset) -> anyhow::Result<()> {
    let counts = class_counts(dataset)?;
    let width = counts.keys().map(|k| k.len()).max().unwrap_or(0);

    println!("Dataset: {} ({} samples)", dataset.name(), dataset.len());
    println!();
    for (class, count) in &counts {
        println!("  {class:<width$}  {count:>6}");
    }
    println!();
    println!("  {} classes", counts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_resolve_root_prefers_flag() {
        let selector = DatasetSelector {
            dataset: DatasetKind::Cub200,
            root: Some(PathBuf::from("/data/benchmarks")),
            split: None,
            split_file: None,
            inat_version: "2021_train".to_string(),
            inat_rank: "full".to_string(),
        };
        let config = Config::default();
        assert_eq!(
            selector.resolve_root(&config),
            Path::new("/data/benchmarks")
        );
    }

    #[test]
    fn test_open_rejects_unknown_split() {
        let dir = tempfile::tempdir().unwrap();
        let selector = DatasetSelector {
            dataset: DatasetKind::Cub200,
            root: Some(dir.path().to_path_buf()),
            split: Some("dev".to_string()),
            split_file: None,
            inat_version: "2021_train".to_string(),
            inat_rank: "full".to_string(),
        };
        // `.err()` because the Ok side is a trait object without Debug
        let err = selector.open(&Config::default()).err().unwrap();
        assert!(err.to_string().contains("Unknown split"));
    }
}
