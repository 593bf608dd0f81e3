//! Image classification dataset adapters.
//!
//! Each adapter maps an on-disk benchmark layout to a flat list of
//! (image path, class index) samples plus a class-label table. Adapters
//! never decode image pixels; they hand out paths for the model providers
//! to read.

mod caltech;
mod cub;
mod download;
mod flowers;
mod inaturalist;

pub use caltech::Caltech101;
pub use cub::Cub200;
pub use download::{download_file, extract_archive, fetch_and_extract, verify_checksum};
pub use flowers::Flowers102;
pub use inaturalist::{INaturalist, TaxonRank, Taxonomy};

use crate::error::DatasetError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Standard dataset splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// Parse a split name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "train" => Some(Self::Train),
            "val" | "valid" | "validation" => Some(Self::Val),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dataset sample: an image file and its class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Absolute path to the image file
    pub path: PathBuf,

    /// Index into the dataset's class table
    pub class_index: usize,
}

/// Uniform indexable interface over classification benchmarks.
pub trait Dataset {
    /// Short dataset identifier (e.g., "caltech101").
    fn name(&self) -> &str;

    /// Number of samples.
    fn len(&self) -> usize;

    /// True when the dataset holds no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index`, or `OutOfBounds` past the end.
    fn sample(&self, index: usize) -> Result<&Sample, DatasetError>;

    /// Human-readable class labels, indexed by `Sample::class_index`.
    fn classes(&self) -> &[String];

    /// Label for a class index, if in range.
    fn class_name(&self, class_index: usize) -> Option<&str> {
        self.classes().get(class_index).map(|s| s.as_str())
    }
}

/// Count samples per class label, sorted by label.
pub fn class_counts(dataset: &dyn Dataset) -> Result<BTreeMap<String, usize>, DatasetError> {
    let mut counts = BTreeMap::new();
    for i in 0..dataset.len() {
        let sample = dataset.sample(i)?;
        let label = dataset
            .class_name(sample.class_index)
            .unwrap_or("<unknown>")
            .to_string();
        *counts.entry(label).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parse() {
        assert_eq!(Split::parse("train"), Some(Split::Train));
        assert_eq!(Split::parse("VALID"), Some(Split::Val));
        assert_eq!(Split::parse("test"), Some(Split::Test));
        assert_eq!(Split::parse("dev"), None);
    }

    #[test]
    fn test_split_display() {
        assert_eq!(Split::Val.to_string(), "val");
    }
}
