//! Caltech-101 adapter.
//!
//! Expects the standard layout under `root/caltech101/101_ObjectCategories/`
//! with one directory per category. The `BACKGROUND_Google` clutter class is
//! excluded. Splits come from an optional sidecar CSV with `filename,split`
//! rows where `filename` is `<category>/<image>.jpg`.

use super::{Dataset, Sample, Split};
use crate::error::DatasetError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const BACKGROUND_CLASS: &str = "BACKGROUND_Google";

#[derive(Debug)]
pub struct Caltech101 {
    classes: Vec<String>,
    samples: Vec<Sample>,
}

impl Caltech101 {
    /// Open the full dataset (all samples, no split filtering).
    pub fn open(root: &Path) -> Result<Self, DatasetError> {
        Self::build(root, None)
    }

    /// Open one split using a `filename,split` CSV sidecar.
    pub fn open_split(root: &Path, split: Split, split_file: &Path) -> Result<Self, DatasetError> {
        let keep = load_split_filenames(split_file, split)?;
        Self::build(root, Some(keep))
    }

    fn build(root: &Path, keep: Option<HashSet<String>>) -> Result<Self, DatasetError> {
        let categories_dir = root.join("caltech101").join("101_ObjectCategories");
        if !categories_dir.is_dir() {
            return Err(DatasetError::NotFound {
                root: root.to_path_buf(),
                message: format!("missing {}", categories_dir.display()),
            });
        }

        let mut classes = Vec::new();
        for entry in std::fs::read_dir(&categories_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != BACKGROUND_CLASS {
                classes.push(name);
            }
        }
        classes.sort();

        let mut samples = Vec::new();
        for (class_index, class) in classes.iter().enumerate() {
            let class_dir = categories_dir.join(class);
            let mut files: Vec<PathBuf> = std::fs::read_dir(&class_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "jpg"))
                .collect();
            files.sort();

            for path in files {
                if let Some(keep) = &keep {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let relative = format!("{class}/{file_name}");
                    if !keep.contains(&relative) {
                        continue;
                    }
                }
                samples.push(Sample { path, class_index });
            }
        }

        debug!(classes = classes.len(), samples = samples.len(), "Loaded Caltech-101");
        Ok(Self { classes, samples })
    }
}

fn load_split_filenames(split_file: &Path, split: Split) -> Result<HashSet<String>, DatasetError> {
    let mut reader = csv::Reader::from_path(split_file).map_err(|e| DatasetError::Metadata {
        path: split_file.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut keep = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| DatasetError::Metadata {
            path: split_file.to_path_buf(),
            message: e.to_string(),
        })?;
        let (Some(filename), Some(row_split)) = (record.get(0), record.get(1)) else {
            return Err(DatasetError::Metadata {
                path: split_file.to_path_buf(),
                message: "expected filename,split columns".to_string(),
            });
        };
        if row_split.trim() == split.as_str() {
            keep.insert(filename.trim().to_string());
        }
    }
    Ok(keep)
}

impl Dataset for Caltech101 {
    fn name(&self) -> &str {
        "caltech101"
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, index: usize) -> Result<&Sample, DatasetError> {
        self.samples.get(index).ok_or(DatasetError::OutOfBounds {
            index,
            len: self.samples.len(),
        })
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}
