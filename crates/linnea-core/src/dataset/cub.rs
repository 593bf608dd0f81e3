//! CUB-200-2011 (Caltech-UCSD Birds) adapter.
//!
//! Reads the standard metadata files under `root/CUB_200_2011/`:
//! `classes.txt`, `images.txt`, `image_class_labels.txt`, and
//! `train_test_split.txt`. Class names like `001.Black_footed_Albatross`
//! are displayed as `Black footed Albatross`.

use super::{Dataset, Sample, Split};
use crate::error::DatasetError;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub struct Cub200 {
    classes: Vec<String>,
    samples: Vec<Sample>,
}

impl Cub200 {
    /// Open the full dataset.
    pub fn open(root: &Path) -> Result<Self, DatasetError> {
        Self::build(root, None)
    }

    /// Open the train or test split. CUB-200 defines no validation split.
    pub fn open_split(root: &Path, split: Split) -> Result<Self, DatasetError> {
        if split == Split::Val {
            return Err(DatasetError::UnsupportedSplit {
                dataset: "cub200".to_string(),
                split: split.to_string(),
            });
        }
        Self::build(root, Some(split))
    }

    fn build(root: &Path, split: Option<Split>) -> Result<Self, DatasetError> {
        let base = root.join("CUB_200_2011");
        if !base.is_dir() {
            return Err(DatasetError::NotFound {
                root: root.to_path_buf(),
                message: format!("missing {}", base.display()),
            });
        }

        let classes = read_classes(&base)?;
        let image_paths = read_numbered(&base.join("images.txt"))?;
        let image_labels = read_numbered(&base.join("image_class_labels.txt"))?;
        let in_train = match split {
            Some(_) => Some(read_numbered(&base.join("train_test_split.txt"))?),
            None => None,
        };

        let mut image_ids: Vec<&u64> = image_paths.keys().collect();
        image_ids.sort();

        let mut samples = Vec::new();
        for image_id in image_ids {
            if let (Some(split), Some(flags)) = (split, &in_train) {
                let is_train = flags.get(image_id).map(|v| v.as_str()) == Some("1");
                let wanted = match split {
                    Split::Train => is_train,
                    Split::Test => !is_train,
                    Split::Val => unreachable!(),
                };
                if !wanted {
                    continue;
                }
            }

            let rel_path = &image_paths[image_id];
            let class_id: usize = image_labels
                .get(image_id)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| DatasetError::Metadata {
                    path: base.join("image_class_labels.txt"),
                    message: format!("missing or invalid label for image {image_id}"),
                })?;
            if class_id == 0 || class_id > classes.len() {
                return Err(DatasetError::Metadata {
                    path: base.join("image_class_labels.txt"),
                    message: format!("class id {class_id} out of range for image {image_id}"),
                });
            }

            samples.push(Sample {
                path: base.join("images").join(rel_path),
                // Metadata class ids are 1-based
                class_index: class_id - 1,
            });
        }

        debug!(classes = classes.len(), samples = samples.len(), "Loaded CUB-200");
        Ok(Self { classes, samples })
    }
}

/// Read `classes.txt` and convert names to display form.
fn read_classes(base: &Path) -> Result<Vec<String>, DatasetError> {
    let raw = read_numbered(&base.join("classes.txt"))?;
    let mut ids: Vec<&u64> = raw.keys().collect();
    ids.sort();
    Ok(ids.iter().map(|id| display_name(&raw[id])).collect())
}

/// Strip the numeric prefix (`001.`) and replace underscores with spaces.
fn display_name(raw: &str) -> String {
    let name = raw.split_once('.').map(|(_, rest)| rest).unwrap_or(raw);
    name.trim().replace('_', " ")
}

/// Parse a CUB metadata file of `<id> <value>` lines.
fn read_numbered(path: &Path) -> Result<HashMap<u64, String>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (id, value) = line.split_once(' ').ok_or_else(|| DatasetError::Metadata {
            path: path.to_path_buf(),
            message: format!("malformed line: {line}"),
        })?;
        let id: u64 = id.parse().map_err(|_| DatasetError::Metadata {
            path: path.to_path_buf(),
            message: format!("invalid id: {id}"),
        })?;
        map.insert(id, value.trim().to_string());
    }
    Ok(map)
}

impl Dataset for Cub200 {
    fn name(&self) -> &str {
        "cub200"
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

#[cfg(test)]
mod tests {
    use super::*;

    fn make_layout(dir: &Path) {
        let base = dir.join("CUB_200_2011");
        std::fs::create_dir_all(base.join("images")).unwrap();
        std::fs::write(
            base.join("classes.txt"),
            "1 001.Black_footed_Albatross\n2 002.Laysan_Albatross\n",
        )
        .unwrap();
        std::fs::write(
            base.join("images.txt"),
            "1 001.Black_footed_Albatross/img1.jpg\n\
             2 001.Black_footed_Albatross/img2.jpg\n\
             3 002.Laysan_Albatross/img3.jpg\n",
        )
        .unwrap();
        std::fs::write(base.join("image_class_labels.txt"), "1 1\n2 1\n3 2\n").unwrap();
        std::fs::write(base.join("train_test_split.txt"), "1 1\n2 0\n3 0\n").unwrap();
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("001.Black_footed_Albatross"), "Black footed Albatross");
        assert_eq!(display_name("Sooty_Albatross"), "Sooty Albatross");
    }

    #[test]
    fn test_open_full() {
        let dir = tempfile::tempdir().unwrap();
        make_layout(dir.path());

        let dataset = Cub200::open(dir.path()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.classes(),
            &["Black footed Albatross", "Laysan Albatross"]
        );
        assert_eq!(dataset.sample(2).unwrap().class_index, 1);
    }

    #[test]
    fn test_open_splits() {
        let dir = tempfile::tempdir().unwrap();
        make_layout(dir.path());

        let train = Cub200::open_split(dir.path(), Split::Train).unwrap();
        assert_eq!(train.len(), 1);

        let test = Cub200::open_split(dir.path(), Split::Test).unwrap();
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_val_split_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        make_layout(dir.path());

        let err = Cub200::open_split(dir.path(), Split::Val).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedSplit { .. }));
    }
}
