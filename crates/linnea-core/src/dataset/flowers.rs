//! Oxford Flowers-102 adapter.
//!
//! Images live under `root/flowers-102/jpg/` named `image_00001.jpg` through
//! `image_08189.jpg`. Labels come from `imagelabels.txt`, one 1-based class
//! id per line where line N labels image N. Split membership comes from
//! `setid.csv` with `image_id,split` rows. The 102 class names are fixed by
//! the benchmark and compiled in.

use super::{Dataset, Sample, Split};
use crate::error::DatasetError;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub struct Flowers102 {
    classes: Vec<String>,
    samples: Vec<Sample>,
}

impl Flowers102 {
    /// Open one split, or every labeled image when `split` is `None`.
    pub fn open(root: &Path, split: Option<Split>) -> Result<Self, DatasetError> {
        let base = root.join("flowers-102");
        let images_dir = base.join("jpg");
        if !images_dir.is_dir() {
            return Err(DatasetError::NotFound {
                root: root.to_path_buf(),
                message: format!("missing {}", images_dir.display()),
            });
        }

        let labels = read_labels(&base.join("imagelabels.txt"))?;
        let image_ids = match split {
            Some(split) => read_split_ids(&base.join("setid.csv"), split)?,
            // Without a split the label file covers every image
            None => (1..=labels.len()).collect(),
        };

        let mut samples = Vec::with_capacity(image_ids.len());
        for image_id in image_ids {
            let label = labels
                .get(image_id - 1)
                .copied()
                .ok_or_else(|| DatasetError::Metadata {
                    path: base.join("imagelabels.txt"),
                    message: format!("no label for image id {image_id}"),
                })?;
            samples.push(Sample {
                path: images_dir.join(format!("image_{image_id:05}.jpg")),
                // Labels in the sidecar are 1-based
                class_index: label - 1,
            });
        }

        debug!(split = ?split, samples = samples.len(), "Loaded Flowers-102");
        Ok(Self {
            classes: CLASSES.iter().map(|s| s.to_string()).collect(),
            samples,
        })
    }
}

/// Read the per-image labels file: one 1-based class id per line.
fn read_labels(path: &Path) -> Result<Vec<usize>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut labels = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label: usize = line.parse().map_err(|_| DatasetError::Metadata {
            path: path.to_path_buf(),
            message: format!("invalid label on line {}: {line}", line_no + 1),
        })?;
        if label == 0 || label > CLASSES.len() {
            return Err(DatasetError::Metadata {
                path: path.to_path_buf(),
                message: format!("label {label} out of range on line {}", line_no + 1),
            });
        }
        labels.push(label);
    }
    Ok(labels)
}

/// Read image ids for one split from the `image_id,split` CSV.
fn read_split_ids(path: &Path, split: Split) -> Result<Vec<usize>, DatasetError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DatasetError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DatasetError::Metadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let (Some(id), Some(row_split)) = (record.get(0), record.get(1)) else {
            return Err(DatasetError::Metadata {
                path: path.to_path_buf(),
                message: "expected image_id,split columns".to_string(),
            });
        };
        if row_split.trim() != split.as_str() {
            continue;
        }
        let id: usize = id.trim().parse().map_err(|_| DatasetError::Metadata {
            path: path.to_path_buf(),
            message: format!("invalid image id: {id}"),
        })?;
        // Image ids are 1-based; 0 has no label line
        if id == 0 {
            return Err(DatasetError::Metadata {
                path: path.to_path_buf(),
                message: "image id 0 out of range (ids are 1-based)".to_string(),
            });
        }
        ids.push(id);
    }
    Ok(ids)
}

impl Dataset for Flowers102 {
    fn name(&self) -> &str {
        "flowers102"
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

/// Class names in label order, as published with the benchmark.
const CLASSES: [&str; 102] = [
    "pink primrose",
    "hard-leaved pocket orchid",
    "canterbury bells",
    "sweet pea",
    "english marigold",
    "tiger lily",
    "moon orchid",
    "bird of paradise",
    "monkshood",
    "globe thistle",
    "snapdragon",
    "colt's foot",
    "king protea",
    "spear thistle",
    "yellow iris",
    "globe-flower",
    "purple coneflower",
    "peruvian lily",
    "balloon flower",
    "giant white arum lily",
    "fire lily",
    "pincushion flower",
    "fritillary",
    "red ginger",
    "grape hyacinth",
    "corn poppy",
    "prince of wales feathers",
    "stemless gentian",
    "artichoke",
    "sweet william",
    "carnation",
    "garden phlox",
    "love in the mist",
    "mexican aster",
    "alpine sea holly",
    "ruby-lipped cattleya",
    "cape flower",
    "great masterwort",
    "siam tulip",
    "lenten rose",
    "barbeton daisy",
    "daffodil",
    "sword lily",
    "poinsettia",
    "bolero deep blue",
    "wallflower",
    "marigold",
    "buttercup",
    "oxeye daisy",
    "common dandelion",
    "petunia",
    "wild pansy",
    "primula",
    "sunflower",
    "pelargonium",
    "bishop of llandaff",
    "gaura",
    "geranium",
    "orange dahlia",
    "pink-yellow dahlia?",
    "cautleya spicata",
    "japanese anemone",
    "black-eyed susan",
    "silverbush",
    "californian poppy",
    "osteospermum",
    "spring crocus",
    "bearded iris",
    "windflower",
    "tree poppy",
    "gazania",
    "azalea",
    "water lily",
    "rose",
    "thorn apple",
    "morning glory",
    "passion flower",
    "lotus",
    "toad lily",
    "anthurium",
    "frangipani",
    "clematis",
    "hibiscus",
    "columbine",
    "desert-rose",
    "tree mallow",
    "magnolia",
    "cyclamen",
    "watercress",
    "canna lily",
    "hippeastrum",
    "bee balm",
    "ball moss",
    "foxglove",
    "bougainvillea",
    "camellia",
    "mallow",
    "mexican petunia",
    "bromelia",
    "blanket flower",
    "trumpet creeper",
    "blackberry lily",
];
