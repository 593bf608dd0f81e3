//! iNaturalist (2021 layout) adapter.
//!
//! Category directories under `root/inaturalist/<version>/` encode the full
//! taxonomy in their name:
//! `00123_Animalia_Chordata_Aves_Passeriformes_Corvidae_Corvus_corax`.
//! The adapter parses those into a [`Taxonomy`] per category so the class
//! label can be taken at any rank, not just the species binomial.

use super::{Dataset, Sample};
use crate::error::DatasetError;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Taxonomic rank to use as the class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonRank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    /// Full binomial: "Genus species"
    Full,
}

impl TaxonRank {
    /// Parse a rank name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kingdom" => Some(Self::Kingdom),
            "phylum" => Some(Self::Phylum),
            "class" => Some(Self::Class),
            "order" => Some(Self::Order),
            "family" => Some(Self::Family),
            "genus" => Some(Self::Genus),
            "species" => Some(Self::Species),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Full taxonomy parsed from one category directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    pub kingdom: String,
    pub phylum: String,
    pub class: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
}

impl Taxonomy {
    /// Parse a directory name of the form
    /// `<id>_<kingdom>_<phylum>_<class>_<order>_<family>_<genus>_<species>`.
    fn parse(dir_name: &str) -> Option<Self> {
        let pieces: Vec<&str> = dir_name.split('_').collect();
        if pieces.len() != 8 {
            return None;
        }
        Some(Self {
            kingdom: pieces[1].to_string(),
            phylum: pieces[2].to_string(),
            class: pieces[3].to_string(),
            order: pieces[4].to_string(),
            family: pieces[5].to_string(),
            genus: pieces[6].to_string(),
            species: pieces[7].to_string(),
        })
    }

    /// Label at the requested rank.
    pub fn label(&self, rank: TaxonRank) -> String {
        match rank {
            TaxonRank::Kingdom => self.kingdom.clone(),
            TaxonRank::Phylum => self.phylum.clone(),
            TaxonRank::Class => self.class.clone(),
            TaxonRank::Order => self.order.clone(),
            TaxonRank::Family => self.family.clone(),
            TaxonRank::Genus => self.genus.clone(),
            TaxonRank::Species => self.species.clone(),
            TaxonRank::Full => format!("{} {}", self.genus, self.species),
        }
    }

    /// Kingdom-to-species chain, most general first.
    pub fn chain(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("kingdom", self.kingdom.as_str()),
            ("phylum", self.phylum.as_str()),
            ("class", self.class.as_str()),
            ("order", self.order.as_str()),
            ("family", self.family.as_str()),
            ("genus", self.genus.as_str()),
            ("species", self.species.as_str()),
        ]
    }
}

#[derive(Debug)]
pub struct INaturalist {
    classes: Vec<String>,
    taxonomies: Vec<Taxonomy>,
    samples: Vec<Sample>,
}

impl INaturalist {
    /// Open one version directory (e.g., "2021_train"), labeling samples at
    /// the given rank.
    pub fn open(root: &Path, version: &str, rank: TaxonRank) -> Result<Self, DatasetError> {
        let base = root.join("inaturalist").join(version);
        if !base.is_dir() {
            return Err(DatasetError::NotFound {
                root: root.to_path_buf(),
                message: format!("missing {}", base.display()),
            });
        }

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&base)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        dirs.sort();

        let mut classes = Vec::new();
        let mut taxonomies = Vec::new();
        let mut samples = Vec::new();

        for dir_name in dirs {
            let Some(taxonomy) = Taxonomy::parse(&dir_name) else {
                warn!(dir = %dir_name, "Skipping category directory with unexpected name");
                continue;
            };
            let class_index = classes.len();
            classes.push(taxonomy.label(rank));
            taxonomies.push(taxonomy);

            let category_dir = base.join(&dir_name);
            let mut files: Vec<_> = WalkDir::new(&category_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("jpg"))
                })
                .collect();
            files.sort();

            for path in files {
                samples.push(Sample { path, class_index });
            }
        }

        if classes.is_empty() {
            return Err(DatasetError::NotFound {
                root: root.to_path_buf(),
                message: "no parseable category directories".to_string(),
            });
        }

        debug!(classes = classes.len(), samples = samples.len(), "Loaded iNaturalist");
        Ok(Self {
            classes,
            taxonomies,
            samples,
        })
    }

    /// Full taxonomy for a class index.
    pub fn taxonomy(&self, class_index: usize) -> Option<&Taxonomy> {
        self.taxonomies.get(class_index)
    }
}

impl Dataset for INaturalist {
    fn name(&self) -> &str {
        "inaturalist"
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

    const RAVEN: &str = "00123_Animalia_Chordata_Aves_Passeriformes_Corvidae_Corvus_corax";

    fn make_layout(dir: &Path) {
        let base = dir.join("inaturalist").join("2021_train");
        for (name, count) in [(RAVEN, 2), ("garbage_dir", 1)] {
            let cat = base.join(name);
            std::fs::create_dir_all(&cat).unwrap();
            for i in 0..count {
                std::fs::write(cat.join(format!("{i}.jpg")), b"jpg").unwrap();
            }
        }
    }

    #[test]
    fn test_taxonomy_parse() {
        let taxonomy = Taxonomy::parse(RAVEN).unwrap();
        assert_eq!(taxonomy.kingdom, "Animalia");
        assert_eq!(taxonomy.species, "corax");
        assert_eq!(taxonomy.label(TaxonRank::Full), "Corvus corax");
        assert_eq!(taxonomy.chain().len(), 7);

        assert!(Taxonomy::parse("not_enough_pieces").is_none());
    }

    #[test]
    fn test_open_skips_malformed_dirs() {
        let dir = tempfile::tempdir().unwrap();
        make_layout(dir.path());

        let dataset = INaturalist::open(dir.path(), "2021_train", TaxonRank::Species).unwrap();
        assert_eq!(dataset.classes(), &["corax"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.taxonomy(0).unwrap().genus, "Corvus");
    }

    #[test]
    fn test_open_with_rank_labels() {
        let dir = tempfile::tempdir().unwrap();
        make_layout(dir.path());

        let dataset = INaturalist::open(dir.path(), "2021_train", TaxonRank::Class).unwrap();
        assert_eq!(dataset.classes(), &["Aves"]);
    }

    #[test]
    fn test_missing_version_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = INaturalist::open(dir.path(), "2021_valid", TaxonRank::Species).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }
}
