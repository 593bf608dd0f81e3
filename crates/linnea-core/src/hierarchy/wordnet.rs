//! WordNet hierarchy source backed by a local index file.
//!
//! The index is tab-separated, one noun synset per line:
//!
//! ```text
//! <synset_id>\t<lemma|lemma|...>\t<hypernym_synset_id or ->
//! ```
//!
//! Lemmas use spaces, not underscores. The first lemma of a synset is its
//! display name. Hyponym counts are the transitive closure over the
//! hypernym links in the index, computed once at load time.

use super::{ChainStep, HierarchyEntry, HierarchySource, ParentChain};
use crate::error::HierarchyError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const SOURCE_NAME: &str = "wordnet";

#[derive(Debug)]
struct Synset {
    lemmas: Vec<String>,
    hypernym: Option<String>,
}

#[derive(Debug)]
pub struct WordNet {
    synsets: HashMap<String, Synset>,
    /// Lemma -> id of the first synset listing it
    lemma_index: HashMap<String, String>,
    /// Transitive hyponym counts per synset
    hyponym_counts: HashMap<String, u64>,
    max_depth: usize,
}

impl WordNet {
    /// Load the index file.
    pub fn load(path: &Path, max_depth: usize) -> Result<Self, HierarchyError> {
        let content = std::fs::read_to_string(path).map_err(|e| HierarchyError::Index {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut synsets = HashMap::new();
        let mut lemma_index = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(id), Some(lemmas), Some(hypernym)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(HierarchyError::Index {
                    path: path.to_path_buf(),
                    message: format!("expected 3 tab-separated fields on line {}", line_no + 1),
                });
            };

            let lemmas: Vec<String> = lemmas
                .split('|')
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect();
            if lemmas.is_empty() {
                return Err(HierarchyError::Index {
                    path: path.to_path_buf(),
                    message: format!("synset {id} has no lemmas (line {})", line_no + 1),
                });
            }

            for lemma in &lemmas {
                lemma_index
                    .entry(lemma.clone())
                    .or_insert_with(|| id.to_string());
            }
            synsets.insert(
                id.to_string(),
                Synset {
                    lemmas,
                    hypernym: (hypernym != "-").then(|| hypernym.to_string()),
                },
            );
        }

        let hyponym_counts = count_hyponyms(&synsets);
        debug!(synsets = synsets.len(), "Loaded WordNet index");
        Ok(Self {
            synsets,
            lemma_index,
            hyponym_counts,
            max_depth,
        })
    }

    /// Find the synset for a label, falling back to its individual words
    /// when the compound form is not indexed.
    fn resolve(&self, clean: &str) -> Option<&String> {
        if let Some(id) = self.lemma_index.get(clean) {
            return Some(id);
        }
        clean.split_whitespace().find_map(|word| self.lemma_index.get(word))
    }
}

/// Transitive hyponym count per synset, following hypernym links upward.
fn count_hyponyms(synsets: &HashMap<String, Synset>) -> HashMap<String, u64> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for synset in synsets.values() {
        // Each synset contributes one hyponym to every ancestor
        let mut visited = std::collections::HashSet::new();
        let mut current = synset.hypernym.as_ref();
        while let Some(ancestor) = current {
            if !visited.insert(ancestor.clone()) {
                break;
            }
            *counts.entry(ancestor.clone()).or_insert(0) += 1;
            current = synsets.get(ancestor).and_then(|s| s.hypernym.as_ref());
        }
    }
    counts
}

#[async_trait]
impl ParentChain for WordNet {
    async fn expand(&self, id: &str, depth: usize) -> Result<ChainStep, HierarchyError> {
        let Some(synset) = self.synsets.get(id) else {
            // Dangling hypernym pointer ends the chain gracefully
            return Ok(ChainStep {
                entry: HierarchyEntry {
                    name: id.to_string(),
                    synonyms: vec![id.to_string()],
                    depth,
                    descendants: 0,
                },
                parent: None,
            });
        };
        Ok(ChainStep {
            entry: HierarchyEntry {
                name: synset.lemmas[0].clone(),
                synonyms: synset.lemmas.clone(),
                depth,
                descendants: self.hyponym_counts.get(id).copied().unwrap_or(0),
            },
            parent: synset.hypernym.clone(),
        })
    }
}

#[async_trait]
impl HierarchySource for WordNet {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn hierarchy(&self, label: &str) -> Result<Vec<HierarchyEntry>, HierarchyError> {
        let clean = super::clean_label(label);
        let Some(id) = self.resolve(&clean) else {
            debug!(label = %clean, "No WordNet synset, returning leaf");
            return Ok(vec![HierarchyEntry::leaf(&clean)]);
        };
        super::walk_chain(self, id.clone(), self.max_depth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "\
# noun synsets
n1\twater lily|pond lily\tn2
n2\taquatic plant\tn3
n3\tplant|flora\tn4
n4\tentity\t-
n5\trose\tn3
";

    fn load_fixture(max_depth: usize) -> WordNet {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.tsv");
        std::fs::write(&path, INDEX).unwrap();
        WordNet::load(&path, max_depth).unwrap()
    }

    #[tokio::test]
    async fn test_hierarchy_chain() {
        let wordnet = load_fixture(10);
        let entries = wordnet.hierarchy("Water_Lily").await.unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["water lily", "aquatic plant", "plant", "entity"]);
        assert_eq!(entries[0].synonyms, vec!["water lily", "pond lily"]);
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[3].depth, 3);
    }

    #[tokio::test]
    async fn test_hyponym_counts() {
        let wordnet = load_fixture(10);
        let entries = wordnet.hierarchy("plant").await.unwrap();

        // plant has water lily, aquatic plant, and rose beneath it
        assert_eq!(entries[0].name, "plant");
        assert_eq!(entries[0].descendants, 3);
        // entity sees every other synset
        assert_eq!(entries[1].name, "entity");
        assert_eq!(entries[1].descendants, 4);
    }

    #[tokio::test]
    async fn test_compound_falls_back_to_words() {
        let wordnet = load_fixture(10);
        // "desert rose" is not indexed but "rose" is
        let entries = wordnet.hierarchy("desert rose").await.unwrap();
        assert_eq!(entries[0].name, "rose");
    }

    #[tokio::test]
    async fn test_unknown_label_returns_leaf() {
        let wordnet = load_fixture(10);
        let entries = wordnet.hierarchy("qqqq").await.unwrap();
        assert_eq!(entries, vec![HierarchyEntry::leaf("qqqq")]);
    }

    #[tokio::test]
    async fn test_depth_cap() {
        let wordnet = load_fixture(2);
        let entries = wordnet.hierarchy("water lily").await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_malformed_index_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        std::fs::write(&path, "n1\tonly two fields").unwrap();

        let err = WordNet::load(&path, 10).unwrap_err();
        assert!(matches!(err, HierarchyError::Index { .. }));
    }
}
