//! Label hierarchy construction from lexical and knowledge-base sources.
//!
//! Every source answers the same question: given a class label like
//! "water lily", what is the chain of increasingly general concepts it
//! belongs to, and how broad is each one? Entries are ordered most specific
//! first, with depth 0 at the label itself.
//!
//! Remote sources share the [`walk_chain`] traversal: each source only
//! implements how to expand one node into an entry plus its parent id, and
//! the walker handles cycle detection and the depth cap.

mod conceptnet;
mod dbpedia;
mod gbif;
mod wikidata;
mod wordnet;

pub use conceptnet::ConceptNet;
pub use dbpedia::DbPedia;
pub use gbif::Gbif;
pub use wikidata::Wikidata;
pub use wordnet::WordNet;

use crate::error::HierarchyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One level of a concept hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    /// Concept name at this level
    pub name: String,

    /// Synonyms and alternative names, including the concept itself
    pub synonyms: Vec<String>,

    /// Distance from the original label (0 = the label itself)
    pub depth: usize,

    /// Generality measure: count (or estimate) of more-specific concepts
    pub descendants: u64,
}

impl HierarchyEntry {
    /// Entry standing in for a label no source could resolve.
    pub fn leaf(label: &str) -> Self {
        Self {
            name: label.to_string(),
            synonyms: vec![label.to_string()],
            depth: 0,
            descendants: 0,
        }
    }
}

/// A provider of concept hierarchies for class labels.
#[async_trait]
pub trait HierarchySource: Send + Sync {
    /// Source identifier (e.g., "conceptnet").
    fn name(&self) -> &str;

    /// Build the hierarchy for a label, most specific entry first.
    ///
    /// A label the source cannot resolve yields a single leaf entry rather
    /// than an error; errors are reserved for transport and parse failures.
    async fn hierarchy(&self, label: &str) -> Result<Vec<HierarchyEntry>, HierarchyError>;
}

/// Normalize a dataset label for lookup: lowercase, underscores to spaces.
pub fn clean_label(label: &str) -> String {
    label.to_lowercase().replace('_', " ")
}

/// One expanded node: the entry itself plus the id of its parent, if any.
pub(crate) struct ChainStep {
    pub entry: HierarchyEntry,
    pub parent: Option<String>,
}

/// A source's view of a parent chain, one node at a time.
#[async_trait]
pub(crate) trait ParentChain {
    /// Expand a node id into an entry at the given depth and the parent id
    /// to follow next.
    async fn expand(&self, id: &str, depth: usize) -> Result<ChainStep, HierarchyError>;
}

/// Follow parent links from `start` until the chain ends, repeats, or hits
/// `max_depth` entries.
pub(crate) async fn walk_chain<C: ParentChain + Sync>(
    chain: &C,
    start: String,
    max_depth: usize,
) -> Result<Vec<HierarchyEntry>, HierarchyError> {
    let mut entries = Vec::new();
    let mut visited = std::collections::HashSet::new();
    let mut current = Some(start);
    let mut depth = 0;

    while let Some(id) = current {
        if depth >= max_depth || !visited.insert(id.clone()) {
            break;
        }
        let step = chain.expand(&id, depth).await?;
        entries.push(step.entry);
        current = step.parent;
        depth += 1;
    }

    Ok(entries)
}
