//! GBIF (Global Biodiversity Information Facility) hierarchy source.
//!
//! Biological taxonomies are not discovered by walking parent links: the
//! species detail record already carries the full rank ladder. Entries run
//! species upward to kingdom, and descendant counts are fixed order-of-
//! magnitude estimates per rank since exact child counts are not exposed.

use super::{clean_label, HierarchyEntry, HierarchySource};
use crate::error::HierarchyError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "gbif";

/// Ranks from most specific to most general, with descendant estimates.
const RANKS: [(&str, u64); 7] = [
    ("species", 0),
    ("genus", 10),
    ("family", 100),
    ("order", 1000),
    ("class", 5000),
    ("phylum", 20_000),
    ("kingdom", 100_000),
];

pub struct Gbif {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    key: Option<u64>,

    #[serde(default)]
    canonical_name: Option<String>,

    #[serde(default)]
    vernacular_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeciesDetail {
    species: Option<String>,
    genus: Option<String>,
    family: Option<String>,
    order: Option<String>,

    #[serde(rename = "class")]
    class_name: Option<String>,

    phylum: Option<String>,
    kingdom: Option<String>,
}

impl SpeciesDetail {
    fn rank_name(&self, rank: &str) -> Option<&str> {
        let value = match rank {
            "species" => &self.species,
            "genus" => &self.genus,
            "family" => &self.family,
            "order" => &self.order,
            "class" => &self.class_name,
            "phylum" => &self.phylum,
            "kingdom" => &self.kingdom,
            _ => &None,
        };
        value.as_deref()
    }
}

impl Gbif {
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_endpoint("https://api.gbif.org/v1", timeout_ms)
    }

    pub fn with_endpoint(endpoint: &str, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn suggest(&self, term: &str, limit: u32) -> Result<Vec<Suggestion>, HierarchyError> {
        let url = format!("{}/species/suggest", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("q", term), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} from species suggest"),
                status_code: Some(status.as_u16()),
            });
        }
        response.json().await.map_err(parse_error)
    }

    async fn species_detail(&self, key: u64) -> Result<SpeciesDetail, HierarchyError> {
        let url = format!("{}/species/{key}", self.endpoint);
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} for species {key}"),
                status_code: Some(status.as_u16()),
            });
        }
        response.json().await.map_err(parse_error)
    }

    /// Alternative names for a taxon via the suggest endpoint. Failures here
    /// degrade to just the taxon name itself.
    async fn taxon_synonyms(&self, taxon: &str) -> Vec<String> {
        let mut synonyms = vec![taxon.to_string()];
        if let Ok(suggestions) = self.suggest(taxon, 5).await {
            for suggestion in suggestions {
                for name in [suggestion.canonical_name, suggestion.vernacular_name]
                    .into_iter()
                    .flatten()
                {
                    if !synonyms.contains(&name) {
                        synonyms.push(name);
                    }
                }
            }
        }
        synonyms
    }
}

fn request_error(e: reqwest::Error) -> HierarchyError {
    HierarchyError::Request {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
        status_code: e.status().map(|s| s.as_u16()),
    }
}

fn parse_error(e: reqwest::Error) -> HierarchyError {
    HierarchyError::Parse {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl HierarchySource for Gbif {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn hierarchy(&self, label: &str) -> Result<Vec<HierarchyEntry>, HierarchyError> {
        let clean = clean_label(label);

        let Some(key) = self
            .suggest(&clean, 1)
            .await?
            .into_iter()
            .find_map(|s| s.key)
        else {
            debug!(label = %clean, "No GBIF match, returning leaf");
            return Ok(vec![HierarchyEntry::leaf(&clean)]);
        };

        let detail = self.species_detail(key).await?;
        let mut entries = Vec::new();
        let mut depth = 0;

        for (rank, estimate) in RANKS {
            let Some(name) = detail.rank_name(rank) else {
                continue;
            };
            entries.push(HierarchyEntry {
                name: name.to_string(),
                synonyms: self.taxon_synonyms(name).await,
                depth,
                descendants: estimate,
            });
            depth += 1;
        }

        if entries.is_empty() {
            return Ok(vec![HierarchyEntry::leaf(&clean)]);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_hierarchy_builds_rank_ladder() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path("/species/suggest")
                .query_param("q", "corvus corax");
            then.status(200).json_body(json!([
                {"key": 5, "canonicalName": "Corvus corax", "vernacularName": "Common Raven"}
            ]));
        });
        // Synonym lookups for individual taxa
        server.mock(|when, then| {
            when.method(GET).path("/species/suggest");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/species/5");
            then.status(200).json_body(json!({
                "species": "Corvus corax",
                "genus": "Corvus",
                "family": "Corvidae",
                "order": "Passeriformes",
                "class": "Aves",
                "phylum": "Chordata",
                "kingdom": "Animalia"
            }));
        });

        let source = Gbif::with_endpoint(&server.base_url(), 5000);
        let entries = source.hierarchy("Corvus_corax").await.unwrap();

        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0].name, "Corvus corax");
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[0].descendants, 0);
        assert_eq!(entries[6].name, "Animalia");
        assert_eq!(entries[6].depth, 6);
        assert_eq!(entries[6].descendants, 100_000);
    }

    #[tokio::test]
    async fn test_partial_ladder_skips_missing_ranks() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/species/suggest");
            then.status(200).json_body(json!([{"key": 9}]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/species/9");
            then.status(200).json_body(json!({
                "genus": "Rosa",
                "family": "Rosaceae",
                "kingdom": "Plantae"
            }));
        });

        let source = Gbif::with_endpoint(&server.base_url(), 5000);
        let entries = source.hierarchy("rose").await.unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Rosa", "Rosaceae", "Plantae"]);
        // Depths stay contiguous even with missing ranks
        assert_eq!(entries[2].depth, 2);
    }

    #[tokio::test]
    async fn test_no_match_returns_leaf() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/species/suggest");
            then.status(200).json_body(json!([]));
        });

        let source = Gbif::with_endpoint(&server.base_url(), 5000);
        let entries = source.hierarchy("accordion").await.unwrap();
        assert_eq!(entries, vec![HierarchyEntry::leaf("accordion")]);
    }
}
