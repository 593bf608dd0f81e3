//! ConceptNet hierarchy source.
//!
//! Follows `/r/IsA` edges upward from `/c/en/<label>`. Synonyms come from
//! `/r/Synonym` edges in both directions; descendant counts from incoming
//! `/r/IsA` and `/r/InstanceOf` edges.

use super::{clean_label, ChainStep, HierarchyEntry, HierarchySource, ParentChain};
use crate::error::HierarchyError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "conceptnet";
const EDGE_LIMIT: u32 = 100;

pub struct ConceptNet {
    client: reqwest::Client,
    endpoint: String,
    max_depth: usize,
}

#[derive(Debug, Deserialize)]
struct EdgesResponse {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    start: Node,
    end: Node,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(rename = "@id")]
    id: String,
}

impl ConceptNet {
    pub fn new(max_depth: usize, timeout_ms: u64) -> Self {
        Self::with_endpoint("https://api.conceptnet.io", max_depth, timeout_ms)
    }

    pub fn with_endpoint(endpoint: &str, max_depth: usize, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_depth,
        }
    }

    /// Query edges for a concept URI, optionally filtered by relation.
    async fn query_edges(
        &self,
        uri: &str,
        relation: Option<&str>,
    ) -> Result<Vec<Edge>, HierarchyError> {
        let url = format!("{}{}", self.endpoint, uri);
        let mut request = self.client.get(&url).query(&[
            ("limit", EDGE_LIMIT.to_string()),
            ("filter", "/c/en".to_string()),
        ]);
        if let Some(rel) = relation {
            request = request.query(&[("rel", rel)]);
        }

        let response = request.send().await.map_err(|e| HierarchyError::Request {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
            status_code: e.status().map(|s| s.as_u16()),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} for {uri}"),
                status_code: Some(status.as_u16()),
            });
        }

        let body: EdgesResponse =
            response.json().await.map_err(|e| HierarchyError::Parse {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;
        Ok(body.edges)
    }

    /// Synonyms via `/r/Synonym` edges in both directions, plus the concept.
    async fn synonyms(&self, uri: &str) -> Result<Vec<String>, HierarchyError> {
        let mut synonyms = vec![concept_name(uri)];
        for edge in self.query_edges(uri, Some("/r/Synonym")).await? {
            let other = if edge.start.id == uri {
                &edge.end.id
            } else if edge.end.id == uri {
                &edge.start.id
            } else {
                continue;
            };
            if other.contains("/c/en/") {
                let name = concept_name(other);
                if !synonyms.contains(&name) {
                    synonyms.push(name);
                }
            }
        }
        Ok(synonyms)
    }

    /// Count incoming IsA/InstanceOf edges as a generality measure.
    async fn descendants(&self, uri: &str) -> Result<u64, HierarchyError> {
        let mut count = 0;
        for relation in ["/r/IsA", "/r/InstanceOf"] {
            for edge in self.query_edges(uri, Some(relation)).await? {
                if edge.end.id == uri {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

/// Extract a readable concept name from a `/c/en/...` URI.
fn concept_name(uri: &str) -> String {
    match uri.rsplit_once("/c/en/") {
        Some((_, term)) => term.split('/').next().unwrap_or(term).replace('_', " "),
        None => uri.to_string(),
    }
}

#[async_trait]
impl ParentChain for ConceptNet {
    async fn expand(&self, uri: &str, depth: usize) -> Result<ChainStep, HierarchyError> {
        let entry = HierarchyEntry {
            name: concept_name(uri),
            synonyms: self.synonyms(uri).await?,
            depth,
            descendants: self.descendants(uri).await?,
        };

        // First outgoing IsA edge to an English concept is the parent
        let parent = self
            .query_edges(uri, Some("/r/IsA"))
            .await?
            .into_iter()
            .find(|e| e.start.id == uri && e.end.id.contains("/c/en/"))
            .map(|e| e.end.id);

        Ok(ChainStep { entry, parent })
    }
}

#[async_trait]
impl HierarchySource for ConceptNet {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn hierarchy(&self, label: &str) -> Result<Vec<HierarchyEntry>, HierarchyError> {
        let clean = clean_label(label);
        let uri = format!("/c/en/{}", clean.replace(' ', "_"));

        // A label ConceptNet does not know yields no edges at all
        if self.query_edges(&uri, None).await?.is_empty() {
            debug!(label = %clean, "No ConceptNet match, returning leaf");
            return Ok(vec![HierarchyEntry::leaf(&clean)]);
        }

        super::walk_chain(self, uri, self.max_depth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn edge(start: &str, end: &str) -> serde_json::Value {
        json!({"start": {"@id": start}, "end": {"@id": end}})
    }

    #[test]
    fn test_concept_name() {
        assert_eq!(concept_name("/c/en/water_lily"), "water lily");
        assert_eq!(concept_name("/c/en/plant/n"), "plant");
        assert_eq!(concept_name("/c/fr/chien"), "/c/fr/chien");
    }

    #[tokio::test]
    async fn test_hierarchy_walks_isa_chain() {
        let server = MockServer::start();

        // Unfiltered existence probe plus IsA queries for /c/en/rose
        server.mock(|when, then| {
            when.method(GET).path("/c/en/rose");
            then.status(200).json_body(json!({
                "edges": [edge("/c/en/rose", "/c/en/flower")]
            }));
        });
        // Everything under /c/en/flower has no further edges
        server.mock(|when, then| {
            when.method(GET).path("/c/en/flower");
            then.status(200).json_body(json!({"edges": []}));
        });

        let source = ConceptNet::with_endpoint(&server.base_url(), 10, 5000);
        let entries = source.hierarchy("rose").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "rose");
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[1].name, "flower");
        assert_eq!(entries[1].depth, 1);
    }

    #[tokio::test]
    async fn test_unknown_label_returns_leaf() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({"edges": []}));
        });

        let source = ConceptNet::with_endpoint(&server.base_url(), 10, 5000);
        let entries = source.hierarchy("Bolero_Deep_Blue").await.unwrap();

        assert_eq!(entries, vec![HierarchyEntry::leaf("bolero deep blue")]);
    }

    #[tokio::test]
    async fn test_http_error_is_request_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(503);
        });

        let source = ConceptNet::with_endpoint(&server.base_url(), 10, 5000);
        let err = source.hierarchy("rose").await.unwrap_err();
        match err {
            HierarchyError::Request { status_code, .. } => {
                assert_eq!(status_code, Some(503));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
