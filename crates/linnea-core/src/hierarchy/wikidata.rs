//! Wikidata hierarchy source.
//!
//! Resolves a label to an entity with `wbsearchentities`, then follows
//! P279 ("subclass of") claims upward. Aliases become synonyms; the
//! descendant count is a SPARQL `COUNT` of direct P279 children, treated
//! as 0 when the query endpoint is unavailable.

use super::{clean_label, ChainStep, HierarchyEntry, HierarchySource, ParentChain};
use crate::error::HierarchyError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "wikidata";

pub struct Wikidata {
    client: reqwest::Client,
    api_endpoint: String,
    sparql_endpoint: String,
    max_depth: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Default, Deserialize)]
struct Entity {
    #[serde(default)]
    labels: HashMap<String, Term>,

    #[serde(default)]
    aliases: HashMap<String, Vec<Term>>,

    #[serde(default)]
    claims: HashMap<String, Vec<Claim>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Claim {
    mainsnak: Option<Snak>,
}

#[derive(Debug, Deserialize)]
struct Snak {
    datavalue: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<serde_json::Value>,
}

impl Wikidata {
    pub fn new(max_depth: usize, timeout_ms: u64) -> Self {
        Self::with_endpoints(
            "https://www.wikidata.org/w/api.php",
            "https://query.wikidata.org/sparql",
            max_depth,
            timeout_ms,
        )
    }

    pub fn with_endpoints(
        api_endpoint: &str,
        sparql_endpoint: &str,
        max_depth: usize,
        timeout_ms: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            api_endpoint: api_endpoint.to_string(),
            sparql_endpoint: sparql_endpoint.to_string(),
            max_depth,
        }
    }

    async fn search_entity(&self, term: &str) -> Result<Option<String>, HierarchyError> {
        let response = self
            .client
            .get(&self.api_endpoint)
            .query(&[
                ("action", "wbsearchentities"),
                ("search", term),
                ("language", "en"),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} from wbsearchentities"),
                status_code: Some(status.as_u16()),
            });
        }

        let body: SearchResponse = response.json().await.map_err(parse_error)?;
        Ok(body.search.into_iter().next().map(|hit| hit.id))
    }

    async fn get_entity(&self, entity_id: &str) -> Result<Entity, HierarchyError> {
        let response = self
            .client
            .get(&self.api_endpoint)
            .query(&[
                ("action", "wbgetentities"),
                ("ids", entity_id),
                ("format", "json"),
                ("languages", "en"),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} from wbgetentities"),
                status_code: Some(status.as_u16()),
            });
        }

        let mut body: EntitiesResponse = response.json().await.map_err(parse_error)?;
        Ok(body.entities.remove(entity_id).unwrap_or_default())
    }

    /// Count direct P279 children. SPARQL endpoint failures degrade to 0.
    async fn subclass_count(&self, entity_id: &str) -> u64 {
        let query = format!(
            "SELECT (COUNT(?subclass) as ?count) WHERE {{ ?subclass wdt:P279 wd:{entity_id} . }}"
        );
        let result = self
            .client
            .get(&self.sparql_endpoint)
            .query(&[("query", query.as_str()), ("format", "json")])
            .send()
            .await;

        let Ok(response) = result else {
            warn!(entity = entity_id, "Wikidata SPARQL request failed");
            return 0;
        };
        let Ok(body) = response.json::<SparqlResponse>().await else {
            return 0;
        };
        body.results
            .bindings
            .first()
            .and_then(|b| b["count"]["value"].as_str())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
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

/// Entity id of the first P279 claim, if any.
fn parent_entity(entity: &Entity) -> Option<String> {
    entity
        .claims
        .get("P279")?
        .iter()
        .filter_map(|claim| claim.mainsnak.as_ref())
        .filter_map(|snak| snak.datavalue.as_ref())
        .find_map(|value| value["value"]["id"].as_str().map(str::to_string))
}

#[async_trait]
impl ParentChain for Wikidata {
    async fn expand(&self, entity_id: &str, depth: usize) -> Result<ChainStep, HierarchyError> {
        let entity = self.get_entity(entity_id).await?;

        let mut synonyms = Vec::new();
        if let Some(label) = entity.labels.get("en") {
            synonyms.push(label.value.clone());
        }
        for alias in entity.aliases.get("en").into_iter().flatten() {
            if !synonyms.contains(&alias.value) {
                synonyms.push(alias.value.clone());
            }
        }
        let name = synonyms
            .first()
            .cloned()
            .unwrap_or_else(|| entity_id.to_string());
        if synonyms.is_empty() {
            synonyms.push(name.clone());
        }

        let parent = parent_entity(&entity);
        let entry = HierarchyEntry {
            name,
            synonyms,
            depth,
            descendants: self.subclass_count(entity_id).await,
        };
        Ok(ChainStep { entry, parent })
    }
}

#[async_trait]
impl HierarchySource for Wikidata {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn hierarchy(&self, label: &str) -> Result<Vec<HierarchyEntry>, HierarchyError> {
        let clean = clean_label(label);
        let Some(entity_id) = self.search_entity(&clean).await? else {
            debug!(label = %clean, "No Wikidata match, returning leaf");
            return Ok(vec![HierarchyEntry::leaf(&clean)]);
        };
        super::walk_chain(self, entity_id, self.max_depth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn entity_body(id: &str, label: &str, aliases: &[&str], parent: Option<&str>) -> serde_json::Value {
        let mut entity = json!({
            "labels": {"en": {"value": label}},
            "aliases": {"en": aliases.iter().map(|a| json!({"value": a})).collect::<Vec<_>>()},
            "claims": {}
        });
        if let Some(parent) = parent {
            entity["claims"]["P279"] = json!([
                {"mainsnak": {"datavalue": {"value": {"id": parent}}}}
            ]);
        }
        json!({"entities": {id: entity}})
    }

    #[tokio::test]
    async fn test_hierarchy_follows_p279() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path("/api")
                .query_param("action", "wbsearchentities");
            then.status(200).json_body(json!({"search": [{"id": "Q1"}]}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api")
                .query_param("action", "wbgetentities")
                .query_param("ids", "Q1");
            then.status(200)
                .json_body(entity_body("Q1", "rose", &["Rosa"], Some("Q2")));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api")
                .query_param("action", "wbgetentities")
                .query_param("ids", "Q2");
            then.status(200)
                .json_body(entity_body("Q2", "flowering plant", &[], None));
        });
        server.mock(|when, then| {
            when.method(GET).path("/sparql");
            then.status(200).json_body(json!({
                "results": {"bindings": [{"count": {"value": "42"}}]}
            }));
        });

        let source = Wikidata::with_endpoints(
            &server.url("/api"),
            &server.url("/sparql"),
            15,
            5000,
        );
        let entries = source.hierarchy("rose").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "rose");
        assert_eq!(entries[0].synonyms, vec!["rose", "Rosa"]);
        assert_eq!(entries[0].descendants, 42);
        assert_eq!(entries[1].name, "flowering plant");
        assert_eq!(entries[1].depth, 1);
    }

    #[tokio::test]
    async fn test_no_match_returns_leaf() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(json!({"search": []}));
        });

        let source = Wikidata::with_endpoints(
            &server.url("/api"),
            &server.url("/sparql"),
            15,
            5000,
        );
        let entries = source.hierarchy("zzz_nothing").await.unwrap();
        assert_eq!(entries, vec![HierarchyEntry::leaf("zzz nothing")]);
    }

    #[tokio::test]
    async fn test_sparql_failure_degrades_to_zero() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api")
                .query_param("action", "wbsearchentities");
            then.status(200).json_body(json!({"search": [{"id": "Q1"}]}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api")
                .query_param("action", "wbgetentities");
            then.status(200)
                .json_body(entity_body("Q1", "rose", &[], None));
        });
        server.mock(|when, then| {
            when.method(GET).path("/sparql");
            then.status(500);
        });

        let source = Wikidata::with_endpoints(
            &server.url("/api"),
            &server.url("/sparql"),
            15,
            5000,
        );
        let entries = source.hierarchy("rose").await.unwrap();
        assert_eq!(entries[0].descendants, 0);
    }
}
