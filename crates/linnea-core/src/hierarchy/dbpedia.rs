//! DBpedia ontology hierarchy source.
//!
//! A label is resolved to a resource through the Lookup API, the resource's
//! most specific `rdf:type` in the DBpedia ontology namespace is chosen,
//! and the class chain is walked upward over direct `rdfs:subClassOf`
//! links. Generic types (`Thing`, `Agent`) are skipped when picking the
//! starting class.

use super::{clean_label, ChainStep, HierarchyEntry, HierarchySource, ParentChain};
use crate::error::HierarchyError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "dbpedia";
const ONTOLOGY_NS: &str = "http://dbpedia.org/ontology/";

pub struct DbPedia {
    client: reqwest::Client,
    lookup_endpoint: String,
    sparql_endpoint: String,
    max_depth: usize,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    docs: Vec<LookupDoc>,
}

#[derive(Debug, Deserialize)]
struct LookupDoc {
    #[serde(default)]
    resource: Vec<String>,
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

impl DbPedia {
    pub fn new(max_depth: usize, timeout_ms: u64) -> Self {
        Self::with_endpoints(
            "https://lookup.dbpedia.org/api/search",
            "https://dbpedia.org/sparql",
            max_depth,
            timeout_ms,
        )
    }

    pub fn with_endpoints(
        lookup_endpoint: &str,
        sparql_endpoint: &str,
        max_depth: usize,
        timeout_ms: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            lookup_endpoint: lookup_endpoint.to_string(),
            sparql_endpoint: sparql_endpoint.to_string(),
            max_depth,
        }
    }

    /// Resolve a term to a resource URI via the Lookup API.
    async fn lookup_resource(&self, term: &str) -> Result<Option<String>, HierarchyError> {
        let response = self
            .client
            .get(&self.lookup_endpoint)
            .query(&[("query", term), ("format", "json"), ("maxResults", "1")])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} from lookup"),
                status_code: Some(status.as_u16()),
            });
        }

        let body: LookupResponse = response.json().await.map_err(parse_error)?;
        Ok(body
            .docs
            .into_iter()
            .next()
            .and_then(|doc| doc.resource.into_iter().next()))
    }

    async fn sparql_bindings(&self, query: &str) -> Result<Vec<serde_json::Value>, HierarchyError> {
        let response = self
            .client
            .get(&self.sparql_endpoint)
            .query(&[("query", query), ("format", "json")])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HierarchyError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status} from SPARQL endpoint"),
                status_code: Some(status.as_u16()),
            });
        }

        let body: SparqlResponse = response.json().await.map_err(parse_error)?;
        Ok(body.results.bindings)
    }

    /// Ontology types of a resource, in endpoint order.
    async fn resource_types(&self, resource_uri: &str) -> Result<Vec<String>, HierarchyError> {
        let query = format!(
            "SELECT DISTINCT ?type WHERE {{ <{resource_uri}> \
             <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> ?type . \
             FILTER (STRSTARTS(str(?type), \"{ONTOLOGY_NS}\")) }}"
        );
        let bindings = self.sparql_bindings(&query).await?;
        Ok(bindings
            .iter()
            .filter_map(|b| b["type"]["value"].as_str().map(str::to_string))
            .collect())
    }

    /// English label of an ontology class; the URI fragment when unlabeled.
    async fn class_label(&self, class_uri: &str) -> Result<String, HierarchyError> {
        let query = format!(
            "SELECT ?label WHERE {{ <{class_uri}> \
             <http://www.w3.org/2000/01/rdf-schema#label> ?label . \
             FILTER (lang(?label) = \"en\") }}"
        );
        let bindings = self.sparql_bindings(&query).await?;
        Ok(bindings
            .first()
            .and_then(|b| b["label"]["value"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| uri_fragment(class_uri)))
    }

    /// Count of direct ontology subclasses.
    async fn subclass_count(&self, class_uri: &str) -> Result<u64, HierarchyError> {
        let query = format!(
            "SELECT (COUNT(DISTINCT ?subClass) as ?count) WHERE {{ \
             ?subClass <http://www.w3.org/2000/01/rdf-schema#subClassOf> <{class_uri}> . \
             FILTER (STRSTARTS(str(?subClass), \"{ONTOLOGY_NS}\")) }}"
        );
        let bindings = self.sparql_bindings(&query).await?;
        Ok(bindings
            .first()
            .and_then(|b| b["count"]["value"].as_str())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    /// Direct superclass within the ontology namespace, if any.
    async fn superclass(&self, class_uri: &str) -> Result<Option<String>, HierarchyError> {
        let query = format!(
            "SELECT ?superClass WHERE {{ <{class_uri}> \
             <http://www.w3.org/2000/01/rdf-schema#subClassOf> ?superClass . \
             FILTER (STRSTARTS(str(?superClass), \"{ONTOLOGY_NS}\")) }} LIMIT 1"
        );
        let bindings = self.sparql_bindings(&query).await?;
        Ok(bindings
            .first()
            .and_then(|b| b["superClass"]["value"].as_str())
            .map(str::to_string))
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

/// Last path segment of a URI, underscores as spaces.
fn uri_fragment(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or(uri).replace('_', " ")
}

fn is_generic(type_uri: &str) -> bool {
    type_uri.contains("Thing") || type_uri.contains("Agent")
}

#[async_trait]
impl ParentChain for DbPedia {
    async fn expand(&self, class_uri: &str, depth: usize) -> Result<ChainStep, HierarchyError> {
        let name = self.class_label(class_uri).await?;
        let entry = HierarchyEntry {
            name: name.clone(),
            synonyms: vec![name],
            depth,
            descendants: self.subclass_count(class_uri).await?,
        };
        let parent = self.superclass(class_uri).await?.filter(|uri| !is_generic(uri));
        Ok(ChainStep { entry, parent })
    }
}

#[async_trait]
impl HierarchySource for DbPedia {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn hierarchy(&self, label: &str) -> Result<Vec<HierarchyEntry>, HierarchyError> {
        let clean = clean_label(label);
        let Some(resource) = self.lookup_resource(&clean).await? else {
            debug!(label = %clean, "No DBpedia match, returning leaf");
            return Ok(vec![HierarchyEntry::leaf(&clean)]);
        };

        let types = self.resource_types(&resource).await?;
        let main_type = types
            .iter()
            .find(|t| !is_generic(t))
            .or_else(|| types.first())
            .cloned();

        let Some(main_type) = main_type else {
            // Untyped resource: fall back to the resource name itself
            return Ok(vec![HierarchyEntry::leaf(&uri_fragment(&resource))]);
        };

        super::walk_chain(self, main_type, self.max_depth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn bindings(values: serde_json::Value) -> serde_json::Value {
        json!({"results": {"bindings": values}})
    }

    /// True when the request carries a `query` param containing `needle`.
    fn query_contains(req: &HttpMockRequest, needle: &str) -> bool {
        req.query_params
            .as_ref()
            .is_some_and(|params| params.iter().any(|(k, v)| k == "query" && v.contains(needle)))
    }

    #[test]
    fn test_uri_fragment() {
        assert_eq!(
            uri_fragment("http://dbpedia.org/resource/Water_lily"),
            "Water lily"
        );
    }

    #[tokio::test]
    async fn test_hierarchy_walks_subclass_chain() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/lookup");
            then.status(200).json_body(json!({
                "docs": [{"resource": ["http://dbpedia.org/resource/Rose"]}]
            }));
        });
        // Types of the resource: Thing first, then Plant
        server.mock(|when, then| {
            when.method(GET)
                .path("/sparql")
                .matches(|req| query_contains(req, "rdf-syntax-ns#type"));
            then.status(200).json_body(bindings(json!([
                {"type": {"value": "http://www.w3.org/2002/07/owl#Thing"}},
                {"type": {"value": "http://dbpedia.org/ontology/Plant"}}
            ])));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/sparql")
                .matches(|req| query_contains(req, "rdf-schema#label"));
            then.status(200)
                .json_body(bindings(json!([{"label": {"value": "plant"}}])));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/sparql")
                .matches(|req| query_contains(req, "COUNT"));
            then.status(200)
                .json_body(bindings(json!([{"count": {"value": "17"}}])));
        });
        // No superclass within the ontology namespace
        server.mock(|when, then| {
            when.method(GET)
                .path("/sparql")
                .matches(|req| query_contains(req, "superClass"));
            then.status(200).json_body(bindings(json!([])));
        });

        let source = DbPedia::with_endpoints(
            &server.url("/lookup"),
            &server.url("/sparql"),
            10,
            5000,
        );
        let entries = source.hierarchy("rose").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "plant");
        assert_eq!(entries[0].descendants, 17);
    }

    #[tokio::test]
    async fn test_no_lookup_match_returns_leaf() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lookup");
            then.status(200).json_body(json!({"docs": []}));
        });

        let source = DbPedia::with_endpoints(
            &server.url("/lookup"),
            &server.url("/sparql"),
            10,
            5000,
        );
        let entries = source.hierarchy("zzz").await.unwrap();
        assert_eq!(entries, vec![HierarchyEntry::leaf("zzz")]);
    }

    #[tokio::test]
    async fn test_untyped_resource_returns_resource_leaf() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lookup");
            then.status(200).json_body(json!({
                "docs": [{"resource": ["http://dbpedia.org/resource/Odd_thing"]}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/sparql");
            then.status(200).json_body(bindings(json!([])));
        });

        let source = DbPedia::with_endpoints(
            &server.url("/lookup"),
            &server.url("/sparql"),
            10,
            5000,
        );
        let entries = source.hierarchy("odd thing").await.unwrap();
        assert_eq!(entries, vec![HierarchyEntry::leaf("Odd thing")]);
    }
}
