//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where datasets are stored
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/datasets"),
        }
    }
}

/// Knowledge-base hierarchy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Maximum parent-chain depth for ConceptNet, DBpedia, and GBIF
    pub max_depth: usize,

    /// Maximum parent-chain depth for Wikidata (its P279 chains run deeper
    /// before reaching a root like "entity")
    pub wikidata_max_depth: usize,

    /// Per-request timeout for knowledge-base endpoints in milliseconds
    pub request_timeout_ms: u64,

    /// ConceptNet API endpoint
    pub conceptnet_endpoint: String,

    /// Wikidata API endpoint
    pub wikidata_endpoint: String,

    /// Wikidata SPARQL endpoint
    pub wikidata_sparql_endpoint: String,

    /// GBIF species API endpoint
    pub gbif_endpoint: String,

    /// DBpedia Lookup API endpoint
    pub dbpedia_lookup_endpoint: String,

    /// DBpedia SPARQL endpoint
    pub dbpedia_sparql_endpoint: String,

    /// Path to the local WordNet index file (supports ~ expansion)
    pub wordnet_index: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            wikidata_max_depth: 15,
            request_timeout_ms: 10_000,
            conceptnet_endpoint: "https://api.conceptnet.io".to_string(),
            wikidata_endpoint: "https://www.wikidata.org/w/api.php".to_string(),
            wikidata_sparql_endpoint: "https://query.wikidata.org/sparql".to_string(),
            gbif_endpoint: "https://api.gbif.org/v1".to_string(),
            dbpedia_lookup_endpoint: "https://lookup.dbpedia.org/api/search".to_string(),
            dbpedia_sparql_endpoint: "https://dbpedia.org/sparql".to_string(),
            wordnet_index: "~/.linnea/wordnet/index.tsv".to_string(),
        }
    }
}

/// Evaluation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum tokens requested per model completion
    pub max_tokens: u32,

    /// Sampling temperature for model completions
    pub temperature: f32,

    /// Model call timeout in milliseconds
    pub llm_timeout_ms: u64,

    /// Max retry attempts for transient model failures
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.2,
            llm_timeout_ms: 60_000,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "jsonl".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Model provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama (local) configuration
    pub ollama: Option<OllamaConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Anthropic configuration
    pub anthropic: Option<AnthropicConfig>,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2-vision".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
        }
    }
}
