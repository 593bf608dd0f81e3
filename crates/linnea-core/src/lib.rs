//! Linnea Core - Vision-language evaluation and label hierarchy library.
//!
//! Linnea wraps image classification benchmarks behind a uniform indexable
//! interface, builds "is-a" hierarchies for class labels from external
//! knowledge bases, and scores multimodal-model predictions against ground
//! truth with text-matching heuristics.
//!
//! # Architecture
//!
//! Three independent groups, none of which call into each other at runtime:
//!
//! ```text
//! Dataset → (image path, class index) + label table
//! Label   → hierarchy source → [(name, synonyms, depth, descendants), ...]
//! Image   → model provider   → prediction text → score vs ground truth
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use linnea_core::dataset::{Caltech101, Dataset};
//! use linnea_core::eval::scoring;
//!
//! let dataset = Caltech101::open("~/datasets".as_ref())?;
//! let sample = dataset.sample(0)?;
//! let label = dataset.class_name(sample.class_index).unwrap();
//! assert!(scoring::matches_label("an accordion on a table", label));
//! ```

// Module declarations
pub mod config;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod hierarchy;
pub mod llm;
pub mod output;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use dataset::{Dataset, Sample, Split};
pub use error::{
    ConfigError, DatasetError, EvalError, HierarchyError, LinneaError, Result,
};
pub use hierarchy::{HierarchyEntry, HierarchySource};
pub use llm::{ImageInput, LlmProvider, LlmRequest, LlmResponse};
pub use output::{OutputFormat, OutputWriter};
pub use types::{ClassPredictions, EvalSummary, PredictionRecord, RunRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
