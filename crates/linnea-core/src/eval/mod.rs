//! Evaluation building blocks: prompt construction, prediction scoring, and
//! seeded subset sampling.
//!
//! The CLI drives the actual loop; this module holds the pure pieces so they
//! can be tested without a model in the room.

pub mod prompts;
pub mod sampling;
pub mod scoring;

pub use prompts::{numbered_class_list, PromptStyle};
pub use sampling::sample_indices;
pub use scoring::{extract_answer, matches_label, normalize};
