//! Prompt templates for the evaluation loop.
//!
//! Three styles: closed-set (candidate list included), open-world (model
//! answers freely), and reasoning (model thinks step by step and wraps the
//! final answer in `<answer>` tags).

use std::fmt;

/// How the model is prompted for each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Model picks from the dataset's class list.
    Closed,
    /// Model answers freely with the most specific label it can.
    Open,
    /// Model reasons step by step, final answer in `<answer></answer>` tags.
    Reasoning,
}

impl PromptStyle {
    /// Parse a style name from the CLI.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "closed" => Some(Self::Closed),
            "open" => Some(Self::Open),
            "reasoning" => Some(Self::Reasoning),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Reasoning => "reasoning",
        }
    }

    /// Whether predictions from this style need `<answer>` extraction.
    pub fn needs_extraction(&self) -> bool {
        matches!(self, Self::Reasoning)
    }

    /// Build the prompt text for a dataset's class list.
    ///
    /// Only the closed-set style uses the class list; the others ignore it.
    pub fn build(&self, classes: &[String]) -> String {
        match self {
            Self::Closed => format!(
                "Identify the subject of this image. Choose from the following list of \
                 categories:\n\n{}\n\nProvide your answer as the category name.",
                numbered_class_list(classes)
            ),
            Self::Open => "Analyze the given image and predict the most specific and \
                 accurate label possible for the primary object or scene depicted. Use \
                 scientific or technical terms when applicable to enhance specificity. \
                 If there is uncertainty about the exact label, provide a more general \
                 category or abstain from making a prediction. Ensure that all \
                 predictions are accurate and avoid guessing. The response should only \
                 contain the possible classification label, limited to a maximum of \
                 1-3 words."
                .to_string(),
            Self::Reasoning => "What type of object is in this photo? Think step by \
                 step and give the final answer in <answer> </answer> tags."
                .to_string(),
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format class names as a numbered list, one per line ("1. name").
pub fn numbered_class_list(classes: &[String]) -> String {
    classes
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n")
}
