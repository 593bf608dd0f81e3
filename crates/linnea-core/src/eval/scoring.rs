//! Text heuristics for scoring model predictions against ground truth.

use regex::Regex;
use std::sync::OnceLock;

/// Normalize a label or prediction for comparison: lowercase, underscores and
/// punctuation become spaces, runs of whitespace collapse to one space.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c == '_' || c.is_ascii_punctuation() {
                ' '
            } else {
                c
            }
        })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn answer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<answer>(.*?)</answer>").unwrap())
}

/// Extract the content of the first `<answer>...</answer>` block.
///
/// Returns `None` when the tags are missing; the caller counts these as
/// invalid outputs.
pub fn extract_answer(text: &str) -> Option<String> {
    answer_regex()
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// True when `needle`'s word sequence appears contiguously in `haystack`.
fn contains_words(haystack: &str, needle: &str) -> bool {
    let needle_words: Vec<&str> = needle.split(' ').collect();
    haystack
        .split(' ')
        .collect::<Vec<_>>()
        .windows(needle_words.len())
        .any(|window| window == needle_words.as_slice())
}

/// Decide whether a prediction matches a ground-truth label.
///
/// After normalization: exact equality, or whole-word containment in either
/// direction ("a barn owl on a fence" matches "Barn_Owl"; "crowd" does not
/// match "crow").
pub fn matches_label(prediction: &str, label: &str) -> bool {
    let pred = normalize(prediction);
    let label = normalize(label);
    if pred.is_empty() || label.is_empty() {
        return false;
    }
    pred == label || contains_words(&pred, &label) || contains_words(&label, &pred)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_underscores_and_case() {
        assert_eq!(normalize("Black_footed_Albatross"), "black footed albatross");
    }

    #[test]
    fn test_normalize_punctuation_and_whitespace() {
        assert_eq!(normalize("  a  barn-owl, perched.  "), "a barn owl perched");
    }

    #[test]
    fn test_extract_answer() {
        let text = "Let me think.\nThe wings are long.\n<answer>albatross</answer>";
        assert_eq!(extract_answer(text), Some("albatross".to_string()));
    }

    #[test]
    fn test_extract_answer_multiline_content() {
        let text = "<answer>\nbarn\nowl\n</answer>";
        assert_eq!(extract_answer(text), Some("barn\nowl".to_string()));
    }

    #[test]
    fn test_extract_answer_missing_tags() {
        assert_eq!(extract_answer("I think it is an owl."), None);
    }

    #[test]
    fn test_matches_exact() {
        assert!(matches_label("Barn Owl", "barn_owl"));
    }

    #[test]
    fn test_matches_label_inside_prediction() {
        assert!(matches_label("a barn owl on a fence", "Barn_Owl"));
    }

    #[test]
    fn test_matches_prediction_inside_label() {
        assert!(matches_label("albatross", "Black_footed_Albatross"));
    }

    #[test]
    fn test_no_partial_word_match() {
        assert!(!matches_label("crowd", "crow"));
    }

    #[test]
    fn test_empty_prediction_never_matches() {
        assert!(!matches_label("", "barn owl"));
        assert!(!matches_label("   ", "barn owl"));
    }
}
