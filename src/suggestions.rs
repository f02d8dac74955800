//! Follow-up question suggestions shown under an assistant reply.
//!
//! The upstream model is asked for a JSON object with a `questions` array;
//! whatever comes back is cleaned up here, falling back to plain-text lines and
//! finally to a fixed set of defaults.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SuggestionConfig;

static ENUMERATED_LINE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]"));

const TRAVEL: &str = "\u{2708}\u{fe0f}";
const MONEY: &str = "\u{1f4b0}";
const GIFT: &str = "\u{1f381}";
const CARD: &str = "\u{1f4b3}";
const MEMO: &str = "\u{1f4dd}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedQuestion {
    pub question: String,
    pub icon: String,
}

impl SuggestedQuestion {
    fn new(question: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            icon: icon.into(),
        }
    }
}

/// Suggestions used when nothing usable came back.
pub fn default_suggestions() -> Vec<SuggestedQuestion> {
    vec![
        SuggestedQuestion::new("Tell me more about this", CARD),
        SuggestedQuestion::new("What are the benefits?", GIFT),
        SuggestedQuestion::new("How do I apply?", MEMO),
    ]
}

/// Pick an icon for a question from its keywords.
pub fn icon_for_question(question: &str) -> &'static str {
    let lower = question.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["travel", "flight", "hotel"]) {
        TRAVEL
    } else if has(&["cash back", "cashback", "money"]) {
        MONEY
    } else if has(&["reward", "points", "bonus"]) {
        GIFT
    } else if has(&["fee", "annual", "cost"]) {
        CARD
    } else if has(&["apply", "application", "qualify"]) {
        MEMO
    } else {
        CARD
    }
}

/// Keep at most `max_words` whitespace-separated words, marking the cut with "...".
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.trim().to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}

/// Turn the model's completion into at most `config.count` suggestions.
pub fn parse_suggestions(completion: &str, config: &SuggestionConfig) -> Vec<SuggestedQuestion> {
    let suggestions = match serde_json::from_str::<Value>(completion) {
        Ok(value) => from_json(&value, config),
        Err(_) => from_lines(completion, config),
    };

    if suggestions.is_empty() {
        tracing::debug!("no usable suggestions, using defaults");
        return default_suggestions();
    }
    suggestions
}

fn from_json(value: &Value, config: &SuggestionConfig) -> Vec<SuggestedQuestion> {
    let entries = value
        .get("questions")
        .or_else(|| value.get("results"))
        .and_then(Value::as_array);

    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let question = entry.get("question")?.as_str()?.trim();
            let icon = entry.get("icon")?.as_str()?.trim();
            if question.is_empty() || icon.is_empty() {
                return None;
            }
            Some(SuggestedQuestion::new(
                truncate_words(question, config.max_words),
                icon,
            ))
        })
        .take(config.count)
        .collect()
}

fn from_lines(completion: &str, config: &SuggestionConfig) -> Vec<SuggestedQuestion> {
    let enumerated = match ENUMERATED_LINE.as_ref() {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("skipping plain-text suggestions: {}", e);
            return Vec::new();
        }
    };

    completion
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !enumerated.is_match(line))
        .take(config.count)
        .map(|line| SuggestedQuestion::new(line, icon_for_question(line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SuggestionConfig {
        SuggestionConfig::default()
    }

    #[test]
    fn json_questions() {
        let completion = r#"{"questions": [
            {"question": " Which card has the best lounge access? ", "icon": "✈️"},
            {"question": "What about fees?", "icon": "💳"}
        ]}"#;
        assert_eq!(
            parse_suggestions(completion, &config()),
            vec![
                SuggestedQuestion::new("Which card has the best lounge access?", "✈️"),
                SuggestedQuestion::new("What about fees?", "💳"),
            ]
        );
    }

    #[test]
    fn json_results_key_and_limits() {
        let completion = r#"{"results": [
            {"question": "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty", "icon": "🎁"},
            {"question": "", "icon": "💳"},
            {"question": "b", "icon": "💳"},
            {"question": "c", "icon": "💳"},
            {"question": "d", "icon": "💳"}
        ]}"#;
        let parsed = parse_suggestions(completion, &config());
        assert_eq!(parsed.len(), 3);
        assert_eq!(
            parsed[0].question,
            "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen..."
        );
        assert_eq!(parsed[1].question, "b");
        assert_eq!(parsed[2].question, "c");
    }

    #[test]
    fn json_without_questions_uses_defaults() {
        assert_eq!(
            parse_suggestions(r#"{"questions": []}"#, &config()),
            default_suggestions()
        );
        assert_eq!(parse_suggestions("[1, 2]", &config()), default_suggestions());
    }

    #[test]
    fn plain_text_lines() {
        let completion = "1. Numbered lines are skipped\nHow do travel points work?\n\nIs the annual fee worth it?\nCan I get cash back?\nExtra line";
        assert_eq!(
            parse_suggestions(completion, &config()),
            vec![
                SuggestedQuestion::new("How do travel points work?", TRAVEL),
                SuggestedQuestion::new("Is the annual fee worth it?", CARD),
                SuggestedQuestion::new("Can I get cash back?", MONEY),
            ]
        );
    }

    #[test]
    fn enumerated_lines_are_skipped() {
        assert!(ENUMERATED_LINE.is_ok());
        let parsed = from_lines("1. One\n2) Two\n10. Ten\nThree", &config());
        assert_eq!(parsed, vec![SuggestedQuestion::new("Three", CARD)]);
    }

    #[test]
    fn empty_completion_uses_defaults() {
        assert_eq!(parse_suggestions("", &config()), default_suggestions());
    }

    #[test]
    fn icons_by_keyword() {
        assert_eq!(icon_for_question("Best HOTEL perks?"), TRAVEL);
        assert_eq!(icon_for_question("Where does my money go?"), MONEY);
        assert_eq!(icon_for_question("Sign-up bonus?"), GIFT);
        assert_eq!(icon_for_question("How do I qualify?"), MEMO);
        assert_eq!(icon_for_question("Anything else?"), CARD);
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate_words("  a b c  ", 18), "a b c");
        assert_eq!(truncate_words("a b c", 2), "a b...");
    }
}
