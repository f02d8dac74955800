//! Specialized parsers for the structured step shapes (3: detail, 4: link,
//! 5: card comparison).
//!
//! Each parser returns `Ok(None)` when the content does not have the expected
//! fields; the caller then keeps the step as plain text. `Err` only signals a
//! pattern that failed to compile.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::response::{ComparisonData, ComparisonItem, DetailData, Fact, LinkData};

static PATTERNS: LazyLock<Result<SectionPatterns, regex::Error>> =
    LazyLock::new(SectionPatterns::new);

struct SectionPatterns {
    // Detail
    labelled_title: Regex,
    leading_title: Regex,
    description: Regex,
    facts_start: Regex,
    headline_label: Regex,
    spaced_fact: Regex,
    tight_fact: Regex,

    // Link
    labelled_url: Regex,
    spaced_url: Regex,
    bare_url: Regex,
    step_four_marker: Regex,

    // Comparison
    response_intro: Regex,
    card_label: Regex,
    card_name: Regex,
    card_url: Regex,
    card_description: Regex,
    short_highlights: Regex,
    long_highlights: Regex,
    highlight_separator: Regex,
}

impl SectionPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            labelled_title: Regex::new(r"(?is)Title:\s*(.+?)(?:\s*Description:|$)")?,
            leading_title: Regex::new(r"(?is)^(.+?)\s+Description:")?,
            description: Regex::new(
                r"(?is)Description:\s*(.+?)\s*(?:Key Things to Know:|headline:)",
            )?,
            facts_start: Regex::new(r"(?i)Key Things to Know:|headline:")?,
            headline_label: Regex::new(r"(?i)headline:")?,
            spaced_fact: Regex::new(r"(?is)^headline:\s*(.+?)\s+text:\s*(.+)$")?,
            tight_fact: Regex::new(r"(?is)^headline:\s*(.+?)\s*text:\s*(.+)$")?,

            labelled_url: Regex::new(r"(?i)url:\s*(https?://\S+)")?,
            spaced_url: Regex::new(r"(?i)url\s+(https?://\S+)")?,
            bare_url: Regex::new(r"(?i)(https?://\S+)")?,
            step_four_marker: Regex::new(r"(?i)^step\s*4:\s*")?,

            response_intro: Regex::new(r"(?is)Response:\s*(.+?)(?:\s*Credit Card Name:|$)")?,
            card_label: Regex::new(r"(?i)Credit Card Name:")?,
            card_name: Regex::new(r"(?is)^(.+?)(?:\s*URL:|$)")?,
            card_url: Regex::new(r"(?i)URL:\s*(https?://\S+)")?,
            card_description: Regex::new(
                r"(?is)1 sentence description:\s*(.+?)(?:\s*(?:2 highlights|5 highlights|Credit Card Name):|$)",
            )?,
            short_highlights: Regex::new(
                r"(?is)2 highlights:\s*(.+?)(?:\s*(?:5 highlights|Credit Card Name):|$)",
            )?,
            long_highlights: Regex::new(r"(?is)5 highlights:\s*(.+?)(?:\s*Credit Card Name:|$)")?,
            highlight_separator: Regex::new(r"[;,\n]")?,
        })
    }
}

fn patterns() -> Result<&'static SectionPatterns, ParseError> {
    PATTERNS.as_ref().map_err(|e| ParseError::Pattern(e.clone()))
}

/// First capture group of `re` in `text`, trimmed. Empty when absent.
fn capture_trimmed(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Parse a step 3 body: `[Title:] <title> Description: <text> Key Things to
/// Know: headline: <h> text: <t> ...`.
pub(crate) fn parse_detail(content: &str) -> Result<Option<DetailData>, ParseError> {
    let p = patterns()?;

    let title = if p.labelled_title.is_match(content) {
        capture_trimmed(&p.labelled_title, content)
    } else {
        capture_trimmed(&p.leading_title, content)
    };
    let description = capture_trimmed(&p.description, content);

    if title.is_empty() || description.is_empty() {
        tracing::debug!(%title, %description, "detail step is missing title or description");
        return Ok(None);
    }

    let facts_section = match p.facts_start.find(content) {
        Some(m) => &content[m.start()..],
        None => content,
    };

    let mut facts = extract_facts(facts_section, &p.headline_label, &p.spaced_fact, true);
    if facts.is_empty() {
        facts = extract_facts(facts_section, &p.headline_label, &p.tight_fact, false);
    }

    if facts.is_empty() {
        return Ok(None);
    }

    Ok(Some(DetailData {
        title,
        description,
        facts,
    }))
}

/// Split `section` at `headline:` labels and read one fact from each piece.
/// When `spaced` is set, a label only starts a new fact if whitespace precedes it.
fn extract_facts(section: &str, label: &Regex, fact: &Regex, spaced: bool) -> Vec<Fact> {
    let starts: Vec<usize> = label
        .find_iter(section)
        .map(|m| m.start())
        .enumerate()
        .filter(|&(i, start)| {
            i == 0 || !spaced || section[..start].ends_with(char::is_whitespace)
        })
        .map(|(_, start)| start)
        .collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(section.len());
            let caps = fact.captures(&section[start..end])?;
            let headline = caps.get(1)?.as_str().trim();
            let text = caps.get(2)?.as_str().trim();
            if headline.is_empty() || text.is_empty() {
                return None;
            }
            Some(Fact {
                headline: headline.to_string(),
                text: text.to_string(),
            })
        })
        .collect()
}

/// Parse a step 4 body: a URL (labelled or bare) followed by the narrative.
pub(crate) fn parse_link(content: &str) -> Result<Option<LinkData>, ParseError> {
    let p = patterns()?;

    let found = [&p.labelled_url, &p.spaced_url, &p.bare_url]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(content)?;
            let whole = caps.get(0)?;
            let url = caps.get(1)?;
            Some((url.as_str().trim().to_string(), whole.end()))
        });

    let Some((url, end)) = found else {
        return Ok(None);
    };

    let rest = content[end..].trim();
    let text = p.step_four_marker.replace(rest, "").trim().to_string();

    if url.is_empty() || text.is_empty() {
        return Ok(None);
    }

    Ok(Some(LinkData { url, text }))
}

/// Parse a step 5 body: `Response: <intro>` followed by repeated
/// `Credit Card Name:` blocks.
pub(crate) fn parse_comparison(
    content: &str,
    limits: &ParserConfig,
) -> Result<Option<ComparisonData>, ParseError> {
    let p = patterns()?;

    let intro = capture_trimmed(&p.response_intro, content);
    if intro.is_empty() {
        return Ok(None);
    }

    // A comparison of nothing is not a comparison.
    let wanted = limits.comparison_items.max(1);
    let mut items: Vec<ComparisonItem> = p
        .card_label
        .split(content)
        .skip(1)
        .filter_map(|segment| parse_card(p, segment.trim(), limits))
        .collect();

    if items.len() < wanted {
        tracing::debug!(
            found = items.len(),
            needed = wanted,
            "not enough well-formed cards"
        );
        return Ok(None);
    }
    items.truncate(wanted);

    Ok(Some(ComparisonData { intro, items }))
}

fn parse_card(p: &SectionPatterns, segment: &str, limits: &ParserConfig) -> Option<ComparisonItem> {
    let name = capture_trimmed(&p.card_name, segment);
    let url = capture_trimmed(&p.card_url, segment);
    let description = capture_trimmed(&p.card_description, segment);

    let short_highlights = split_highlights(
        &p.highlight_separator,
        &capture_trimmed(&p.short_highlights, segment),
    );

    let mut long_highlights = split_highlights(
        &p.highlight_separator,
        &capture_trimmed(&p.long_highlights, segment),
    );
    // The last card's list tends to swallow the closing prose.
    long_highlights.truncate(limits.max_long_highlights);

    if name.is_empty()
        || url.is_empty()
        || description.is_empty()
        || short_highlights.len() < limits.min_short_highlights.max(1)
    {
        return None;
    }

    Some(ComparisonItem {
        name,
        url,
        description,
        short_highlights,
        long_highlights: if long_highlights.is_empty() {
            None
        } else {
            Some(long_highlights)
        },
    })
}

fn split_highlights(separator: &Regex, text: &str) -> Vec<String> {
    separator
        .split(text)
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}
