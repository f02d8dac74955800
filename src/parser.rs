use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::response::{ParsedResponse, ParsedStep, StepKind};
use crate::sections;

static PATTERNS: LazyLock<Result<MarkerPatterns, regex::Error>> =
    LazyLock::new(MarkerPatterns::new);

struct MarkerPatterns {
    // A marker that opens a step: "Step 2:", "STEP 3 -", "step4." ...
    // Each has a `marker` group where the step starts, a `number` and a `sep`.
    line_marker: Regex,
    // Mid-line markers must start a sentence, be capitalised and carry a
    // colon, so "skip step 2 if" stays prose.
    inline_marker: Regex,
    // Where the previous step's content stops, at the `marker` group.
    line_boundary: Regex,
    inline_boundary: Regex,
    whole_reply: Regex,
    leading_marker: Regex,
    sentence_end: Regex,
}

impl MarkerPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            line_marker: Regex::new(
                r"(?i)(?:^|\n)(?P<marker>step\s*(?P<number>\d+)(?P<sep>[:\s\-.]+))",
            )?,
            inline_marker: Regex::new(
                r"(?:^|\n|[.!?][ \t]+)(?P<marker>(?:Step|STEP)[ \t]*(?P<number>\d+)(?P<sep>[ \t]*:[:\s\-.]*))",
            )?,
            line_boundary: Regex::new(r"(?i)\n(?P<marker>step\s*\d+)")?,
            inline_boundary: Regex::new(
                r"(?:\n|[.!?][ \t]+)(?P<marker>(?:Step|STEP)[ \t]*\d+[ \t]*:)",
            )?,
            whole_reply: Regex::new(r"(?is)^\s*step\s*(\d+)[:\s\-.]+\s*(.+)$")?,
            leading_marker: Regex::new(r"(?i)^step\s*\d+[:\s\-.]+\s*")?,
            sentence_end: Regex::new(r"[.!?](?:\s|$)")?,
        })
    }
}

/// How step markers were located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Markers begin a line; a step runs until the next line-leading marker.
    Strict,
    /// Markers may also open a sentence mid-line, so steps can share a line.
    Relaxed,
    /// The reply opens with a marker, possibly indented; everything after it
    /// is one step.
    WholeReply,
}

/// One located step before classification.
#[derive(Debug)]
struct StepSpan<'a> {
    /// Offset of the marker word.
    start: usize,
    /// Offset where the step's content ends.
    end: usize,
    number: &'a str,
    content: &'a str,
}

/// Parse a reply into intro, steps and conclusion.
///
/// Never fails: replies without markers, and any internal failure, give
/// [`ParsedResponse::empty`].
pub fn parse(reply: &str, config: &ParserConfig) -> ParsedResponse {
    if reply.is_empty() {
        return ParsedResponse::empty();
    }

    match try_parse(reply, config) {
        Ok(response) => response,
        Err(e) => {
            warn!("falling back to unparsed reply: {}", e);
            ParsedResponse::empty()
        }
    }
}

fn try_parse(reply: &str, config: &ParserConfig) -> Result<ParsedResponse, ParseError> {
    let patterns = PATTERNS.as_ref().map_err(|e| ParseError::Pattern(e.clone()))?;

    let Some((strategy, spans)) = locate_steps(reply, patterns) else {
        return Ok(ParsedResponse::empty());
    };
    debug!(count = spans.len(), ?strategy, "found steps in reply");

    let mut steps = Vec::with_capacity(spans.len());
    for span in &spans {
        steps.push(build_step(span, patterns, config)?);
    }

    let intro = spans
        .first()
        .filter(|first| first.start > 0)
        .map(|first| reply[..first.start].trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let conclusion = spans
        .last()
        .map(|last| reply[last.end..].trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Ok(ParsedResponse {
        intro,
        steps,
        conclusion,
        has_steps: true,
    })
}

/// Try the detection strategies in order. Relaxed matching is used when strict
/// found nothing, or when the single strict step is the head of a run of
/// same-line markers.
fn locate_steps<'a>(
    reply: &'a str,
    patterns: &MarkerPatterns,
) -> Option<(Strategy, Vec<StepSpan<'a>>)> {
    let strict = scan(reply, Strategy::Strict, patterns);
    if strict.len() <= 1 {
        let relaxed = scan(reply, Strategy::Relaxed, patterns);
        let splits_strict = match (strict.first(), relaxed.first()) {
            (None, Some(_)) => true,
            (Some(only), Some(first)) => relaxed.len() > 1 && first.start == only.start,
            _ => false,
        };
        if splits_strict {
            return Some((Strategy::Relaxed, relaxed));
        }
    }
    if !strict.is_empty() {
        return Some((Strategy::Strict, strict));
    }

    let caps = patterns.whole_reply.captures(reply)?;
    debug!("matched single step at start of reply");
    Some((
        Strategy::WholeReply,
        vec![StepSpan {
            start: 0,
            end: reply.len(),
            number: caps.get(1)?.as_str(),
            content: caps.get(2)?.as_str(),
        }],
    ))
}

fn scan<'a>(reply: &'a str, strategy: Strategy, patterns: &MarkerPatterns) -> Vec<StepSpan<'a>> {
    let (marker, boundary) = match strategy {
        Strategy::Relaxed => (&patterns.inline_marker, &patterns.inline_boundary),
        _ => (&patterns.line_marker, &patterns.line_boundary),
    };

    let mut spans = Vec::new();
    let mut pos = 0;

    while pos <= reply.len() {
        let Some(caps) = marker.captures_at(reply, pos) else {
            break;
        };
        let (Some(whole), Some(marker_word), Some(number), Some(separator)) = (
            caps.get(0),
            caps.name("marker"),
            caps.name("number"),
            caps.name("sep"),
        ) else {
            break;
        };

        // Content needs at least one character. If the separator ran to the end
        // of the reply it gives its last character back, as long as one remains.
        let mut content_start = whole.end();
        if content_start == reply.len() {
            match separator.as_str().char_indices().last() {
                Some((offset, _)) if offset > 0 => content_start = separator.start() + offset,
                _ => {
                    pos = next_char(reply, whole.start());
                    continue;
                }
            }
        }

        // The next search resumes where the boundary match begins, so the
        // sentence end or newline in front of the next marker is seen again.
        let search_from = next_char(reply, content_start);
        let (mut end, next_pos) = boundary
            .captures_at(reply, search_from)
            .and_then(|next| Some((next.name("marker")?.start(), next.get(0)?.start())))
            .unwrap_or((reply.len(), reply.len() + 1));

        if strategy == Strategy::Relaxed
            && end == reply.len()
            && is_mid_line(reply, marker_word.start())
        {
            // A marker inside prose covers one sentence; the rest is conclusion.
            if let Some(m) = patterns.sentence_end.find(&reply[content_start..]) {
                end = content_start + m.start() + 1;
            }
        }

        spans.push(StepSpan {
            start: marker_word.start(),
            end,
            number: number.as_str(),
            content: &reply[content_start..end],
        });
        pos = next_pos;
    }

    spans
}

/// Byte offset of the character after the one starting at `offset`.
fn next_char(text: &str, offset: usize) -> usize {
    text[offset..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| offset + c.len_utf8())
}

fn is_mid_line(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    !text[line_start..offset].trim().is_empty()
}

fn build_step(
    span: &StepSpan<'_>,
    patterns: &MarkerPatterns,
    config: &ParserConfig,
) -> Result<ParsedStep, ParseError> {
    let number = span.number.parse::<u32>().unwrap_or(1);
    let content = patterns
        .leading_marker
        .replace(span.content.trim(), "")
        .trim()
        .to_string();

    debug!(number, preview = %preview(&content, 100), "step detected");

    let kind = match number {
        3 => sections::parse_detail(&content)?.map(|detail| StepKind::Detail { detail }),
        4 => sections::parse_link(&content)?.map(|link| StepKind::Link { link }),
        5 => sections::parse_comparison(&content, config)?
            .map(|comparison| StepKind::Comparison { comparison }),
        _ => Some(StepKind::Plain),
    };

    let kind = match kind {
        Some(kind) => kind,
        None => {
            debug!(number, preview = %preview(&content, 200), "structured parse failed, keeping plain text");
            StepKind::Plain
        }
    };

    Ok(ParsedStep {
        number,
        content,
        kind,
    })
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(reply: &str) -> ParsedResponse {
        parse(reply, &ParserConfig::default())
    }

    fn numbers(response: &ParsedResponse) -> Vec<u32> {
        response.steps.iter().map(|s| s.number).collect()
    }

    fn contents(response: &ParsedResponse) -> Vec<&str> {
        response.steps.iter().map(|s| s.content.as_str()).collect()
    }

    #[test]
    fn inline_steps_on_one_line() {
        let parsed = run("Step 1: Intro text here. Step 2: More text.");
        assert!(parsed.has_steps);
        assert_eq!(numbers(&parsed), [1, 2]);
        assert_eq!(contents(&parsed), ["Intro text here.", "More text."]);
        assert!(parsed.steps.iter().all(ParsedStep::is_plain));
        assert_eq!(parsed.intro, None);
        assert_eq!(parsed.conclusion, None);
    }

    #[test]
    fn marker_inside_prose() {
        let parsed = run("Before text. Step 1: Hello. After text.");
        assert_eq!(parsed.intro.as_deref(), Some("Before text."));
        assert_eq!(numbers(&parsed), [1]);
        assert_eq!(contents(&parsed), ["Hello."]);
        assert_eq!(parsed.conclusion.as_deref(), Some("After text."));
    }

    #[test]
    fn mid_line_step_ends_at_first_sentence() {
        let parsed = run("Quick tip. Step 1: Do this! Then that? Bye.");
        assert_eq!(parsed.intro.as_deref(), Some("Quick tip."));
        assert_eq!(contents(&parsed), ["Do this!"]);
        assert_eq!(parsed.conclusion.as_deref(), Some("Then that? Bye."));
    }

    #[test]
    fn passing_mentions_are_not_markers() {
        assert_eq!(
            run("I'd skip step 2 if you already have a card."),
            ParsedResponse::empty()
        );
        assert_eq!(
            run("Fill it in, then see Step 2: the form."),
            ParsedResponse::empty()
        );
    }

    #[test]
    fn mention_inside_line_step_does_not_split_it() {
        let parsed =
            run("Here you go.\nStep 4: URL: https://x.example/apply Follow step 2 of the form to apply.");
        assert_eq!(parsed.intro.as_deref(), Some("Here you go."));
        assert_eq!(numbers(&parsed), [4]);
        let link = parsed.steps[0].link().unwrap();
        assert_eq!(link.url, "https://x.example/apply");
        assert_eq!(link.text, "Follow step 2 of the form to apply.");
        assert_eq!(parsed.conclusion, None);
    }

    #[test]
    fn indented_reply_is_one_step() {
        let reply = "  Step 2: Indented reply. More.";
        let patterns = PATTERNS.as_ref().unwrap();
        let (strategy, spans) = locate_steps(reply, patterns).unwrap();
        assert_eq!(strategy, Strategy::WholeReply);
        assert_eq!(spans.len(), 1);

        let parsed = run(reply);
        assert_eq!(numbers(&parsed), [2]);
        assert_eq!(contents(&parsed), ["Indented reply. More."]);
        assert_eq!(parsed.intro, None);
        assert_eq!(parsed.conclusion, None);
    }

    #[test]
    fn line_separated_steps() {
        let parsed = run(
            "Here is the plan:\nStep 1: Check your score.\nIt matters.\nSTEP 2 - Pick a card.\nstep 7. Apply.",
        );
        assert_eq!(parsed.intro.as_deref(), Some("Here is the plan:"));
        assert_eq!(numbers(&parsed), [1, 2, 7]);
        assert_eq!(
            contents(&parsed),
            ["Check your score.\nIt matters.", "Pick a card.", "Apply."]
        );
        assert_eq!(parsed.conclusion, None);
    }

    #[test]
    fn line_steps_ignore_inline_mentions() {
        let parsed = run("Step 1: Read step 2 below.\nStep 2: Do it.");
        assert_eq!(numbers(&parsed), [1, 2]);
        assert_eq!(contents(&parsed), ["Read step 2 below.", "Do it."]);
    }

    #[test]
    fn no_markers() {
        assert_eq!(run("Just a friendly answer."), ParsedResponse::empty());
        assert_eq!(run(""), ParsedResponse::empty());
        assert_eq!(run("Stepping stones 3 ways"), ParsedResponse::empty());
    }

    #[test]
    fn marker_without_content_is_skipped() {
        assert_eq!(run("Step 1:"), ParsedResponse::empty());
    }

    #[test]
    fn separator_gives_back_last_character() {
        let parsed = run("Step 1: ");
        assert!(parsed.has_steps);
        assert_eq!(contents(&parsed), [""]);
    }

    #[test]
    fn trailing_marker_without_separator_becomes_conclusion() {
        let parsed = run("Step 1: a\nStep 2");
        assert_eq!(contents(&parsed), ["a"]);
        assert_eq!(parsed.conclusion.as_deref(), Some("Step 2"));
    }

    #[test]
    fn residual_marker_is_stripped() {
        let parsed = run("Step 1:\nStep 2: x");
        assert_eq!(numbers(&parsed), [1]);
        assert_eq!(contents(&parsed), ["x"]);
    }

    #[test]
    fn oversized_number_defaults_to_one() {
        let parsed = run("Step 99999999999: big");
        assert_eq!(numbers(&parsed), [1]);
    }

    #[test]
    fn link_step_is_classified() {
        let parsed = run("Step 4: URL: https://example.com/apply Apply today for great rewards.");
        let link = parsed.steps[0].link().unwrap();
        assert_eq!(link.url, "https://example.com/apply");
        assert_eq!(link.text, "Apply today for great rewards.");
    }

    #[test]
    fn failed_detail_stays_plain() {
        let parsed = run("Step 3: Nothing structured here.");
        assert!(parsed.steps[0].is_plain());
        assert_eq!(parsed.steps[0].content, "Nothing structured here.");
    }

    #[test]
    fn multibyte_text_around_markers() {
        let parsed = run("Voilà — ✈️\nStep 1: café\nStep 2: naïve ✓");
        assert_eq!(parsed.intro.as_deref(), Some("Voilà — ✈️"));
        assert_eq!(contents(&parsed), ["café", "naïve ✓"]);
    }

    #[test]
    fn parse_is_idempotent() {
        let reply = "Intro\nStep 1: one\nStep 5: Response: x\nthanks";
        assert_eq!(run(reply), run(reply));
    }
}
