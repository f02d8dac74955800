use crate::config::Config;
use crate::markup::{Span, parse_inline, spans_text};
use crate::response::{ComparisonData, DetailData, LinkData, ParsedResponse, StepKind};

/// Convert a parsed reply to Typst markup. `raw` is shown verbatim when the
/// reply had no steps.
pub fn response_to_typst(response: &ParsedResponse, raw: &str, config: &Config) -> String {
    let mut out = String::new();
    emit_preamble(config, &mut out);

    if !response.has_steps || response.steps.is_empty() {
        emit_raw(raw, &mut out);
        return out;
    }

    if let Some(intro) = &response.intro {
        emit_paragraph(intro, &mut out);
    }

    for step in &response.steps {
        match &step.kind {
            StepKind::Plain => emit_paragraph(&step.content, &mut out),
            StepKind::Detail { detail } => emit_detail(detail, &mut out),
            StepKind::Link { link } => emit_link(link, config, &mut out),
            StepKind::Comparison { comparison } => emit_comparison(comparison, config, &mut out),
        }
    }

    if let Some(conclusion) = &response.conclusion {
        emit_paragraph(conclusion, &mut out);
    }

    out
}

fn emit_preamble(config: &Config, out: &mut String) {
    // Set up paragraph settings to prevent widows/orphans
    out.push_str("#set par(linebreaks: \"optimized\")\n");
    if config.page.numbers {
        out.push_str("#set page(numbering: \"1\")\n");
    }
    out.push_str("#show link: set text(fill: rgb(");
    push_string_literal(&config.links.color, out);
    out.push_str("))\n");
    if config.links.underline {
        out.push_str("#show link: underline\n");
    }
    out.push('\n');
}

fn emit_raw(raw: &str, out: &mut String) {
    for paragraph in raw.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let mut lines = paragraph.lines().map(str::trim).peekable();
        while let Some(line) = lines.next() {
            escape_text(line, out);
            if lines.peek().is_some() {
                out.push_str(" \\\n");
            }
        }
        out.push_str("\n\n");
    }
}

fn emit_paragraph(text: &str, out: &mut String) {
    let spans = parse_inline(text);
    if spans.is_empty() {
        return;
    }
    spans_to_typst(&spans, out);
    out.push_str("\n\n");
}

fn emit_detail(detail: &DetailData, out: &mut String) {
    // Keep the title with its description
    out.push_str("#block(breakable: false)[\n== ");
    escape_flattened(&detail.title, out);
    out.push_str("\n\n");
    spans_to_typst(&parse_inline(&detail.description), out);
    out.push_str("\n]\n\n");

    out.push_str("#block(breakable: false)[\n=== Key Things to Know\n\n");
    for fact in &detail.facts {
        out.push_str("- *");
        escape_flattened(&fact.headline, out);
        out.push_str("*: ");
        spans_to_typst(&parse_inline(&fact.text), out);
        out.push('\n');
    }
    out.push_str("]\n\n");
}

fn emit_link(link: &LinkData, config: &Config, out: &mut String) {
    emit_paragraph(&link.text, out);
    emit_apply_link(&link.url, config, out);
    out.push_str("\n\n");
}

fn emit_comparison(comparison: &ComparisonData, config: &Config, out: &mut String) {
    emit_paragraph(&comparison.intro, out);

    let columns = comparison.items.len().max(1);
    out.push_str("#grid(\n");
    out.push_str(&format!(
        "  columns: ({}),\n",
        vec!["1fr"; columns].join(", ")
    ));
    out.push_str("  gutter: 12pt,\n");

    for item in &comparison.items {
        out.push_str("  block(stroke: 0.5pt + luma(200), inset: 10pt, radius: 6pt)[\n");
        out.push_str("    *");
        escape_flattened(&item.name, out);
        out.push_str("*\n\n    ");
        escape_text(&item.description, out);
        out.push_str("\n\n");
        for highlight in &item.short_highlights {
            out.push_str("    - ");
            escape_text(highlight, out);
            out.push('\n');
        }
        out.push_str("\n    ");
        emit_apply_link(&item.url, config, out);
        out.push_str("\n  ],\n");
    }

    out.push_str(")\n\n");
}

fn emit_apply_link(url: &str, config: &Config, out: &mut String) {
    out.push_str("#link(");
    push_string_literal(url, out);
    out.push_str(")[");
    escape_text(&config.links.apply_label, out);
    out.push(']');
}

fn spans_to_typst(spans: &[Span], out: &mut String) {
    for span in spans {
        span_to_typst(span, out);
    }
}

fn span_to_typst(span: &Span, out: &mut String) {
    match span {
        Span::Text(text) => escape_text(text, out),
        Span::Bold(inner) => {
            out.push('*');
            spans_to_typst(inner, out);
            out.push('*');
        }
        Span::Italic(inner) => {
            out.push('_');
            spans_to_typst(inner, out);
            out.push('_');
        }
        Span::Code(text) => {
            // Raw blocks can't escape backticks, a string literal can
            out.push_str("#raw(");
            push_string_literal(text, out);
            out.push(')');
        }
        Span::Link { url, content } => {
            out.push_str("#link(");
            push_string_literal(url, out);
            out.push_str(")[");
            spans_to_typst(content, out);
            out.push(']');
        }
        Span::LineBreak => {
            out.push_str(" \\\n");
        }
    }
}

/// Escape text that sits inside strong emphasis or a heading, where inline
/// Markdown would nest badly, as plain text.
fn escape_flattened(text: &str, out: &mut String) {
    escape_text(&spans_text(&parse_inline(text)), out);
}

/// Escape special Typst characters in markup text.
fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '=' | '-' | '+'
            | '/' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push(' '),
            _ => out.push(ch),
        }
    }
}

fn push_string_literal(value: &str, out: &mut String) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}
