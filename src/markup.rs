use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    Code(String),
    Link { url: String, content: Vec<Span> },
    LineBreak,
}

/// Parse the inline Markdown of a step's text into spans.
///
/// Block structure is flattened: paragraphs, list items and headings are
/// separated by line breaks.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut state = InlineState::default();

    for event in Parser::new(text) {
        process_event(event, &mut state);
    }

    state.spans
}

#[derive(Default)]
struct InlineState {
    spans: Vec<Span>,
    // Enclosing span buffers for bold, italic and links
    span_stack: Vec<Vec<Span>>,
    link_stack: Vec<String>,
    // Set after a block ends; emitted before the next text
    pending_break: bool,
}

impl InlineState {
    fn push(&mut self, span: Span) {
        if self.pending_break {
            self.pending_break = false;
            if !self.spans.is_empty() || !self.span_stack.is_empty() {
                self.spans.push(Span::LineBreak);
            }
        }
        self.spans.push(span);
    }

    fn open(&mut self) {
        if self.pending_break && !self.spans.is_empty() {
            self.spans.push(Span::LineBreak);
        }
        self.pending_break = false;
        self.span_stack.push(std::mem::take(&mut self.spans));
    }

    fn close(&mut self, wrap: impl FnOnce(Vec<Span>) -> Span) {
        let inner = std::mem::take(&mut self.spans);
        if let Some(mut parent) = self.span_stack.pop() {
            parent.push(wrap(inner));
            self.spans = parent;
        } else {
            self.spans = inner;
        }
    }
}

fn process_event(event: Event, state: &mut InlineState) {
    match event {
        Event::Text(text) => state.push(Span::Text(text.into_string())),
        Event::Code(code) => state.push(Span::Code(code.into_string())),

        Event::Start(Tag::Strong) | Event::Start(Tag::Emphasis) => state.open(),
        Event::End(TagEnd::Strong) => state.close(Span::Bold),
        Event::End(TagEnd::Emphasis) => state.close(Span::Italic),

        Event::Start(Tag::Link { dest_url, .. }) => {
            state.link_stack.push(dest_url.into_string());
            state.open();
        }
        Event::End(TagEnd::Link) => {
            let url = state.link_stack.pop().unwrap_or_default();
            state.close(|content| Span::Link { url, content });
        }

        Event::End(TagEnd::Paragraph)
        | Event::End(TagEnd::Item)
        | Event::End(TagEnd::Heading(_))
        | Event::End(TagEnd::CodeBlock) => state.pending_break = true,

        Event::SoftBreak => state.push(Span::Text(" ".to_string())),
        Event::HardBreak => state.push(Span::LineBreak),

        // Ignore other events
        _ => {}
    }
}

/// Plain text of a span list, used where formatting can't be shown.
pub fn spans_text(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(t) | Span::Code(t) => out.push_str(t),
            Span::Bold(inner) | Span::Italic(inner) => out.push_str(&spans_text(inner)),
            Span::Link { content, .. } => out.push_str(&spans_text(content)),
            Span::LineBreak => out.push('\n'),
        }
    }
    out
}
