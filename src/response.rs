use serde::Serialize;

/// A reply split into intro, numbered steps and conclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub steps: Vec<ParsedStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    pub has_steps: bool,
}

impl ParsedResponse {
    /// The result for replies without any step marker.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedStep {
    /// The numeral written in the marker, not the position in `steps`.
    pub number: u32,
    pub content: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl ParsedStep {
    pub fn detail(&self) -> Option<&DetailData> {
        match &self.kind {
            StepKind::Detail { detail } => Some(detail),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<&LinkData> {
        match &self.kind {
            StepKind::Link { link } => Some(link),
            _ => None,
        }
    }

    pub fn comparison(&self) -> Option<&ComparisonData> {
        match &self.kind {
            StepKind::Comparison { comparison } => Some(comparison),
            _ => None,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self.kind, StepKind::Plain)
    }
}

/// Which specialized parser accepted a step's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepKind {
    Plain,
    Detail { detail: DetailData },
    Link { link: LinkData },
    Comparison { comparison: ComparisonData },
}

/// Step 3: a titled explanation with a list of facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailData {
    pub title: String,
    pub description: String,
    pub facts: Vec<Fact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub headline: String,
    pub text: String,
}

/// Step 4: a call to action pointing at a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkData {
    pub url: String,
    pub text: String,
}

/// Step 5: an intro sentence and the compared cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonData {
    pub intro: String,
    pub items: Vec<ComparisonItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonItem {
    pub name: String,
    pub url: String,
    pub description: String,
    pub short_highlights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_highlights: Option<Vec<String>>,
}
