mod config;
mod error;
mod logging;
mod markup;
mod parser;
mod response;
mod sections;
mod suggestions;
mod typst;

pub use config::{Config, LinksConfig, LoggingConfig, PageConfig, ParserConfig, SuggestionConfig};
pub use error::{ParseError, RenderError};
pub use logging::init_logging;
pub use markup::{Span, parse_inline, spans_text};
pub use response::{
    ComparisonData, ComparisonItem, DetailData, Fact, LinkData, ParsedResponse, ParsedStep,
    StepKind,
};
pub use suggestions::{
    SuggestedQuestion, default_suggestions, icon_for_question, parse_suggestions, truncate_words,
};

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Parse an assistant reply into intro, steps and conclusion.
pub fn parse(reply: &str) -> ParsedResponse {
    parse_with_config(reply, &ParserConfig::default())
}

/// Parse a reply that may be missing altogether.
pub fn parse_optional(reply: Option<&str>) -> ParsedResponse {
    reply.map(parse).unwrap_or_else(ParsedResponse::empty)
}

/// Parse a reply with custom comparison limits.
pub fn parse_with_config(reply: &str, config: &ParserConfig) -> ParsedResponse {
    parser::parse(reply, config)
}

/// Convert a reply to Typst markup using default config.
pub fn reply_to_typst(reply: &str) -> String {
    reply_to_typst_with_config(reply, &Config::compiled_default())
}

/// Convert a reply to Typst markup with custom config.
pub fn reply_to_typst_with_config(reply: &str, config: &Config) -> String {
    let response = parse_with_config(reply, &config.parser);
    typst::response_to_typst(&response, reply, config)
}

/// Convert a reply to PDF bytes using default config.
pub fn reply_to_pdf(reply: &str) -> Result<Vec<u8>, RenderError> {
    reply_to_pdf_with_config(reply, &Config::compiled_default())
}

/// Convert a reply to PDF bytes with custom config.
pub fn reply_to_pdf_with_config(reply: &str, config: &Config) -> Result<Vec<u8>, RenderError> {
    use typst_library::layout::PagedDocument;

    let typst_content = reply_to_typst_with_config(reply, config);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| RenderError::Compile(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| RenderError::Pdf(format!("{:?}", e)))
}
