use thiserror::Error;

/// Internal failure while matching a reply. Never escapes [`crate::parse`];
/// the parser turns it into an empty response.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("step pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Failure while turning a parsed reply into a document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Typst compilation failed: {0}")]
    Compile(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
