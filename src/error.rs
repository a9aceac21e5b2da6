/// Errors that can occur when rendering a document tree to AsciiDoc.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MarkdownToAsciiDocError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}
