// markdown-to-asciidoc — Markdown document tree to AsciiDoc converter.
//
// Architecture:
//   Markdown source → preprocess (front matter, TOC directives)
//   Markdown tree (`tree::Node`) → render (per-node rules) → Writer (line
//   assembly, attribute header) → AsciiDoc string
//
// Parsing Markdown into the tree is a separate concern; callers bring their
// own parser and build `tree::Node` values.

use std::collections::BTreeMap;

mod error;
pub mod preprocess;
mod render;
pub mod tree;
mod writer;

pub use error::MarkdownToAsciiDocError;
pub use tree::Node;

/// How composed paragraph text is re-wrapped in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    /// Keep the source line breaks.
    #[default]
    Preserve,
    /// Unwrap each paragraph onto a single line.
    None,
    /// One sentence per line, split at full stops.
    Ventilate,
}

/// Rendering options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Generate ids for section titles that have none.
    pub auto_ids: bool,
    /// Prefix for generated ids (the AsciiDoc `idprefix`).
    pub auto_id_prefix: Option<String>,
    /// Separator for generated ids (the AsciiDoc `idseparator`). Default: `-`.
    pub auto_id_separator: char,
    /// Drop explicit ids that match what AsciiDoc would generate anyway.
    pub lazy_ids: bool,
    /// Offset applied to every heading level. Default: `0`.
    pub heading_offset: i32,
    /// Paragraph re-wrapping mode.
    pub wrap: Wrap,
    /// Base directory stripped from image targets (the AsciiDoc `imagesdir`).
    pub imagesdir: Option<String>,
    /// Leave bare URLs for AsciiDoc to autolink instead of escaping them.
    /// Default: `true`.
    pub auto_links: bool,
    /// Convert well-known HTML elements to native AsciiDoc instead of
    /// passing them through. Default: `true`.
    pub html_to_native: bool,
    /// Attributes seeded into the document header. Rendering may add more
    /// (for example `experimental` when a menu reference is emitted).
    pub attributes: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            auto_ids: false,
            auto_id_prefix: None,
            auto_id_separator: '-',
            lazy_ids: false,
            heading_offset: 0,
            wrap: Wrap::default(),
            imagesdir: None,
            auto_links: true,
            html_to_native: true,
            attributes: BTreeMap::new(),
        }
    }
}

impl Options {
    /// Create a new Options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to generate ids for section titles.
    pub fn with_auto_ids(mut self, auto_ids: bool) -> Self {
        self.auto_ids = auto_ids;
        self
    }

    /// Set the prefix for generated ids.
    pub fn with_auto_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.auto_id_prefix = Some(prefix.into());
        self
    }

    /// Set the separator for generated ids.
    pub fn with_auto_id_separator(mut self, separator: char) -> Self {
        self.auto_id_separator = separator;
        self
    }

    /// Set whether explicit ids matching the generated id are dropped.
    pub fn with_lazy_ids(mut self, lazy_ids: bool) -> Self {
        self.lazy_ids = lazy_ids;
        self
    }

    /// Set the offset applied to every heading level.
    pub fn with_heading_offset(mut self, offset: i32) -> Self {
        self.heading_offset = offset;
        self
    }

    /// Set the paragraph re-wrapping mode.
    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Set the base directory stripped from image targets.
    pub fn with_imagesdir(mut self, imagesdir: impl Into<String>) -> Self {
        self.imagesdir = Some(imagesdir.into());
        self
    }

    /// Set whether bare URLs are left for AsciiDoc to autolink.
    pub fn with_auto_links(mut self, auto_links: bool) -> Self {
        self.auto_links = auto_links;
        self
    }

    /// Set whether well-known HTML elements convert to native AsciiDoc.
    pub fn with_html_to_native(mut self, html_to_native: bool) -> Self {
        self.html_to_native = html_to_native;
        self
    }

    /// Seed an attribute into the document header.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    fn validate(&self) -> Result<(), MarkdownToAsciiDocError> {
        if !(-5..=5).contains(&self.heading_offset) {
            return Err(MarkdownToAsciiDocError::InvalidOptions(format!(
                "heading offset must be between -5 and 5, got {}",
                self.heading_offset
            )));
        }
        if self.imagesdir.as_deref().is_some_and(|dir| dir.ends_with('/')) {
            return Err(MarkdownToAsciiDocError::InvalidOptions(
                "imagesdir must not end with a slash".to_string(),
            ));
        }
        if self.auto_id_separator.is_alphanumeric() {
            return Err(MarkdownToAsciiDocError::InvalidOptions(format!(
                "id separator must not be alphanumeric, got {:?}",
                self.auto_id_separator
            )));
        }
        Ok(())
    }
}

/// Render a document tree to AsciiDoc using default options.
///
/// The output ends with a single newline unless it is empty.
///
/// # Examples
///
/// ```
/// use markdown2asciidoc::tree::Node;
///
/// let doc = Node::root(vec![
///     Node::heading(1, vec![Node::text("Document Title")]),
///     Node::paragraph(vec![Node::text("Body content.")]),
/// ]);
/// assert_eq!(markdown2asciidoc::render(&doc), "= Document Title\n\nBody content.\n");
/// ```
pub fn render(root: &tree::Node) -> String {
    let options = Options::default();
    let mut renderer = render::Renderer::new(&options);
    renderer.render_document(root)
}

/// Render a document tree to AsciiDoc with custom options.
///
/// # Examples
///
/// ```
/// use markdown2asciidoc::{render_with, Options, tree::Node};
///
/// let doc = Node::root(vec![Node::heading(2, vec![Node::text("Get Started")])]);
/// let options = Options::new().with_auto_ids(true);
/// let adoc = render_with(&doc, &options).unwrap();
/// assert!(adoc.contains("[#get-started]"));
/// ```
pub fn render_with(
    root: &tree::Node,
    options: &Options,
) -> Result<String, MarkdownToAsciiDocError> {
    options.validate()?;
    let mut renderer = render::Renderer::new(options);
    Ok(renderer.render_document(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty() {
        let result = render(&Node::root(vec![]));
        assert_eq!(result, "");
    }

    #[test]
    fn test_render_simple_document() {
        let doc = Node::root(vec![
            Node::heading(1, vec![Node::text("Document Title")]),
            Node::paragraph(vec![Node::text("Body content.")]),
        ]);
        assert_eq!(render(&doc), "= Document Title\n\nBody content.\n");
    }

    #[test]
    fn test_options_builder() {
        let options = Options::new()
            .with_auto_ids(true)
            .with_auto_id_separator('_')
            .with_heading_offset(1)
            .with_wrap(Wrap::Ventilate);

        assert!(options.auto_ids);
        assert_eq!(options.auto_id_separator, '_');
        assert_eq!(options.heading_offset, 1);
        assert_eq!(options.wrap, Wrap::Ventilate);
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert!(!options.auto_ids);
        assert_eq!(options.auto_id_separator, '-');
        assert_eq!(options.heading_offset, 0);
        assert_eq!(options.wrap, Wrap::Preserve);
        assert!(options.auto_links);
        assert!(options.html_to_native);
    }

    #[test]
    fn test_render_with_rejects_out_of_range_offset() {
        let doc = Node::root(vec![]);
        let options = Options::new().with_heading_offset(9);
        let err = render_with(&doc, &options).unwrap_err();
        assert!(matches!(err, MarkdownToAsciiDocError::InvalidOptions(_)));
    }

    #[test]
    fn test_render_with_rejects_trailing_slash_imagesdir() {
        let doc = Node::root(vec![]);
        let options = Options::new().with_imagesdir("images/");
        assert!(render_with(&doc, &options).is_err());
    }

    #[test]
    fn test_render_with_rejects_alphanumeric_id_separator() {
        let doc = Node::root(vec![]);
        let options = Options::new().with_auto_ids(true).with_auto_id_separator('x');
        assert!(render_with(&doc, &options).is_err());
    }
}
