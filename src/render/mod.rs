// Document tree → AsciiDoc serializer.
//
// Walks the tree depth-first and emits AsciiDoc lines through the Writer.
// All formatting decisions (escaping, delimiters, spacing, heading ids)
// live here. The render session owns the per-document state: the attribute
// map being discovered, the heading-level tracker, and the table of
// already-seen auto-generated ids.

pub(crate) mod escape;
pub(crate) mod handlers;

use std::collections::{BTreeMap, HashMap};

use crate::tree::Node;
use crate::writer::Writer;
use crate::{Options, Wrap};

use escape::FULL_STOP;

/// Traversal context passed down the recursion. Extended, never mutated in
/// place, so sibling subtrees observe each other only through the Writer.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Ctx<'a> {
    /// The node whose children are being traversed.
    pub parent: Option<&'a Node>,
    pub prev: Option<&'a Node>,
    pub next: Option<&'a Node>,
    /// One sibling past `next` (heading → block-title promotion looks ahead
    /// two siblings for a code block).
    pub next2: Option<&'a Node>,
    /// Blockquote nesting depth (0 = not inside a blockquote).
    pub blockquote_depth: usize,
    /// Whether the enclosing list item carries block-level continuation
    /// content, making nested lists start with a blank separator.
    pub in_compound_item: bool,
}

/// One render call's worth of state.
pub(crate) struct Renderer<'o> {
    options: &'o Options,
    /// Caller-supplied attributes plus everything discovered while
    /// rendering; flushed into the header once the body is complete.
    attributes: BTreeMap<String, String>,
    imagesdir: Option<String>,
    current_heading_level: Option<i32>,
    /// Occurrence counts for auto-generated heading ids.
    id_occurrences: HashMap<String, usize>,
}

impl<'o> Renderer<'o> {
    pub(crate) fn new(options: &'o Options) -> Self {
        let mut attributes = options.attributes.clone();
        let imagesdir = options.imagesdir.clone().or_else(|| attributes.get("imagesdir").cloned());
        if options.auto_ids {
            // Publish the id scheme so downstream AsciiDoc processing
            // generates matching ids; the defaults for both are `_`.
            let prefix = options.auto_id_prefix.clone().unwrap_or_default();
            if prefix != "_" {
                attributes.entry("idprefix".to_string()).or_insert(prefix);
            }
            if options.auto_id_separator != '_' {
                attributes
                    .entry("idseparator".to_string())
                    .or_insert_with(|| options.auto_id_separator.to_string());
            }
        }
        Renderer {
            options,
            attributes,
            imagesdir,
            current_heading_level: None,
            id_occurrences: HashMap::new(),
        }
    }

    /// Render a whole document rooted at `root`.
    pub(crate) fn render_document(&mut self, root: &Node) -> String {
        #[cfg(feature = "tracing")]
        tracing::trace!("rendering document tree");

        let mut w = Writer::new();
        let children: &[Node] = match root {
            Node::Root(r) => &r.children,
            other => std::slice::from_ref(other),
        };

        // A run of comments (and blanks) before all other content becomes
        // the document prologue, emitted above the doctitle.
        let mut rest = children;
        if matches!(children.first(), Some(Node::Comment(_))) {
            let len = children
                .iter()
                .position(|n| !matches!(n, Node::Comment(_) | Node::Blank(_)))
                .unwrap_or(children.len());
            let (prologue_nodes, remainder) = children.split_at(len);
            let mut pw = Writer::new();
            self.traverse(&refs(prologue_nodes), Ctx { parent: Some(root), ..Ctx::default() }, &mut pw);
            w.add_prologue_lines(pw.take_body());
            rest = remainder;
        }

        self.traverse(&refs(rest), Ctx { parent: Some(root), ..Ctx::default() }, &mut w);

        // A title attribute (typically from front matter) is the fallback
        // doctitle, and never appears as an ordinary attribute.
        if let Some(title) = self.attributes.remove("title") {
            if w.doctitle().is_none() {
                w.set_doctitle(title);
            }
        }
        if !self.attributes.is_empty() {
            w.add_attributes(std::mem::take(&mut self.attributes));
        }

        let mut output = w.finish();
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output
    }

    /// Visit `nodes` in order, supplying each child's siblings as context.
    pub(crate) fn traverse<'a>(&mut self, nodes: &[&'a Node], scope: Ctx<'a>, w: &mut Writer) {
        for (i, node) in nodes.iter().enumerate() {
            let ctx = Ctx {
                prev: if i > 0 { Some(nodes[i - 1]) } else { None },
                next: nodes.get(i + 1).copied(),
                next2: nodes.get(i + 2).copied(),
                ..scope
            };
            self.convert(node, ctx, w);
        }
    }

    /// Compose nodes into an isolated text fragment using a scoped Writer
    /// that never escapes this call.
    pub(crate) fn compose(&mut self, nodes: &[&Node], scope: Ctx<'_>, strip: bool, wrap: Wrap) -> String {
        let mut sw = Writer::new();
        self.traverse(nodes, scope, &mut sw);
        let text = sw.body().join("\n");
        let text = if strip { text.trim() } else { &text };
        reflow(text, wrap)
    }

    /// `compose`, split into lines. Empty text yields no lines.
    pub(crate) fn compose_split(
        &mut self,
        nodes: &[&Node],
        scope: Ctx<'_>,
        strip: bool,
        wrap: Wrap,
    ) -> Vec<String> {
        let text = self.compose(nodes, scope, strip, wrap);
        if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        }
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub(crate) fn options(&self) -> &Options {
        self.options
    }

    pub(crate) fn imagesdir(&self) -> Option<&str> {
        self.imagesdir.as_deref()
    }

    /// Generate a unique id for a heading. Returns `None` when the heading's
    /// text reduces to nothing. The second and later occurrences of the same
    /// slug get a `-<n>` suffix starting at 2.
    pub(crate) fn generate_unique_id(&mut self, text: &str) -> Option<String> {
        let sep = self.options.auto_id_separator;
        let lowered = text.to_lowercase();
        let mut base = String::new();
        let mut pending_sep = false;
        for c in lowered.chars() {
            if c.is_alphanumeric() || c == '_' {
                if pending_sep && !base.is_empty() {
                    base.push(sep);
                }
                pending_sep = false;
                base.push(c);
            } else if c == ' ' || c == '.' || c == '-' {
                pending_sep = true;
            }
            // Anything else is dropped without producing a separator.
        }
        if base.is_empty() {
            return None;
        }
        let mut id = match &self.options.auto_id_prefix {
            Some(prefix) => format!("{prefix}{base}"),
            None => base,
        };
        let count = {
            let n = self.id_occurrences.entry(id.clone()).or_insert(0);
            *n += 1;
            *n
        };
        if count > 1 {
            id = format!("{id}-{count}");
        }
        Some(id)
    }
}

/// Reflow composed inline text per the active wrap mode.
pub(crate) fn reflow(text: &str, wrap: Wrap) -> String {
    match wrap {
        Wrap::Preserve => text.to_string(),
        Wrap::None => unwrap_lines(text, false),
        Wrap::Ventilate => unwrap_lines(text, true),
    }
}

/// Join soft-wrapped lines back together (comment lines stay on their own
/// line); in ventilate mode, re-split at sentence boundaries afterwards.
fn unwrap_lines(text: &str, ventilate: bool) -> String {
    let mut result: Vec<String> = Vec::new();
    let mut start_new_line = true;
    for line in text.split('\n') {
        if line.starts_with("//") {
            result.push(line.to_string());
            start_new_line = true;
        } else if start_new_line {
            result.push(line.to_string());
            start_new_line = false;
        } else {
            let prev = result.pop().unwrap_or_default();
            result.push(format!("{prev} {line}"));
        }
    }
    if ventilate {
        result
            .iter()
            .map(|line| {
                if line.starts_with("//") || !line.contains(['.', '?', '!']) {
                    line.clone()
                } else {
                    FULL_STOP.replace_all(line, "${1}\n").into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        result.join("\n")
    }
}

/// Borrow a slice of owned nodes as a reference vector for traversal.
pub(crate) fn refs(nodes: &[Node]) -> Vec<&Node> {
    nodes.iter().collect()
}

/// Concatenate the plain text of a subtree (for id slugs).
pub(crate) fn plain_text(nodes: &[&Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(&t.value),
            Node::CodeSpan(c) => out.push_str(&c.value),
            Node::Entity(e) => out.push_str(&escape::resolve_entity(e.code_point, &e.original)),
            _ => {
                if let Some(children) = node.children() {
                    plain_text(&refs(children), out);
                }
            }
        }
    }
}

/// First non-blank trailing child being block-level marks an item compound:
/// its continuation lines need a `+` attachment.
pub(crate) fn trailing_block_content(nodes: &[Node]) -> bool {
    for node in nodes {
        match node {
            Node::Blank(_) => continue,
            Node::Paragraph(_) | Node::Blockquote(_) | Node::CodeBlock(_) | Node::Table(_) => {
                return true
            }
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reflow_preserve_keeps_lines() {
        assert_eq!(reflow("one\ntwo", Wrap::Preserve), "one\ntwo");
    }

    #[test]
    fn test_reflow_none_joins_lines() {
        assert_eq!(reflow("one\ntwo", Wrap::None), "one two");
    }

    #[test]
    fn test_reflow_keeps_comment_lines_separate() {
        assert_eq!(reflow("one\n// note\ntwo\nthree", Wrap::None), "one\n// note\ntwo three");
    }

    #[test]
    fn test_reflow_ventilate_splits_sentences() {
        assert_eq!(
            reflow("First one. Second\nlonger one? Third!", Wrap::Ventilate),
            "First one.\nSecond longer one?\nThird!"
        );
    }

    #[test]
    fn test_generate_unique_id_slugging() {
        let options = Options::default().with_auto_ids(true);
        let mut r = Renderer::new(&options);
        assert_eq!(r.generate_unique_id("Get Started. Now"), Some("get-started-now".into()));
        assert_eq!(r.generate_unique_id("Q&A"), Some("qa".into()));
        assert_eq!(r.generate_unique_id("!!!"), None);
    }

    #[test]
    fn test_generate_unique_id_collisions() {
        let options = Options::default().with_auto_ids(true);
        let mut r = Renderer::new(&options);
        assert_eq!(r.generate_unique_id("Overview"), Some("overview".into()));
        assert_eq!(r.generate_unique_id("Overview"), Some("overview-2".into()));
        assert_eq!(r.generate_unique_id("Overview"), Some("overview-3".into()));
    }

    #[test]
    fn test_generate_unique_id_prefix_and_separator() {
        let options = Options::default()
            .with_auto_ids(true)
            .with_auto_id_prefix("ref_")
            .with_auto_id_separator('_');
        let mut r = Renderer::new(&options);
        assert_eq!(r.generate_unique_id("Get Started"), Some("ref_get_started".into()));
    }

    #[test]
    fn test_trailing_block_content_skips_blanks() {
        let nodes = vec![Node::Blank(crate::tree::Blank), Node::paragraph(vec![Node::text("x")])];
        assert!(trailing_block_content(&nodes));
        let nodes = vec![Node::text("inline first")];
        assert!(!trailing_block_content(&nodes));
    }
}
