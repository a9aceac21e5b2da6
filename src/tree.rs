// Document tree node types for parsed lightweight markup.
//
// ~25 node kinds covering GFM-flavored Markdown after parsing.
// Each kind is a variant of the `Node` enum. Parent nodes own their children.
// Leaf nodes hold a `value: String`. The kind set is closed: the renderer
// matches exhaustively, so adding a variant forces a rendering rule.

/// Alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// No explicit alignment; the column takes the AsciiDoc default.
    #[default]
    Default,
    Left,
    Center,
    Right,
}

impl Alignment {
    /// The AsciiDoc colspec mark for this alignment (empty for default).
    pub(crate) fn mark(self) -> &'static str {
        match self {
            Alignment::Default => "",
            Alignment::Left => "<",
            Alignment::Center => "^",
            Alignment::Right => ">",
        }
    }
}

/// A smart (typographic) quote character, identified by entity name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartQuoteKind {
    /// `“`
    Ldquo,
    /// `”`
    Rdquo,
    /// `‘`
    Lsquo,
    /// `’`
    Rsquo,
}

/// A typographic symbol, identified by entity name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypographicSymbolKind {
    Mdash,
    Ndash,
    Hellip,
    Laquo,
    Raquo,
    LaquoSpace,
    RaquoSpace,
}

// ---------------------------------------------------------------------------
// Node structs
// ---------------------------------------------------------------------------

/// Document root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Root {
    pub children: Vec<Node>,
}

/// Section heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8, // 1–6 before any configured offset
    pub children: Vec<Node>,
    /// Explicit id (from a `{#id}` attribute list, or from HTML).
    pub id: Option<String>,
    /// CSS class; becomes an AsciiDoc role.
    pub role: Option<String>,
}

/// Paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub children: Vec<Node>,
}

/// Block quote.
#[derive(Debug, Clone, PartialEq)]
pub struct Blockquote {
    pub children: Vec<Node>,
}

/// Fenced or indented code block.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub value: String,
    /// Source language from the fence info string, if any.
    pub lang: Option<String>,
    /// Whether the block was fenced (as opposed to indented).
    pub fenced: bool,
}

/// Image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image {
    pub src: String,
    pub alt: Option<String>,
    pub id: Option<String>,
    /// CSS class; becomes an AsciiDoc role.
    pub role: Option<String>,
    /// Explicit width attribute.
    pub width: Option<String>,
    /// Raw CSS `style` declaration list (may carry a `width:` property).
    pub style: Option<String>,
}

/// Unordered (bulleted) list.
#[derive(Debug, Clone, PartialEq)]
pub struct UnorderedList {
    pub children: Vec<Node>,
}

/// Ordered (numbered) list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedList {
    pub children: Vec<Node>,
}

/// Definition list.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionList {
    pub children: Vec<Node>,
}

/// Item inside an ordered or unordered list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub children: Vec<Node>,
}

/// Term inside a definition list.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionTerm {
    pub children: Vec<Node>,
}

/// Description inside a definition list.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionDescription {
    pub children: Vec<Node>,
}

/// Table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// One entry per column.
    pub alignments: Vec<Alignment>,
    /// Row groups.
    pub children: Vec<Node>,
}

/// Head or body row group inside a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowGroup {
    pub head: bool,
    pub children: Vec<Node>,
}

/// Row inside a table row group.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub children: Vec<Node>,
}

/// Cell inside a table row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub children: Vec<Node>,
}

/// Horizontal rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorizontalRule;

/// Hyperlink.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub href: String,
    pub children: Vec<Node>,
}

/// Emphasis.
#[derive(Debug, Clone, PartialEq)]
pub struct Emphasis {
    pub children: Vec<Node>,
}

/// Strong emphasis.
#[derive(Debug, Clone, PartialEq)]
pub struct Strong {
    pub children: Vec<Node>,
}

/// Inline code span.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSpan {
    pub value: String,
}

/// Hard line break.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HardBreak {
    /// Whether the break came from a literal `<br>` tag rather than
    /// trailing-space/backslash syntax.
    pub from_html: bool,
}

/// Character entity reference (`&amp;`, `&copy;`, …).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub code_point: u32,
    /// The original source text, used when the entity has no resolution rule.
    pub original: String,
}

/// Smart quote produced by typographic processing.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartQuote {
    pub kind: SmartQuoteKind,
}

/// Typographic symbol produced by typographic processing.
#[derive(Debug, Clone, PartialEq)]
pub struct TypographicSymbol {
    pub kind: TypographicSymbolKind,
}

/// Raw HTML element carried through by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Whether the element is block-level (flow) rather than inline (span).
    pub block: bool,
}

/// XML/HTML comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Full source text including the `<!--`/`-->` delimiters.
    pub value: String,
    pub block: bool,
}

/// Math (LaTeX) content.
#[derive(Debug, Clone, PartialEq)]
pub struct Math {
    pub value: String,
    pub block: bool,
}

/// Plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
}

/// Blank separator produced by the parser between sibling blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blank;

// ---------------------------------------------------------------------------
// Node enum
// ---------------------------------------------------------------------------

/// A node in the parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // Document
    Root(Root),

    // Block content
    Heading(Heading),
    Paragraph(Paragraph),
    Blockquote(Blockquote),
    CodeBlock(CodeBlock),
    UnorderedList(UnorderedList),
    OrderedList(OrderedList),
    DefinitionList(DefinitionList),
    ListItem(ListItem),
    DefinitionTerm(DefinitionTerm),
    DefinitionDescription(DefinitionDescription),
    Table(Table),
    TableRowGroup(TableRowGroup),
    TableRow(TableRow),
    TableCell(TableCell),
    HorizontalRule(HorizontalRule),
    Blank(Blank),

    // Inline content
    Link(Link),
    Emphasis(Emphasis),
    Strong(Strong),
    CodeSpan(CodeSpan),
    HardBreak(HardBreak),
    Entity(Entity),
    SmartQuote(SmartQuote),
    TypographicSymbol(TypographicSymbol),
    Text(Text),

    // Either category, flagged on the node
    Image(Image),
    HtmlElement(HtmlElement),
    Comment(Comment),
    Math(Math),
}

impl Node {
    /// Returns a reference to this node's children, if it has any.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Root(n) => Some(&n.children),
            Node::Heading(n) => Some(&n.children),
            Node::Paragraph(n) => Some(&n.children),
            Node::Blockquote(n) => Some(&n.children),
            Node::UnorderedList(n) => Some(&n.children),
            Node::OrderedList(n) => Some(&n.children),
            Node::DefinitionList(n) => Some(&n.children),
            Node::ListItem(n) => Some(&n.children),
            Node::DefinitionTerm(n) => Some(&n.children),
            Node::DefinitionDescription(n) => Some(&n.children),
            Node::Table(n) => Some(&n.children),
            Node::TableRowGroup(n) => Some(&n.children),
            Node::TableRow(n) => Some(&n.children),
            Node::TableCell(n) => Some(&n.children),
            Node::Link(n) => Some(&n.children),
            Node::Emphasis(n) => Some(&n.children),
            Node::Strong(n) => Some(&n.children),
            Node::HtmlElement(n) => Some(&n.children),
            _ => None,
        }
    }

    /// Whether this node is block-level (flow) content.
    ///
    /// `Image`, `HtmlElement`, `Comment`, and `Math` carry their category on
    /// the node because the parser decides it from surrounding context.
    pub fn is_block(&self) -> bool {
        match self {
            Node::Root(_)
            | Node::Heading(_)
            | Node::Paragraph(_)
            | Node::Blockquote(_)
            | Node::CodeBlock(_)
            | Node::UnorderedList(_)
            | Node::OrderedList(_)
            | Node::DefinitionList(_)
            | Node::ListItem(_)
            | Node::DefinitionTerm(_)
            | Node::DefinitionDescription(_)
            | Node::Table(_)
            | Node::TableRowGroup(_)
            | Node::TableRow(_)
            | Node::TableCell(_)
            | Node::HorizontalRule(_)
            | Node::Blank(_) => true,
            Node::HtmlElement(n) => n.block,
            Node::Comment(n) => n.block,
            Node::Math(n) => n.block,
            _ => false,
        }
    }

    // Convenience constructors, used heavily by tests and tree-building
    // callers.

    /// A plain text node.
    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(Text { value: value.into() })
    }

    /// A paragraph wrapping the given children.
    pub fn paragraph(children: Vec<Node>) -> Node {
        Node::Paragraph(Paragraph { children })
    }

    /// A heading with no explicit id or role.
    pub fn heading(level: u8, children: Vec<Node>) -> Node {
        Node::Heading(Heading { level, children, id: None, role: None })
    }

    /// A document root wrapping the given children.
    pub fn root(children: Vec<Node>) -> Node {
        Node::Root(Root { children })
    }

    /// A list item whose sole content is a paragraph of text.
    pub fn list_item_text(value: impl Into<String>) -> Node {
        Node::ListItem(ListItem { children: vec![Node::paragraph(vec![Node::text(value)])] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_inline() {
        let node = Node::text("hello");
        assert!(!node.is_block());
        assert!(node.children().is_none());
    }

    #[test]
    fn test_paragraph_is_block() {
        let node = Node::paragraph(vec![Node::text("hello")]);
        assert!(node.is_block());
        assert_eq!(node.children().unwrap().len(), 1);
    }

    #[test]
    fn test_category_follows_node_flag() {
        let span = Node::Comment(Comment { value: "<!-- x -->".into(), block: false });
        let block = Node::Comment(Comment { value: "<!-- x -->".into(), block: true });
        assert!(!span.is_block());
        assert!(block.is_block());
    }

    #[test]
    fn test_alignment_marks() {
        assert_eq!(Alignment::Center.mark(), "^");
        assert_eq!(Alignment::Right.mark(), ">");
        assert_eq!(Alignment::Default.mark(), "");
    }

    #[test]
    fn test_root_default() {
        assert!(Root::default().children.is_empty());
    }
}
