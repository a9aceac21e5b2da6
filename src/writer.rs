// Output assembler for AsciiDoc lines.
//
// A line buffer with explicit state for delimited-block nesting, list depth,
// and inter-block separators. The renderer drives it through named
// operations instead of inferring state from buffer contents. One instance
// is owned by each top-level render; short-lived instances are created to
// compose isolated inline fragments (heading titles, list-item labels).

use std::collections::BTreeMap;
use std::mem;

use regex::Regex;
use std::sync::LazyLock;

static TRAILING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m) +$").unwrap());

const NBSP: char = '\u{00a0}';

/// Which list-level counter an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListKind {
    List,
    Dlist,
}

#[derive(Debug, Default, Clone, Copy)]
struct ListLevels {
    list: usize,
    dlist: usize,
}

impl ListLevels {
    fn get(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::List => self.list,
            ListKind::Dlist => self.dlist,
        }
    }

    fn get_mut(&mut self, kind: ListKind) -> &mut usize {
        match kind {
            ListKind::List => &mut self.list,
            ListKind::Dlist => &mut self.dlist,
        }
    }
}

/// Saved state for one open delimited block.
#[derive(Debug)]
struct Frame {
    /// Lines emitted before the block opened, ending with the fence line.
    parent_body: Vec<String>,
    /// The fence, re-emitted verbatim at close.
    fence: String,
    separators: Vec<String>,
    levels: ListLevels,
}

/// The line-buffer state machine behind a render.
#[derive(Debug, Default)]
pub(crate) struct Writer {
    prologue: Vec<String>,
    doctitle: Option<String>,
    attributes: BTreeMap<String, String>,
    body: Vec<String>,
    nesting_stack: Vec<Frame>,
    /// Per-depth separator lines; the top entry is written by `start_block`.
    separators: Vec<String>,
    levels: ListLevels,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Writer { separators: vec![String::new()], ..Writer::default() }
    }

    /// Insert the current-depth separator before new output, unless the
    /// buffer at this depth is still empty.
    pub(crate) fn start_block(&mut self) {
        if !self.is_empty() {
            let sep = self.separators.last().cloned().unwrap_or_default();
            self.body.push(sep);
        }
    }

    /// Open a delimited block. A one-character delimiter is repeated to the
    /// minimum fence width of four.
    pub(crate) fn start_delimited_block(&mut self, delimiter: &str) {
        let fence = if delimiter.chars().count() == 1 { delimiter.repeat(4) } else { delimiter.to_string() };
        self.body.push(fence.clone());
        self.nesting_stack.push(Frame {
            parent_body: mem::take(&mut self.body),
            fence,
            separators: mem::replace(&mut self.separators, vec![String::new()]),
            levels: mem::take(&mut self.levels),
        });
    }

    /// Close the innermost delimited block, splicing its lines back into the
    /// enclosing buffer and re-emitting the fence.
    pub(crate) fn end_delimited_block(&mut self) {
        let frame = self
            .nesting_stack
            .pop()
            .unwrap_or_else(|| panic!("end_delimited_block without matching start_delimited_block"));
        let nested = mem::replace(&mut self.body, frame.parent_body);
        self.body.extend(nested);
        self.body.push(frame.fence);
        self.separators = frame.separators;
        self.levels = frame.levels;
    }

    /// Enter a list: push a `+` continuation marker and bump the level
    /// counter. A blank separator is inserted before the list begins unless
    /// it is the first content of a compound list item.
    pub(crate) fn start_list(&mut self, compound: bool, kind: ListKind) {
        if self.in_list() {
            if compound {
                self.body.push(String::new());
            }
        } else if !self.is_empty() {
            self.body.push(String::new());
        }
        self.separators.push("+".into());
        *self.levels.get_mut(kind) += 1;
    }

    /// Leave a list, restoring the separator and level counter.
    pub(crate) fn end_list(&mut self, kind: ListKind) {
        if self.separators.len() < 2 {
            panic!("end_list without matching start_list");
        }
        self.separators.pop();
        let level = self.levels.get_mut(kind);
        *level = level.checked_sub(1).unwrap_or_else(|| panic!("list level underflow"));
    }

    pub(crate) fn list_level(&self, kind: ListKind) -> usize {
        self.levels.get(kind)
    }

    pub(crate) fn in_list(&self) -> bool {
        self.separators.last().map(String::as_str) == Some("+")
    }

    pub(crate) fn add_blank_line(&mut self) {
        self.body.push(String::new());
    }

    pub(crate) fn add_line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    pub(crate) fn add_lines<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.body.extend(lines.into_iter().map(Into::into));
    }

    /// Concatenate onto the last line rather than starting a new one.
    pub(crate) fn append(&mut self, text: &str) {
        match self.body.last_mut() {
            Some(last) => last.push_str(text),
            None => self.body.push(text.to_string()),
        }
    }

    /// Retract the last line (used to drop a dangling list-continuation
    /// marker before a block that doesn't need one).
    pub(crate) fn clear_line(&mut self) {
        self.replace_line(String::new());
    }

    pub(crate) fn replace_line(&mut self, line: impl Into<String>) {
        self.body.pop();
        self.body.push(line.into());
    }

    pub(crate) fn current_line(&self) -> Option<&str> {
        self.body.last().map(String::as_str)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub(crate) fn body(&self) -> &[String] {
        &self.body
    }

    pub(crate) fn take_body(&mut self) -> Vec<String> {
        mem::take(&mut self.body)
    }

    pub(crate) fn doctitle(&self) -> Option<&str> {
        self.doctitle.as_deref()
    }

    /// Set the document title. Setting twice replaces the previous value.
    pub(crate) fn set_doctitle(&mut self, title: impl Into<String>) {
        self.doctitle = Some(title.into());
    }

    pub(crate) fn add_attributes(&mut self, attributes: BTreeMap<String, String>) {
        self.attributes.extend(attributes);
    }

    pub(crate) fn add_prologue_lines<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.prologue.extend(lines.into_iter().map(Into::into));
    }

    pub(crate) fn add_prologue_line(&mut self, line: impl Into<String>) {
        self.prologue.push(line.into());
    }

    /// Assemble the final document: prologue, doctitle, attributes sorted by
    /// name, a separating blank line, then the body. Trailing-space-only
    /// line endings are trimmed and non-breaking-space artifacts from inline
    /// composition are normalized to ordinary spaces.
    pub(crate) fn finish(&self) -> String {
        let mut header: Vec<String> = self.prologue.clone();
        if let Some(title) = &self.doctitle {
            header.push(format!("= {title}"));
        }
        for (name, val) in &self.attributes {
            if val.is_empty() {
                header.push(format!(":{name}:"));
            } else {
                header.push(format!(":{name}: {val}"));
            }
        }
        let lines: Vec<&str> = if header.is_empty() {
            self.body.iter().map(String::as_str).collect()
        } else if self.body.is_empty() {
            header.iter().map(String::as_str).collect()
        } else {
            header
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(""))
                .chain(self.body.iter().map(String::as_str))
                .collect()
        };
        let mut result = lines.join("\n");
        if TRAILING_SPACE.is_match(&result) {
            result = TRAILING_SPACE.replace_all(&result, "").into_owned();
        }
        if result.contains(NBSP) {
            result = result.replace(NBSP, " ");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_start_block_noop_when_empty() {
        let mut w = Writer::new();
        w.start_block();
        assert!(w.is_empty());
    }

    #[test]
    fn test_start_block_inserts_separator() {
        let mut w = Writer::new();
        w.add_line("one");
        w.start_block();
        w.add_line("two");
        assert_eq!(w.finish(), "one\n\ntwo");
    }

    #[test]
    fn test_list_separator_is_continuation() {
        let mut w = Writer::new();
        w.start_list(false, ListKind::List);
        w.add_line("* item");
        w.start_block();
        w.add_line("attached");
        w.end_list(ListKind::List);
        assert_eq!(w.finish(), "* item\n+\nattached");
    }

    #[test]
    fn test_list_level_round_trips() {
        let mut w = Writer::new();
        w.start_list(false, ListKind::List);
        w.start_list(false, ListKind::Dlist);
        assert_eq!(w.list_level(ListKind::List), 1);
        assert_eq!(w.list_level(ListKind::Dlist), 1);
        w.end_list(ListKind::Dlist);
        w.end_list(ListKind::List);
        assert_eq!(w.list_level(ListKind::List), 0);
        assert_eq!(w.list_level(ListKind::Dlist), 0);
        assert!(!w.in_list());
    }

    #[test]
    fn test_delimited_block_round_trip() {
        let mut w = Writer::new();
        w.start_delimited_block("_");
        w.add_line("quoted");
        w.end_delimited_block();
        assert_eq!(w.finish(), "____\nquoted\n____");
    }

    #[test]
    fn test_delimited_block_resets_nested_scope() {
        let mut w = Writer::new();
        w.add_line("before");
        w.start_list(false, ListKind::List);
        w.start_delimited_block("====");
        // Nested scope starts fresh: no separator fires, list level is reset.
        w.start_block();
        assert_eq!(w.list_level(ListKind::List), 0);
        w.add_line("inner");
        w.end_delimited_block();
        w.end_list(ListKind::List);
        assert_eq!(w.list_level(ListKind::List), 0);
        assert_eq!(w.finish(), "before\n\n====\ninner\n====");
    }

    #[test]
    #[should_panic(expected = "end_delimited_block")]
    fn test_end_delimited_block_underflow_panics() {
        let mut w = Writer::new();
        w.end_delimited_block();
    }

    #[test]
    #[should_panic(expected = "end_list")]
    fn test_end_list_underflow_panics() {
        let mut w = Writer::new();
        w.end_list(ListKind::List);
    }

    #[test]
    fn test_append_starts_line_when_empty() {
        let mut w = Writer::new();
        w.append("a");
        w.append("b");
        assert_eq!(w.finish(), "ab");
    }

    #[test]
    fn test_replace_line_retracts_marker() {
        let mut w = Writer::new();
        w.add_line("keep");
        w.add_line("+");
        w.clear_line();
        assert_eq!(w.finish(), "keep\n");
    }

    #[test]
    fn test_doctitle_set_twice_replaces() {
        let mut w = Writer::new();
        w.set_doctitle("First");
        w.set_doctitle("Second");
        assert_eq!(w.finish(), "= Second");
    }

    #[test]
    fn test_finish_orders_header_attributes_and_body() {
        let mut w = Writer::new();
        w.add_prologue_line("// generated");
        w.set_doctitle("Title");
        w.add_attributes(BTreeMap::from([
            ("toc".to_string(), "macro".to_string()),
            ("experimental".to_string(), String::new()),
        ]));
        w.add_line("body");
        assert_eq!(w.finish(), "// generated\n= Title\n:experimental:\n:toc: macro\n\nbody");
    }

    #[test]
    fn test_finish_trims_trailing_spaces_and_nbsp() {
        let mut w = Writer::new();
        w.add_line("trailing  ");
        w.add_line("non\u{00a0}breaking");
        assert_eq!(w.finish(), "trailing\nnon breaking");
    }
}
