//! Per-node conversion rules.
//!
//! Each handler receives the node, its traversal context, and the Writer to
//! emit into. Block handlers open with `start_block` (or a list/delimiter
//! call) so separation between siblings is always the Writer's decision.

use crate::render::escape::{
    self, admonition_type, formatted_admonition_label, ADMON_LABELS, ADMON_MARKERS,
    ADMON_MARKERS_ASCIIDOC, COMMENT_PREFIX, CSS_PROP_DELIM, DLIST_MARKERS, LIST_MARKER_LINE,
    MENU_REF, XML_COMMENT,
};
use crate::render::{plain_text, refs, trailing_block_content, Ctx, Renderer};
use crate::tree::{
    Alignment, Blockquote, CodeBlock, CodeSpan, Comment, DefinitionDescription, DefinitionTerm, Emphasis,
    HardBreak, Heading, HtmlElement, Image, Link, ListItem, Math, Node, Paragraph, Strong, Table,
    Text,
};
use crate::writer::{ListKind, Writer};
use crate::Wrap;

impl<'o> Renderer<'o> {
    pub(crate) fn convert<'a>(&mut self, node: &'a Node, ctx: Ctx<'a>, w: &mut Writer) {
        match node {
            Node::Root(r) => {
                self.traverse(&refs(&r.children), Ctx { parent: Some(node), ..ctx }, w)
            }
            Node::Heading(h) => self.convert_heading(node, h, ctx, w),
            Node::Paragraph(p) => self.convert_paragraph(node, p, ctx, w),
            Node::Blockquote(b) => self.convert_blockquote(node, b, ctx, w),
            Node::CodeBlock(c) => self.convert_code_block(c, w),
            Node::Image(i) => self.convert_image(i, ctx, w, None),
            Node::UnorderedList(l) => self.convert_list(node, &l.children, ListKind::List, ctx, w),
            Node::OrderedList(l) => self.convert_list(node, &l.children, ListKind::List, ctx, w),
            Node::DefinitionList(l) => {
                self.convert_list(node, &l.children, ListKind::Dlist, ctx, w)
            }
            Node::ListItem(li) => self.convert_list_item(node, li, ctx, w),
            Node::DefinitionTerm(dt) => self.convert_definition_term(node, dt, ctx, w),
            Node::DefinitionDescription(dd) => self.convert_definition_description(node, dd, ctx, w),
            Node::Table(t) => self.convert_table(t, w),
            Node::HorizontalRule(_) => {
                w.start_block();
                w.add_line("'''");
            }
            Node::Link(l) => self.convert_link(node, l, ctx, w),
            Node::Emphasis(e) => self.convert_emphasis(node, e, ctx, w),
            Node::Strong(s) => self.convert_strong(node, s, ctx, w),
            Node::CodeSpan(c) => self.convert_code_span(c, ctx, w),
            Node::HardBreak(b) => self.convert_hard_break(b, ctx, w),
            Node::Entity(e) => w.append(&escape::resolve_entity(e.code_point, &e.original)),
            Node::SmartQuote(q) => w.append(escape::smart_quote_markup(q.kind)),
            Node::TypographicSymbol(s) => w.append(escape::typographic_symbol_markup(s.kind)),
            Node::HtmlElement(h) => self.convert_html_element(node, h, ctx, w),
            Node::Comment(c) => self.convert_comment(c, w),
            Node::Math(m) => self.convert_math(m, w),
            Node::Text(t) => self.convert_text(t, w),
            Node::Blank(_) => {}
            // Row groups, rows, and cells are consumed by convert_table.
            Node::TableRowGroup(_) | Node::TableRow(_) | Node::TableCell(_) => {}
        }
    }

    fn convert_heading<'a>(&mut self, el: &'a Node, h: &'a Heading, ctx: Ctx<'a>, w: &mut Writer) {
        w.start_block();
        let level = i32::from(h.level) + self.options().heading_offset;
        let discrete = matches!(self.current_heading_level, Some(cur) if level > cur + 1);

        // A level-5 heading jumping the hierarchy directly above a code block
        // reads as that block's title.
        if discrete
            && level == 5
            && [ctx.next, ctx.next2].iter().flatten().any(|n| matches!(n, Node::CodeBlock(_)))
        {
            let title = self.compose(
                &refs(&h.children),
                Ctx { parent: Some(el), ..Ctx::default() },
                true,
                Wrap::Preserve,
            );
            w.add_line(format!(".{title}"));
            return;
        }

        let mut style: Vec<String> = Vec::new();
        if discrete {
            style.push("discrete".to_string());
        }

        // An inline anchor wrapping the heading text donates its id.
        let mut kids: Vec<&Node> = refs(&h.children);
        let mut explicit_id = h.id.clone();
        if let Some(Node::HtmlElement(a)) = h.children.first() {
            if a.tag == "a" {
                if let Some((_, id)) = a.attrs.iter().find(|(name, _)| name == "id") {
                    explicit_id = Some(id.clone());
                    kids = a.children.iter().chain(h.children[1..].iter()).collect();
                }
            }
        }

        let text = self.compose(&kids, Ctx { parent: Some(el), ..Ctx::default() }, true, Wrap::Preserve);

        let opts = self.options();
        let (auto_ids, lazy_ids) = (opts.auto_ids, opts.lazy_ids);
        let generated = if auto_ids || lazy_ids {
            let mut plain = String::new();
            plain_text(&kids, &mut plain);
            self.generate_unique_id(&plain)
        } else {
            None
        };
        match (explicit_id, generated) {
            // Lazy ids omit an explicit id that matches what would be
            // generated anyway.
            (Some(id), Some(gen)) if lazy_ids && id == gen => {}
            (Some(id), _) => style.push(format!("#{id}")),
            (None, Some(gen)) if auto_ids && !lazy_ids => style.push(format!("#{gen}")),
            _ => {}
        }
        if let Some(role) = &h.role {
            style.push(format!(".{}", role.replace(' ', ".")));
        }

        let mut lines: Vec<String> = Vec::new();
        if !style.is_empty() {
            lines.push(format!("[{}]", style.concat()));
        }
        let marker_len = level.max(1) as usize;
        lines.push(format!("{} {}", "=".repeat(marker_len), text));

        if level == 1 && w.is_empty() && self.current_heading_level != Some(1) {
            if lines.len() == 2 {
                w.add_prologue_line(lines.remove(0));
            }
            w.set_doctitle(text);
        } else {
            if level == 1 {
                self.set_attribute("doctype", "book");
            }
            w.add_lines(lines);
        }
        if !discrete {
            self.current_heading_level = Some(level);
        }
    }

    fn convert_paragraph<'a>(
        &mut self,
        el: &'a Node,
        p: &'a Paragraph,
        _ctx: Ctx<'a>,
        w: &mut Writer,
    ) {
        w.start_block();
        let scope = Ctx { parent: Some(el), ..Ctx::default() };
        let wrap = self.options().wrap;

        if p.children.is_empty() {
            w.add_line("{blank}");
            return;
        }

        // Plain admonition: the paragraph text starts with "Note: " etc.
        if let Some(Node::Text(t)) = p.children.first() {
            if ADMON_MARKERS.iter().any(|m| t.value.starts_with(m)) {
                if let Some((label, rest)) = t.value.split_once(": ") {
                    if let Some(admon) = admonition_type(label) {
                        let rewritten = Node::text(format!("{admon}: {rest}"));
                        let mut kids: Vec<&Node> = vec![&rewritten];
                        kids.extend(&p.children[1..]);
                        let lines = self.compose_split(&kids, scope, true, wrap);
                        w.add_lines(lines);
                        return;
                    }
                }
            }
        }

        // Formatted admonition: a strong/emphasis label opens the paragraph,
        // either as "*Note:* text" or "*Note*: text".
        if let Some(first @ (Node::Strong(_) | Node::Emphasis(_))) = p.children.first() {
            if let Some(Node::Text(t)) = first.children().and_then(<[Node]>::first) {
                let mut admon = None;
                let mut rewritten_follower: Option<Node> = None;
                if let Some(label) = formatted_admonition_label(&t.value) {
                    admon = admonition_type(label);
                } else if ADMON_LABELS.contains(&t.value.as_str()) {
                    if let Some(Node::Text(follower)) = p.children.get(1) {
                        if follower.value.starts_with(": ") {
                            admon = admonition_type(&t.value);
                            rewritten_follower = Some(Node::text(&follower.value[1..]));
                        }
                    }
                }
                if let Some(admon) = admon {
                    let mut kids: Vec<&Node> = Vec::new();
                    match &rewritten_follower {
                        Some(follower) => {
                            kids.push(follower);
                            kids.extend(&p.children[2..]);
                        }
                        None => kids.extend(&p.children[1..]),
                    }
                    let mut lines = self.compose_split(&kids, scope, true, wrap);
                    match lines.first_mut() {
                        Some(first_line) => *first_line = format!("{admon}: {first_line}"),
                        None => lines.push(format!("{admon}:")),
                    }
                    w.add_lines(lines);
                    return;
                }
            }
        }

        let lines = self.compose_split(&refs(&p.children), scope, true, wrap);
        w.add_lines(lines);
    }

    fn convert_blockquote<'a>(
        &mut self,
        el: &'a Node,
        b: &'a Blockquote,
        ctx: Ctx<'a>,
        w: &mut Writer,
    ) {
        w.start_block();
        let depth = ctx.blockquote_depth;
        let mut bw = Writer::new();
        self.traverse(
            &refs(&b.children),
            Ctx { parent: Some(el), blockquote_depth: depth + 1, ..Ctx::default() },
            &mut bw,
        );
        let mut contents = bw.take_body();
        let Some(first_line) = contents.first() else { return };

        // An admonition quote needs no quoting at all, unless it spans
        // multiple blocks.
        if ADMON_MARKERS_ASCIIDOC.iter().any(|m| first_line.starts_with(m))
            && !contents.iter().any(String::is_empty)
        {
            w.add_lines(contents);
            return;
        }

        if contents.len() > 1 {
            if let Some(last) = contents.last() {
                if let Some(attribution) = last.strip_prefix("-- ") {
                    let attribution = attribution.to_string();
                    contents.pop();
                    w.add_line(format!("[,{attribution}]"));
                    while matches!(contents.last(), Some(line) if line.is_empty()) {
                        contents.pop();
                    }
                }
            }
        }

        let delimiter = if depth > 0 {
            format!("____{}", "__".repeat(depth))
        } else {
            "_".to_string()
        };
        w.start_delimited_block(&delimiter);
        w.add_lines(contents);
        w.end_delimited_block();
    }

    fn convert_code_block(&mut self, c: &CodeBlock, w: &mut Writer) {
        // Skip the separator when a block title line immediately precedes,
        // but not after a literal paragraph line (". " content).
        if let Some(current) = w.current_line() {
            if !current.starts_with('.') || current.starts_with(". ") {
                w.start_block();
            }
        }

        let value = c.value.trim_end();
        let lines: Vec<&str> = if value.is_empty() { Vec::new() } else { value.split('\n').collect() };
        let has_blank = lines.iter().any(|line| line.is_empty());
        let prompt = lines.first().is_some_and(|line| line.starts_with("$ "));

        let mut lang = c.lang.as_deref();
        if let Some(lang) = lang {
            w.add_line(format!("[source,{lang}]"));
        } else if prompt && has_blank {
            w.add_line("[source,console]");
            lang = Some("console");
        }

        if lang.is_some() || (c.fenced && !prompt) {
            w.add_line("----");
            w.add_lines(lines.iter().copied());
            w.add_line("----");
        } else if !prompt && has_blank {
            w.add_line("....");
            w.add_lines(lines.iter().copied());
            w.add_line("....");
        } else if lines.iter().any(|line| LIST_MARKER_LINE.is_match(line)) {
            // Console output with lines that would reparse as list markers
            // must stay delimited.
            w.add_line("....");
            w.add_lines(lines.iter().copied());
            w.add_line("....");
        } else {
            if w.current_line() == Some("+") {
                w.clear_line();
            }
            w.add_lines(lines.iter().map(|line| format!(" {line}")));
        }
    }

    pub(crate) fn convert_image(
        &mut self,
        img: &Image,
        ctx: Ctx<'_>,
        w: &mut Writer,
        link: Option<&str>,
    ) {
        // An image alone in its paragraph becomes a block image macro.
        let block = matches!(ctx.parent, Some(Node::Paragraph(p)) if p.children.len() == 1);
        let mut block_attrs_line = None;
        if block {
            let mut style: Vec<String> = Vec::new();
            if let Some(id) = &img.id {
                style.push(format!("#{id}"));
            }
            if let Some(role) = &img.role {
                style.push(format!(".{}", role.replace(' ', ".")));
            }
            if !style.is_empty() {
                block_attrs_line = Some(format!("[{}]", style.concat()));
            }
        }

        let mut macro_attrs: Vec<String> = vec![img.alt.clone().unwrap_or_default()];
        if let Some(width) = &img.width {
            macro_attrs.push(width.clone());
        } else if let Some(css) = &img.style {
            if let Some(width) = css_width(css) {
                macro_attrs.push(width);
            }
        }
        if macro_attrs.len() == 1 && macro_attrs[0].is_empty() {
            macro_attrs.clear();
        }
        if let Some(url) = link {
            macro_attrs.push(format!("link={url}"));
        }

        let mut src = img.src.as_str();
        if let Some(dir) = self.imagesdir() {
            let prefix = format!("{dir}/");
            if let Some(relative) = src.strip_prefix(&prefix) {
                src = relative;
            }
        }

        let attrs = macro_attrs.join(",");
        if block {
            w.start_block();
            if let Some(line) = block_attrs_line {
                w.add_line(line);
            }
            w.add_line(format!("image::{src}[{attrs}]"));
        } else {
            w.append(&format!("image:{src}[{attrs}]"));
        }
    }

    fn convert_list<'a>(
        &mut self,
        el: &'a Node,
        children: &'a [Node],
        kind: ListKind,
        ctx: Ctx<'a>,
        w: &mut Writer,
    ) {
        let compound = matches!(ctx.parent, Some(Node::DefinitionDescription(_))) || ctx.in_compound_item;
        w.start_list(compound, kind);
        self.traverse(
            &refs(children),
            Ctx { parent: Some(el), in_compound_item: false, ..ctx },
            w,
        );
        w.end_list(kind);
        if w.in_list() && ctx.next.is_some() {
            w.add_blank_line();
        }
    }

    fn convert_list_item<'a>(&mut self, el: &'a Node, li: &'a ListItem, ctx: Ctx<'a>, w: &mut Writer) {
        // A compound previous sibling already emitted attached content;
        // a blank line keeps this item from reading as more of it.
        if let Some(Node::ListItem(prev)) = ctx.prev {
            if list_item_compound(prev) {
                w.add_blank_line();
            }
        }

        let marker = if matches!(ctx.parent, Some(Node::OrderedList(_))) { "." } else { "*" };
        let level = w.list_level(ListKind::List);
        let indent = level.saturating_sub(1);

        let (primary, remaining): (Option<&Node>, &[Node]) = match li.children.first() {
            Some(p @ Node::Paragraph(_)) => (Some(p), &li.children[1..]),
            _ => (None, &li.children[..]),
        };
        let mut primary_lines = match primary {
            Some(p) => self.compose_split(
                &[p],
                Ctx { parent: Some(el), ..Ctx::default() },
                true,
                self.options().wrap,
            ),
            None => vec!["{blank}".to_string()],
        };
        if primary_lines.is_empty() {
            primary_lines.push("{blank}".to_string());
        }

        let first = primary_lines.remove(0);
        let mut lines = vec![format!("{}{} {}", " ".repeat(indent), marker.repeat(level), first)];
        lines.append(&mut primary_lines);
        w.add_lines(lines);

        if !remaining.is_empty() {
            let compound = trailing_block_content(remaining);
            self.traverse(
                &refs(remaining),
                Ctx { parent: Some(el), in_compound_item: compound, ..ctx },
                w,
            );
        }
    }

    fn convert_definition_term<'a>(
        &mut self,
        el: &'a Node,
        dt: &'a DefinitionTerm,
        ctx: Ctx<'a>,
        w: &mut Writer,
    ) {
        let term = self.compose(
            &refs(&dt.children),
            Ctx { parent: Some(el), ..Ctx::default() },
            true,
            Wrap::Preserve,
        );
        let level = w.list_level(ListKind::Dlist);
        let marker = DLIST_MARKERS[level.saturating_sub(1).min(DLIST_MARKERS.len() - 1)];
        if ctx.prev.is_some() {
            w.add_blank_line();
        }
        w.add_line(format!("{term}{marker}"));
    }

    fn convert_definition_description<'a>(
        &mut self,
        el: &'a Node,
        dd: &'a DefinitionDescription,
        ctx: Ctx<'a>,
        w: &mut Writer,
    ) {
        let Some((first, remaining)) = dd.children.split_first() else { return };
        let primary_lines = self.compose_split(
            &[first],
            Ctx { parent: Some(el), ..Ctx::default() },
            true,
            self.options().wrap,
        );
        let mut compound = false;
        if primary_lines.len() == 1 {
            w.append(&format!(" {}", primary_lines[0]));
        } else {
            compound = true;
            w.add_lines(primary_lines);
        }
        if !remaining.is_empty() {
            if trailing_block_content(remaining) {
                compound = true;
            }
            self.traverse(
                &refs(remaining),
                Ctx { parent: Some(el), in_compound_item: compound, ..ctx },
                w,
            );
        }
    }

    fn convert_table(&mut self, t: &Table, w: &mut Writer) {
        let cols = t.alignments.len();
        let colspecs = if t.alignments.iter().any(|a| matches!(a, Alignment::Center | Alignment::Right)) {
            let marks = t.alignments.iter().map(|a| a.mark()).collect::<Vec<_>>().join(",");
            Some(if cols > 1 { format!("\"{marks}\"") } else { marks })
        } else {
            None
        };

        let ventilate = self.options().wrap == Wrap::Ventilate;
        let mut head = false;
        let mut buffer: Vec<String> = vec!["|===".to_string()];
        for group in &t.children {
            let Node::TableRowGroup(group) = group else { continue };
            for row in &group.children {
                let Node::TableRow(row) = row else { continue };
                let mut row_buffer: Vec<String> = Vec::new();
                for cell in &row.children {
                    let Node::TableCell(c) = cell else { continue };
                    let scope = Ctx { parent: Some(cell), ..Ctx::default() };
                    if ventilate {
                        let mut cell_lines = self
                            .compose_split(&refs(&c.children), scope, false, Wrap::Ventilate)
                            .into_iter()
                            .map(|line| line.replace('|', "\\|"))
                            .collect::<Vec<_>>();
                        if cell_lines.is_empty() {
                            cell_lines.push(String::new());
                        }
                        cell_lines[0] = format!("| {}", cell_lines[0]);
                        row_buffer.extend(cell_lines);
                    } else {
                        let contents =
                            self.compose(&refs(&c.children), scope, false, Wrap::Preserve);
                        row_buffer.push(format!("| {}", contents.replace('|', "\\|")));
                    }
                }
                if group.head {
                    head = true;
                    row_buffer = vec![row_buffer.join(" "), String::new()];
                } else if cols > 1 {
                    row_buffer.push(String::new());
                }
                buffer.append(&mut row_buffer);
            }
        }
        if matches!(buffer.last(), Some(line) if line.is_empty()) {
            buffer.pop();
        }
        buffer.push("|===".to_string());

        w.start_block();
        if let Some(colspecs) = colspecs {
            w.add_line(format!("[cols={colspecs}]"));
        } else if !head && cols > 1 {
            w.add_line(format!("[cols={cols}*]"));
        }
        w.add_lines(buffer);
    }

    fn convert_link<'a>(&mut self, el: &'a Node, l: &'a Link, ctx: Ctx<'a>, w: &mut Writer) {
        let scope = Ctx { parent: Some(el), ..Ctx::default() };
        if let Some(fragment) = l.href.strip_prefix('#') {
            let text = self.compose(&refs(&l.children), scope, true, Wrap::Preserve);
            w.append(&format!("<<{fragment},{text}>>"));
        } else if l.href.starts_with("https://") || l.href.starts_with("http://") {
            if let [Node::Image(img)] = &l.children[..] {
                self.convert_image(img, ctx, w, Some(&l.href));
                return;
            }
            let text = self.compose(&refs(&l.children), scope, true, Wrap::Preserve);
            let bare = chomp_slash(&text) == chomp_slash(&l.href);
            // Double underscores in a URL would otherwise toggle formatting.
            let url = if l.href.contains("__") {
                l.href.replace("__", "%5F%5F")
            } else {
                l.href.clone()
            };
            if bare {
                w.append(&url);
            } else {
                w.append(&format!("{url}[{}]", text.replace(']', "\\]")));
            }
        } else if let Some(stem) = l.href.strip_suffix(".md") {
            let mut text =
                self.compose(&refs(&l.children), scope, true, Wrap::Preserve).replace(']', "\\]");
            if let Some(t) = text.strip_suffix(".md") {
                text = format!("{t}.adoc");
            }
            w.append(&format!("xref:{stem}.adoc[{text}]"));
        } else {
            let text = self.compose(&refs(&l.children), scope, true, Wrap::Preserve);
            w.append(&format!("link:{}[{}]", l.href, text.replace(']', "\\]")));
        }
    }

    fn convert_emphasis<'a>(&mut self, el: &'a Node, e: &'a Emphasis, ctx: Ctx<'a>, w: &mut Writer) {
        let text = self.compose(
            &refs(&e.children),
            Ctx { parent: Some(el), ..Ctx::default() },
            false,
            Wrap::Preserve,
        );
        let mark = if unconstrained(ctx.prev, ctx.next) { "__" } else { "_" };
        w.append(&format!("{mark}{text}{mark}"));
    }

    fn convert_strong<'a>(&mut self, el: &'a Node, s: &'a Strong, ctx: Ctx<'a>, w: &mut Writer) {
        let text = self.compose(
            &refs(&s.children),
            Ctx { parent: Some(el), ..Ctx::default() },
            false,
            Wrap::Preserve,
        );
        if text.contains(" > ") {
            if let Some(caps) = MENU_REF.captures(&text) {
                self.set_attribute("experimental", "");
                w.append(&format!("menu:{}[{}]", &caps[1], &caps[2]));
                return;
            }
        }
        let mark = if unconstrained(ctx.prev, ctx.next) { "**" } else { "*" };
        w.append(&format!("{mark}{text}{mark}"));
    }

    fn convert_code_span(&mut self, c: &CodeSpan, ctx: Ctx<'_>, w: &mut Writer) {
        let mut attrlist = "";
        let mut mark = "`";
        if unconstrained(ctx.prev, ctx.next) {
            mark = "``";
        } else {
            match ctx.next {
                Some(Node::SmartQuote(_)) => {
                    // Back-to-back quotes around code collide with the
                    // double-backtick form; disambiguate with a role.
                    if matches!(ctx.prev, Some(Node::SmartQuote(_))) {
                        attrlist = "[.code]";
                    }
                    mark = "``";
                }
                Some(Node::Text(t)) if t.value.starts_with('\'') => mark = "``",
                Some(_) => {
                    if matches!(ctx.prev, Some(Node::SmartQuote(_))) {
                        mark = "``";
                    }
                }
                // Nothing follows, so the quote cannot collide with the
                // closing mark.
                None => {}
            }
        }
        let text = &c.value;
        if text.contains("++") {
            w.append(&format!("{mark}pass:c[{text}]{mark}"));
        } else if escape::replaceable(text) {
            w.append(&format!("{mark}+{text}+{mark}"));
        } else {
            w.append(&format!("{attrlist}{mark}{text}{mark}"));
        }
    }

    fn convert_text(&mut self, t: &Text, w: &mut Writer) {
        let mut text = escape::escape_replacements(&t.value, self.options().auto_links);
        if text.contains("++") {
            self.set_attribute("pp", "{plus}{plus}");
            text = text.replace("++", "{pp}");
        }
        if w.current_line().is_none_or(str::is_empty) {
            w.append(text.trim_start());
        } else {
            w.append(&text);
        }
    }

    fn convert_hard_break(&mut self, b: &HardBreak, ctx: Ctx<'_>, w: &mut Writer) {
        if w.is_empty() {
            w.append("{blank} +");
        } else if w.current_line().is_some_and(|line| line.ends_with(' ')) {
            w.append("+");
        } else {
            w.append(" +");
        }
        if b.from_html {
            let follower_breaks = matches!(ctx.next, Some(Node::Text(t)) if t.value.starts_with('\n'));
            if !follower_breaks {
                w.add_blank_line();
            }
        }
    }

    fn convert_html_element<'a>(
        &mut self,
        el: &'a Node,
        h: &'a HtmlElement,
        ctx: Ctx<'a>,
        w: &mut Writer,
    ) {
        if self.options().html_to_native && h.tag == "div" {
            if let Some(first @ Node::Paragraph(p)) = h.children.first() {
                let class = attr_value(&h.attrs, "class");
                if class.is_some_and(|c| c.starts_with("note")) {
                    if let Some(Node::HtmlElement(span)) = p.children.first() {
                        if span.tag == "span" && attr_value(&span.attrs, "class") == Some("notetitle")
                        {
                            let label = match span.children.first() {
                                Some(Node::Text(t)) => {
                                    formatted_admonition_label(&t.value).unwrap_or("Note")
                                }
                                _ => "Note",
                            };
                            let admon = admonition_type(label).unwrap_or("NOTE");
                            let mut lines = self.compose_split(
                                &refs(&p.children[1..]),
                                Ctx { parent: Some(first), ..Ctx::default() },
                                true,
                                self.options().wrap,
                            );
                            match lines.first_mut() {
                                Some(first_line) => *first_line = format!("{admon}: {first_line}"),
                                None => lines.push(format!("{admon}:")),
                            }
                            w.start_block();
                            w.add_lines(lines);
                            return;
                        }
                    }
                }
                // Transparent wrapper: render the paragraph as if the div
                // were not there.
                if let Node::Paragraph(p) = first {
                    self.convert_paragraph(first, p, Ctx { parent: Some(el), ..ctx }, w);
                    return;
                }
            }
        }

        let contents = self.compose(
            &refs(&h.children),
            Ctx { parent: Some(el), ..Ctx::default() },
            h.block,
            Wrap::Preserve,
        );
        let native = self.options().html_to_native;
        match h.tag.as_str() {
            "del" if native => w.append(&format!("[.line-through]#{contents}#")),
            "mark" if native => w.append(&format!("#{contents}#")),
            "span" if native => match attr_value(&h.attrs, "class") {
                Some(class) => w.append(&format!("[.{}]#{contents}#", class.replace(' ', "."))),
                None => w.append(&contents),
            },
            "sup" if native => w.append(&format!("^{contents}^")),
            "sub" if native => w.append(&format!("~{contents}~")),
            tag => {
                let attrs = h
                    .attrs
                    .iter()
                    .map(|(name, value)| format!(" {name}=\"{value}\""))
                    .collect::<String>();
                w.append(&format!("+++<{tag}{attrs}>+++{contents}+++</{tag}>+++"));
            }
        }
    }

    fn convert_comment(&mut self, c: &Comment, w: &mut Writer) {
        let inner = match XML_COMMENT.captures(&c.value) {
            Some(caps) => caps[1].to_string(),
            None => c.value.clone(),
        };
        // Markdown-style comment bodies use a `!` line prefix.
        let cleaned = if inner.contains(" !") {
            COMMENT_PREFIX.replace_all(&inner, "").trim().to_string()
        } else {
            inner.trim().to_string()
        };
        let lines: Vec<&str> =
            if cleaned.is_empty() { Vec::new() } else { cleaned.split('\n').collect() };

        if c.block {
            w.start_block();
            match lines.len() {
                0 => w.add_line("//"),
                1 => w.add_line(format!("// {}", lines[0])),
                _ => {
                    w.add_line("////");
                    w.add_lines(lines.iter().copied());
                    w.add_line("////");
                }
            }
        } else if !lines.is_empty() {
            let mut start_new_line = false;
            if let Some(current) = w.current_line() {
                if !current.ends_with('\n') {
                    start_new_line = true;
                    if current.ends_with(' ') {
                        let trimmed = current.trim_end().to_string();
                        w.replace_line(trimmed);
                    }
                }
            }
            let mut comment_lines = lines.iter().map(|line| format!("// {line}"));
            if start_new_line {
                w.add_lines(comment_lines);
            } else if let Some(first) = comment_lines.next() {
                w.append(&first);
                w.add_lines(comment_lines);
            }
            w.add_blank_line();
        }
    }

    fn convert_math(&mut self, m: &Math, w: &mut Writer) {
        self.set_attribute("stem", "latexmath");
        if m.block {
            w.start_block();
            w.add_line("[stem]");
            w.add_line("++++");
            w.add_lines(m.value.trim().split('\n'));
            w.add_line("++++");
        } else {
            w.append(&format!("stem:[{}]", m.value.replace(']', "\\]")));
        }
    }
}

/// Whether a span needs the unconstrained (doubled) formatting marks because
/// it abuts word characters.
fn unconstrained(prev: Option<&Node>, next: Option<&Node>) -> bool {
    let next_wordish = matches!(next, Some(Node::Text(t))
        if t.value.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_'));
    if next_wordish {
        return true;
    }
    match prev {
        Some(Node::Entity(_)) => true,
        Some(Node::Text(t)) => t
            .value
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || "_;:<>&".contains(c)),
        _ => false,
    }
}

/// A compound list item's continuation is attached with `+`; the one after
/// it needs a blank line to separate.
fn list_item_compound(li: &ListItem) -> bool {
    let remaining = match li.children.first() {
        Some(Node::Paragraph(_)) => &li.children[1..],
        _ => &li.children[..],
    };
    trailing_block_content(remaining)
}

/// Extract a numeric width from a CSS declaration list, best effort.
fn css_width(css: &str) -> Option<String> {
    let declaration = CSS_PROP_DELIM.split(css).find(|d| d.trim_start().starts_with("width:"))?;
    let raw = declaration.split_once(':')?.1.trim();
    if raw.ends_with('%') {
        return Some(raw.to_string());
    }
    let numeric: String =
        raw.chars().take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();
    match numeric.parse::<f64>() {
        Ok(value) => Some(format!("{}", value.round() as i64)),
        Err(_) => Some(raw.to_string()),
    }
}

fn attr_value<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}

fn chomp_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconstrained_when_next_starts_with_word() {
        let next = Node::text("s later");
        assert!(unconstrained(None, Some(&next)));
    }

    #[test]
    fn test_constrained_between_spaces() {
        let prev = Node::text("before ");
        let next = Node::text(" after");
        assert!(!unconstrained(Some(&prev), Some(&next)));
    }

    #[test]
    fn test_unconstrained_after_wordish_text() {
        let prev = Node::text("value:");
        assert!(unconstrained(Some(&prev), None));
    }

    #[test]
    fn test_css_width_rounds_pixels() {
        assert_eq!(css_width("width: 240.4px; border: 0"), Some("240".into()));
        assert_eq!(css_width("width: 50%"), Some("50%".into()));
        assert_eq!(css_width("width: auto"), Some("auto".into()));
        assert_eq!(css_width("border: 0"), None);
    }

    #[test]
    fn test_chomp_slash_removes_one() {
        assert_eq!(chomp_slash("https://example.org/"), "https://example.org");
        assert_eq!(chomp_slash("https://example.org//"), "https://example.org/");
    }
}
