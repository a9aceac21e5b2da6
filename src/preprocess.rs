//! Source preprocessors that run before parsing.
//!
//! Each preprocessor takes the Markdown source and a mutable attribute map,
//! returning the (possibly rewritten) source. They borrow when no rewrite is
//! needed, so a typical document passes through without copying.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

const TOC_DIRECTIVE_TIP: &str = "<!-- TOC ";

static TOC_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^<!-- TOC .*<!-- /TOC -->").unwrap());

/// Skim the front matter off the top of the source, storing its entries in
/// `attributes`.
///
/// The front matter must open on the very first line with `---`, close with
/// `---`, and contain no blank line (a blank line means the opening `---` was
/// a thematic break). A `layout` entry becomes the `page-layout` attribute
/// unless its value is `default`. If the block is malformed or its YAML does
/// not parse to a mapping, the source is returned unchanged.
pub fn extract_front_matter<'a>(
    source: &'a str,
    attributes: &mut BTreeMap<String, String>,
) -> Cow<'a, str> {
    let mut offset = 0;
    let mut lines = source.split_inclusive('\n');
    match lines.next() {
        Some(line) if chomp(line) == "---" => offset += line.len(),
        _ => return Cow::Borrowed(source),
    }
    let fence_start = offset;
    let mut fence_end = None;
    let mut rest_start = source.len();
    for line in lines {
        if chomp(line) == "---" {
            fence_end = Some(offset);
            rest_start = offset + line.len();
            break;
        }
        offset += line.len();
    }
    let Some(fence_end) = fence_end else { return Cow::Borrowed(source) };
    let front_matter = &source[fence_start..fence_end];
    if front_matter.split_inclusive('\n').any(|line| line == "\n") {
        return Cow::Borrowed(source);
    }

    let mut rest = &source[rest_start..];
    while let Some(stripped) = rest.strip_prefix('\n') {
        rest = stripped;
    }

    if !front_matter.is_empty() {
        let Ok(serde_yaml::Value::Mapping(mapping)) = serde_yaml::from_str(front_matter) else {
            return Cow::Borrowed(source);
        };
        for (key, value) in &mapping {
            let (Some(key), Some(value)) = (key.as_str(), scalar_to_string(value)) else {
                continue;
            };
            if key == "layout" {
                if value != "default" {
                    attributes.insert("page-layout".to_string(), value);
                }
            } else {
                attributes.insert(key.to_string(), value);
            }
        }
    }
    Cow::Borrowed(rest)
}

/// Replace a Markdown TOC directive block with the AsciiDoc `toc::[]` macro,
/// setting the `toc` attribute to `macro` when one is found.
pub fn replace_toc<'a>(
    source: &'a str,
    attributes: &mut BTreeMap<String, String>,
) -> Cow<'a, str> {
    if source.contains(TOC_DIRECTIVE_TIP) {
        attributes.insert("toc".to_string(), "macro".to_string());
        Cow::Owned(TOC_DIRECTIVE.replace_all(source, "toc::[]").into_owned())
    } else {
        Cow::Borrowed(source)
    }
}

/// Trim whitespace preceding a leading XML comment, which would otherwise
/// turn the comment into a code block.
pub fn trim_before_leading_comment<'a>(
    source: &'a str,
    _attributes: &mut BTreeMap<String, String>,
) -> Cow<'a, str> {
    if source.starts_with([' ', '\t']) {
        let trimmed = source.trim_start();
        if trimmed.starts_with("<!--") {
            return Cow::Borrowed(trimmed);
        }
    }
    Cow::Borrowed(source)
}

fn chomp(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_extract_front_matter_strips_block_and_stores_entries() {
        let source = "---\ntitle: Welcome\nlayout: home\n---\n\nBody.\n";
        let mut attributes = attrs();
        let rest = extract_front_matter(source, &mut attributes);
        assert_eq!(rest, "Body.\n");
        assert_eq!(attributes.get("title").map(String::as_str), Some("Welcome"));
        assert_eq!(attributes.get("page-layout").map(String::as_str), Some("home"));
    }

    #[test]
    fn test_extract_front_matter_skips_default_layout() {
        let source = "---\nlayout: default\n---\nBody.\n";
        let mut attributes = attrs();
        let rest = extract_front_matter(source, &mut attributes);
        assert_eq!(rest, "Body.\n");
        assert!(!attributes.contains_key("page-layout"));
        assert!(!attributes.contains_key("layout"));
    }

    #[test]
    fn test_extract_front_matter_requires_closing_fence() {
        let source = "---\ntitle: Welcome\n\nBody.\n";
        let mut attributes = attrs();
        assert_eq!(extract_front_matter(source, &mut attributes), source);
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_extract_front_matter_rejects_interior_blank_line() {
        // A blank line means the opening marker was a thematic break.
        let source = "---\n\ntitle: Welcome\n---\nBody.\n";
        let mut attributes = attrs();
        assert_eq!(extract_front_matter(source, &mut attributes), source);
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_extract_front_matter_ignores_unparsable_yaml() {
        let source = "---\n- not: [a mapping\n---\nBody.\n";
        let mut attributes = attrs();
        assert_eq!(extract_front_matter(source, &mut attributes), source);
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_extract_front_matter_stringifies_scalars() {
        let source = "---\ndraft: true\nrevision: 3\n---\nBody.\n";
        let mut attributes = attrs();
        extract_front_matter(source, &mut attributes);
        assert_eq!(attributes.get("draft").map(String::as_str), Some("true"));
        assert_eq!(attributes.get("revision").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_replace_toc_swaps_directive_for_macro() {
        let source = "# Title\n\n<!-- TOC depthfrom:2 -->\n- [A](#a)\n<!-- /TOC -->\n\nBody.\n";
        let mut attributes = attrs();
        let result = replace_toc(source, &mut attributes);
        assert_eq!(result, "# Title\n\ntoc::[]\n\nBody.\n");
        assert_eq!(attributes.get("toc").map(String::as_str), Some("macro"));
    }

    #[test]
    fn test_replace_toc_leaves_source_without_directive() {
        let source = "# Title\n\nBody.\n";
        let mut attributes = attrs();
        assert!(matches!(replace_toc(source, &mut attributes), Cow::Borrowed(_)));
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_trim_before_leading_comment() {
        let mut attributes = attrs();
        assert_eq!(trim_before_leading_comment("  <!-- note -->\nBody.\n", &mut attributes), "<!-- note -->\nBody.\n");
        assert_eq!(trim_before_leading_comment("  indented code\n", &mut attributes), "  indented code\n");
    }
}
