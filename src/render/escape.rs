// Context-sensitive escaping for AsciiDoc serialization.
//
// Literal text runs must not accidentally trigger AsciiDoc's built-in text
// replacements (arrows, ellipses, attribute references, bare URLs), so a
// single shared routine inserts backslashes or substitutes markup
// equivalents. The lookup tables for admonition labels, entities, smart
// quotes, and typographic symbols live here as well.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::tree::{SmartQuoteKind, TypographicSymbolKind};

/// Plain admonition markers as they appear at the start of a paragraph.
pub(crate) const ADMON_MARKERS: [&str; 7] =
    ["Note: ", "Tip: ", "Caution: ", "Warning: ", "Important: ", "Attention: ", "Hint: "];

/// Admonition labels recognized inside emphasis/strong markers.
pub(crate) const ADMON_LABELS: [&str; 7] =
    ["Note", "Tip", "Caution", "Warning", "Important", "Attention", "Hint"];

/// AsciiDoc admonition markers, used to pass a blockquote through untouched.
pub(crate) const ADMON_MARKERS_ASCIIDOC: [&str; 5] =
    ["NOTE: ", "TIP: ", "CAUTION: ", "WARNING: ", "IMPORTANT: "];

/// Definition-list term markers by nesting depth.
pub(crate) const DLIST_MARKERS: [&str; 4] = ["::", ";;", ":::", "::::"];

/// Map a source admonition label to the AsciiDoc admonition type.
pub(crate) fn admonition_type(label: &str) -> Option<&'static str> {
    match label {
        "Note" => Some("NOTE"),
        "Tip" => Some("TIP"),
        "Caution" => Some("CAUTION"),
        "Warning" => Some("WARNING"),
        "Important" => Some("IMPORTANT"),
        // No dedicated AsciiDoc types; remap to the closest.
        "Attention" => Some("IMPORTANT"),
        "Hint" => Some("TIP"),
        _ => None,
    }
}

/// Map a formatted admonition marker (label with trailing colon) to its label.
pub(crate) fn formatted_admonition_label(marker: &str) -> Option<&'static str> {
    let stripped = marker.strip_suffix(':')?;
    ADMON_LABELS.iter().find(|l| **l == stripped).copied()
}

/// Resolve a character entity to literal text, or fall back to the original
/// source text for entities AsciiDoc renders fine as-is.
pub(crate) fn resolve_entity(code_point: u32, original: &str) -> String {
    match code_point {
        38 => "&".to_string(),
        60 => "<".to_string(),
        62 => ">".to_string(),
        124 => "|".to_string(),
        _ => original.to_string(),
    }
}

/// Smart quotes are reversed to plain quotes on the way out.
pub(crate) fn smart_quote_markup(kind: SmartQuoteKind) -> &'static str {
    match kind {
        SmartQuoteKind::Ldquo | SmartQuoteKind::Rdquo => "\"",
        SmartQuoteKind::Lsquo | SmartQuoteKind::Rsquo => "'",
    }
}

pub(crate) fn typographic_symbol_markup(kind: TypographicSymbolKind) -> &'static str {
    match kind {
        // Both dashes down-convert to the en-dash form.
        TypographicSymbolKind::Mdash | TypographicSymbolKind::Ndash => "--",
        TypographicSymbolKind::Hellip => "...",
        TypographicSymbolKind::Laquo => "<<",
        TypographicSymbolKind::Raquo => ">>",
        TypographicSymbolKind::LaquoSpace => "<< ",
        TypographicSymbolKind::RaquoSpace => " >>",
    }
}

// ---------------------------------------------------------------------------
// Regexes
// ---------------------------------------------------------------------------

/// Character sequences AsciiDoc would replace if left unescaped in running
/// text: arrows, ellipses, and `{word}`-shaped attribute references.
pub(crate) static INADVERTENT_REPLACEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-=]>|<[-=]|\.\.\.|\{\w[\w-]*\}").unwrap());

/// Superset used to decide whether a codespan needs a passthrough: adds
/// dash pairs, doubled asterisks, entities, bare URL schemes, and (C)/(R)/(TM).
pub(crate) static REPLACEABLE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-=]>|<[-=]| -- |\w--\w|\*\*|\.\.\.|&\S+;|\{\w[\w-]*\}|(?:https?|ftp)://\w|\((?:C|R|TM)\)")
        .unwrap()
});

/// Bare URL scheme at the start of a link-looking run.
pub(crate) static URI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?|ftp)://\w").unwrap());

/// A smart apostrophe between word characters.
static SMART_APOSTROPHE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b’\b").unwrap());

/// Typographic characters normalized to AsciiDoc markup equivalents.
static TYPOGRAPHIC_SYMBOL: LazyLock<Regex> = LazyLock::new(|| Regex::new("[“”‘’—–…]").unwrap());

/// Menu reference inside strong text (`File > Save As`).
pub(crate) static MENU_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w&].*?)\s>\s([\w&].*(?:\s>\s|$))+").unwrap());

/// A sentence boundary followed by inline spacing; used by ventilate mode.
pub(crate) static FULL_STOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S\.|.\?|.!)[ \t]+").unwrap());

/// The `!`-prefix convention for editorial comment lines.
pub(crate) static COMMENT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ *! ?").unwrap());

/// Delimiter between CSS property declarations.
pub(crate) static CSS_PROP_DELIM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*;\s*").unwrap());

/// The interior of an XML comment.
pub(crate) static XML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A<!--(.*)-->\z").unwrap());

/// A line that would read as an AsciiDoc list marker if emitted verbatim.
pub(crate) static LIST_MARKER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[*.\-]+|\d+\.)\s").unwrap());

// ---------------------------------------------------------------------------
// Text escaping
// ---------------------------------------------------------------------------

/// Whether a codespan's content would trigger AsciiDoc text replacements.
pub(crate) fn replaceable(text: &str) -> bool {
    REPLACEABLE_TEXT.is_match(text) || (text != "^" && text.contains('^'))
}

/// Escape a literal text run so AsciiDoc reproduces it verbatim.
///
/// Inserts a backslash ahead of replacement-triggering sequences, converts
/// carets to `{caret}` (a lone `^` is left alone), optionally escapes bare
/// URL schemes when auto-links are disabled, and normalizes non-ASCII
/// typography to markup equivalents.
pub(crate) fn escape_replacements(text: &str, auto_links: bool) -> String {
    let mut text = Cow::Borrowed(text);
    if INADVERTENT_REPLACEMENTS.is_match(&text) {
        text = Cow::Owned(INADVERTENT_REPLACEMENTS.replace_all(&text, r"\$0").into_owned());
    }
    if !auto_links && text.contains("://") {
        text = Cow::Owned(URI_SCHEME.replace_all(&text, r"\$0").into_owned());
    }
    if text.contains('^') && text.as_ref() != "^" {
        text = Cow::Owned(text.replace('^', "{caret}"));
    }
    if !text.is_ascii() {
        if SMART_APOSTROPHE.is_match(&text) {
            text = Cow::Owned(SMART_APOSTROPHE.replace_all(&text, "'").into_owned());
        }
        if TYPOGRAPHIC_SYMBOL.is_match(&text) {
            let replaced = TYPOGRAPHIC_SYMBOL.replace_all(&text, |caps: &regex::Captures| {
                match &caps[0] {
                    "“" => "\"`",
                    "”" => "`\"",
                    "‘" => "'`",
                    "’" => "`'",
                    "—" | "–" => "--",
                    "…" => "...",
                    other => other,
                }
                .to_string()
            });
            text = Cow::Owned(replaced.into_owned());
        }
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escapes_arrow_replacement() {
        assert_eq!(escape_replacements("See -> here", true), "See \\-> here");
    }

    #[test]
    fn test_escapes_attribute_reference() {
        assert_eq!(escape_replacements("set {name} first", true), "set \\{name} first");
    }

    #[test]
    fn test_escapes_ellipsis() {
        assert_eq!(escape_replacements("wait...", true), "wait\\...");
    }

    #[test]
    fn test_lone_caret_untouched() {
        assert_eq!(escape_replacements("^", true), "^");
    }

    #[test]
    fn test_caret_run_becomes_attribute() {
        assert_eq!(escape_replacements("a^b", true), "a{caret}b");
    }

    #[test]
    fn test_bare_url_escaped_when_auto_links_disabled() {
        assert_eq!(
            escape_replacements("go to https://example.com now", false),
            "go to \\https://example.com now"
        );
        assert_eq!(
            escape_replacements("go to https://example.com now", true),
            "go to https://example.com now"
        );
    }

    #[test]
    fn test_typographic_normalization() {
        assert_eq!(escape_replacements("it’s “fine” — right…", true), "it's \"`fine`\" -- right...");
    }

    #[test]
    fn test_replaceable_detection() {
        assert!(replaceable("x -> y"));
        assert!(replaceable("a**b"));
        assert!(replaceable("&copy;"));
        assert!(replaceable("x^2"));
        assert!(!replaceable("^"));
        assert!(!replaceable("plain text"));
    }

    #[test]
    fn test_admonition_maps() {
        assert_eq!(admonition_type("Attention"), Some("IMPORTANT"));
        assert_eq!(admonition_type("Hint"), Some("TIP"));
        assert_eq!(formatted_admonition_label("Note:"), Some("Note"));
        assert_eq!(formatted_admonition_label("Note"), None);
    }

    #[test]
    fn test_menu_ref_captures() {
        let caps = MENU_REF.captures("View > Zoom > Reset").unwrap();
        assert_eq!(&caps[1], "View");
        assert_eq!(&caps[2], "Zoom > Reset");
    }
}
