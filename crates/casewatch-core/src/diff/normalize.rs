//! Markup → visible-text normalization ahead of line diffing.
//!
//! Cosmetic structural changes (attribute shuffles, style/script payloads,
//! re-indentation) must not register as textual changes, so both sides of a
//! diff are reduced to the lines a reader would see.

use crate::errors::{ExError, ExErrorKind};
use scraper::{ElementRef, Html};

/// Elements whose text is never visible.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Elements that start a new visual line.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "tfoot", "thead", "tr",
    "ul",
];

/// Elements rendered inline but separated from their neighbours.
const CELL: &[&str] = &["td", "th"];

/// Reduce `input` to its visible, trimmed, non-blank lines.
///
/// Input without a tag, or whose tags do not parse into any element (e.g.
/// `a<b`), is split on newlines. Markup is parsed as an HTML fragment.
///
/// # Errors
///
/// Returns `ExErrorKind::MalformedSection` when the parser reported errors
/// and swallowed all visible text that a plain tag strip still finds (e.g. an
/// unterminated comment). Callers fall back to [`raw_lines`].
pub fn visible_lines(input: &str) -> Result<Vec<String>, ExError> {
    if !has_tag_open(input) {
        return Ok(raw_lines(input));
    }

    let fragment = Html::parse_fragment(input);
    let root = fragment.root_element();
    let mut lines = LineBuilder::default();
    walk(root, &mut lines);
    let lines = lines.finish();

    if lines.is_empty() && !fragment.errors.is_empty() && has_text_outside_tags(input) {
        return Err(ExError::new(ExErrorKind::MalformedSection)
            .with_op("visible_lines")
            .with_message(format!(
                "markup could not be parsed ({} parser errors)",
                fragment.errors.len()
            )));
    }

    let has_elements = root
        .descendants()
        .skip(1)
        .any(|node| node.value().is_element());
    if !has_elements {
        return Ok(raw_lines(input));
    }

    Ok(lines)
}

/// Split on newlines, trim, and drop blank lines. No markup handling.
pub fn raw_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn walk(element: ElementRef<'_>, lines: &mut LineBuilder) {
    let name = element.value().name();
    if HIDDEN.contains(&name) {
        return;
    }
    let block = BLOCK.contains(&name);
    if block {
        lines.break_line();
    }
    if CELL.contains(&name) {
        lines.push_text(" ");
    }
    let pre = name == "pre";
    if pre {
        lines.preformatted += 1;
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk(child_element, lines);
        } else if let Some(text) = child.value().as_text() {
            lines.push_text(text);
        }
    }

    if pre {
        lines.preformatted -= 1;
    }
    if block {
        lines.break_line();
    }
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<String>,
    current: String,
    /// Depth of enclosing `pre` elements; newlines there are line breaks.
    preformatted: usize,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str) {
        if self.preformatted == 0 {
            self.current.push_str(text);
            return;
        }
        let mut segments = text.split('\n');
        if let Some(first) = segments.next() {
            self.current.push_str(first);
        }
        for segment in segments {
            self.break_line();
            self.current.push_str(segment);
        }
    }

    fn break_line(&mut self) {
        let collapsed = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            self.lines.push(collapsed);
        }
        self.current.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.break_line();
        self.lines
    }
}

/// Does `<` ever open something a parser would treat as a tag, comment or
/// doctype (`<` followed by a letter, `/` or `!`)?
fn has_tag_open(input: &str) -> bool {
    input
        .as_bytes()
        .windows(2)
        .any(|w| w[0] == b'<' && (w[1].is_ascii_alphabetic() || w[1] == b'/' || w[1] == b'!'))
}

/// Naive scan: is there any non-whitespace outside `<...>` runs?
/// An unterminated `<` counts as text.
fn has_text_outside_tags(input: &str) -> bool {
    let mut rest = input;
    loop {
        match rest.find('<') {
            None => return !rest.trim().is_empty(),
            Some(open) => {
                if !rest[..open].trim().is_empty() {
                    return true;
                }
                match rest[open..].find('>') {
                    None => return !rest[open..].trim().is_empty(),
                    Some(close) => rest = &rest[open + close + 1..],
                }
            }
        }
    }
}
