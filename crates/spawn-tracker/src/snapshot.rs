//! Diagnostic snapshot of the last rendered page.
//!
//! Block structure is re-serialized one element per line with two-space
//! indentation so a failed extraction can be inspected by eye. Elements that
//! carry text are kept on a single line exactly as parsed, so replaying a
//! snapshot extracts the same value as the live page. Nothing reads it back
//! except an explicit `--replay`.

use std::fmt::Write as _;
use std::path::Path;

use scraper::{ElementRef, Html, Node};

use crate::error::TrackerResult;

const INDENT: &str = "  ";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content is emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Phrasing elements, always written on one line so their text survives
/// re-parsing unchanged.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "i", "kbd", "label",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Pretty-print `html`.
pub fn prettify(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() + html.len() / 4);

    for child in document.tree.root().children() {
        if let Some(element) = ElementRef::wrap(child) {
            write_element(&mut out, element, 0);
            continue;
        }
        match child.value() {
            Node::Doctype(doctype) => {
                let _ = writeln!(out, "<!DOCTYPE {}>", doctype.name());
            }
            Node::Comment(comment) => {
                let _ = writeln!(out, "<!--{}-->", &**comment);
            }
            _ => {}
        }
    }

    out
}

/// Overwrite `path` with the prettified `html`.
pub fn write_snapshot(path: &Path, html: &str) -> TrackerResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, prettify(html))?;
    Ok(())
}

fn write_element(out: &mut String, element: ElementRef<'_>, depth: usize) {
    let name = element.value().name();
    let pad = INDENT.repeat(depth);

    if !VOID_ELEMENTS.contains(&name) && keeps_inline(element) {
        out.push_str(&pad);
        write_inline(out, element);
        out.push('\n');
        return;
    }

    out.push_str(&pad);
    write_open_tag(out, element);
    out.push('\n');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    // Only whitespace text and element children reach here.
    let inner_pad = INDENT.repeat(depth + 1);
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            write_element(out, child_element, depth + 1);
        } else if let Node::Comment(comment) = child.value() {
            let _ = writeln!(out, "{inner_pad}<!--{}-->", &**comment);
        }
    }

    let _ = writeln!(out, "{pad}</{name}>");
}

/// Whether `element` carries text that must not be split across lines.
fn keeps_inline(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    if INLINE_ELEMENTS.contains(&name) || RAW_TEXT_ELEMENTS.contains(&name) {
        return true;
    }

    let mut has_element_child = false;
    for child in element.children() {
        match child.value() {
            Node::Element(_) => has_element_child = true,
            Node::Text(text) if !text.trim().is_empty() => return true,
            _ => {}
        }
    }
    !has_element_child
}

/// Serialize `element` and its subtree verbatim, without added whitespace.
fn write_inline(out: &mut String, element: ElementRef<'_>) {
    let name = element.value().name();
    write_open_tag(out, element);
    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&name);
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            write_inline(out, child_element);
            continue;
        }
        match child.value() {
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Comment(comment) => {
                let _ = write!(out, "<!--{}-->", &**comment);
            }
            _ => {}
        }
    }

    let _ = write!(out, "</{name}>");
}

fn write_open_tag(out: &mut String, element: ElementRef<'_>) {
    let _ = write!(out, "<{}", element.value().name());
    for (key, value) in element.value().attrs() {
        let _ = write!(out, " {key}=\"{}\"", escape_attr(value));
    }
    out.push('>');
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prettify_indents_nested_elements() {
        let pretty = prettify(
            r#"<!DOCTYPE html><html><head></head><body><div class="online-spawn"><span class="ml-1">12</span></div></body></html>"#,
        );
        let lines: Vec<&str> = pretty.lines().collect();

        assert_eq!(lines[0], "<!DOCTYPE html>");
        assert!(lines.contains(&"  <head></head>"));
        assert!(lines.contains(&"    <div class=\"online-spawn\">"));
        assert!(lines.contains(&"      <span class=\"ml-1\">12</span>"));
        assert!(lines.contains(&"    </div>"));
    }

    #[test]
    fn test_prettify_keeps_text_split_by_comments_inline() {
        let pretty = prettify(
            r#"<div class="online-spawn"><span class="ml-1">1<!-- -->234</span></div>"#,
        );
        assert!(pretty.contains("<span class=\"ml-1\">1<!-- -->234</span>"));
    }

    #[test]
    fn test_prettify_keeps_mixed_content_on_one_line() {
        let pretty = prettify("<html><body><p>Players: <b>12</b> online</p></body></html>");
        assert!(pretty.contains("    <p>Players: <b>12</b> online</p>\n"));
    }

    #[test]
    fn test_prettify_void_elements_have_no_closing_tag() {
        let pretty = prettify(r#"<html><body><img src="a.png"><br></body></html>"#);
        assert!(pretty.contains("<img src=\"a.png\">"));
        assert!(!pretty.contains("</img>"));
        assert!(!pretty.contains("</br>"));
    }

    #[test]
    fn test_prettify_escapes_text_but_not_scripts() {
        let pretty = prettify(
            "<html><head><script>if (a < b) { go(); }</script></head><body><p>a &lt; b</p></body></html>",
        );
        assert!(pretty.contains("if (a < b) { go(); }"));
        assert!(pretty.contains("a &lt; b"));
    }

    #[test]
    fn test_prettified_markup_still_extracts() {
        let html = r#"<div class="x online-spawn y"><span class="a ml-1 b">1234</span></div>"#;
        let pretty = prettify(html);
        let value =
            crate::extract::extract_metric(&pretty, &crate::config::Markers::default()).unwrap();
        assert_eq!(value, Some(1234));
    }

    #[test]
    fn test_replayed_snapshot_extracts_same_value_as_live_markup() {
        let markers = crate::config::Markers::default();
        let pages = [
            r#"<div class="x online-spawn y"><span class="a ml-1 b">1234</span></div>"#,
            r#"<div class="online-spawn"><span class="ml-1">1<!-- -->234</span></div>"#,
            r#"<div class="online-spawn"><span class="ml-1"><!-- -->87<!-- --></span></div>"#,
            r#"<div class="online-spawn"><span class="ml-1"><b>1</b>,<b>234</b></span></div>"#,
            r#"<div class="online-spawn"><i></i> <span class="ml-1"> 42 </span></div>"#,
            r#"<div class="online-spawn"><span class="ml-1">1 2</span></div>"#,
            r#"<div class="online-spawn"><span class="mr-1">5</span></div>"#,
        ];

        for page in pages {
            let live = crate::extract::extract_metric(page, &markers).ok();
            let replay = crate::extract::extract_metric(&prettify(page), &markers).ok();
            assert_eq!(live, replay, "replay diverged for {page}");
            assert_eq!(
                crate::extract::locate_metric_text(page, &markers),
                crate::extract::locate_metric_text(&prettify(page), &markers),
                "text diverged for {page}"
            );
        }
    }

    #[test]
    fn test_write_snapshot_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("debug").join("render.html");

        write_snapshot(&path, "<p>first</p>").unwrap();
        write_snapshot(&path, "<p>second</p>").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("second"));
        assert!(!contents.contains("first"));
    }
}
