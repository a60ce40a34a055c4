//! Well-formed XHTML serialization of a parsed HTML tree.
//!
//! The HTML parser accepts tag soup and builds a tree that may contain things
//! XML cannot express: comments with `--`, attribute names such as `x"y` or
//! `foo:bar` without a declared prefix, characters outside the XML character
//! range. The serializer drops whatever cannot be represented and otherwise
//! writes the tree verbatim, so the output always parses as XML.

use crate::consts::{VOID_ELEMENTS, XHTML_NAMESPACE, XML_NAMESPACE, XMLNS_NAMESPACE};
use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{Html, Node};
use std::borrow::Cow;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const DOCTYPE: &str = "<!DOCTYPE html>";

/// Serialize a whole document, including the XML declaration and doctype.
pub fn to_xhtml(document: &Html) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    out.push_str(DOCTYPE);
    out.push('\n');
    for child in document.tree.root().children() {
        write_node(&mut out, child, "");
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

enum Step<'a> {
    Open(NodeRef<'a, Node>, &'a str),
    Close(&'a str),
}

/// Iterative walk; deeply nested tag soup must not overflow the stack.
fn write_node<'a>(out: &mut String, node: NodeRef<'a, Node>, namespace: &'a str) {
    let mut stack = vec![Step::Open(node, namespace)];
    while let Some(step) = stack.pop() {
        let (node, inherited) = match step {
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                continue;
            },
            Step::Open(node, inherited) => (node, inherited),
        };
        match node.value() {
            Node::Text(text) => out.push_str(&html_escape::encode_text(&xml_chars(text))),
            Node::Element(element) if !is_xml_name(element.name()) => {
                // Unrepresentable tag: keep its content, lose the wrapper.
                stack.extend(node.children().rev().map(|child| Step::Open(child, inherited)));
            },
            Node::Element(element) => {
                write_start_tag(out, element, inherited);
                if is_void(element) {
                    out.push_str("/>");
                    continue;
                }
                out.push('>');
                let namespace: &str = &element.name.ns;
                stack.push(Step::Close(element.name()));
                stack.extend(node.children().rev().map(|child| Step::Open(child, namespace)));
            },
            Node::Document | Node::Fragment => {
                stack.extend(node.children().rev().map(|child| Step::Open(child, inherited)));
            },
            // Doctype is written once up front; comments and processing
            // instructions carry nothing a reader needs.
            Node::Doctype(_) | Node::Comment(_) | Node::ProcessingInstruction(_) => {},
        }
    }
}

fn write_start_tag(out: &mut String, element: &Element, inherited: &str) {
    let name = element.name();
    out.push('<');
    out.push_str(name);
    let namespace: &str = &element.name.ns;
    if namespace != inherited && !namespace.is_empty() {
        push_attr(out, "xmlns", namespace);
    }
    let mut declared: Vec<&str> = Vec::new();
    for (attr, value) in element.attrs.iter() {
        let local: &str = &attr.local;
        let attr_ns: &str = &attr.ns;
        if attr_ns == XMLNS_NAMESPACE || (attr_ns.is_empty() && local == "xmlns") {
            continue;
        }
        if !is_xml_name(local) {
            continue;
        }
        match attr.prefix.as_deref() {
            None => push_attr(out, local, value),
            Some(prefix) if attr_ns == XML_NAMESPACE => push_attr(out, &format!("{prefix}:{local}"), value),
            Some(prefix) if is_xml_name(prefix) => {
                if !declared.contains(&prefix) {
                    push_attr(out, &format!("xmlns:{prefix}"), attr_ns);
                    declared.push(prefix);
                }
                push_attr(out, &format!("{prefix}:{local}"), value);
            },
            Some(_) => {},
        }
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(&xml_chars(value)));
    out.push('"');
}

fn is_void(element: &Element) -> bool {
    &*element.name.ns == XHTML_NAMESPACE && VOID_ELEMENTS.contains(&element.name())
}

/// Strip characters outside the XML 1.0 `Char` production.
fn xml_chars(text: &str) -> Cow<'_, str> {
    match text.chars().all(is_xml_char) {
        true => Cow::Borrowed(text),
        false => Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// XML `NCName` check: a name without colons, so it never needs a prefix.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start = |c: char| c.is_ascii_alphabetic() || c == '_' || (!c.is_ascii() && is_xml_char(c));
    start(first) && chars.all(|c| start(c) || c.is_ascii_digit() || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn body(html: &str) -> String {
        let xhtml = to_xhtml(&Html::parse_document(html));
        let start = xhtml.find("<body>").map(|i| i + "<body>".len()).unwrap();
        let end = xhtml.rfind("</body>").unwrap();
        xhtml[start..end].to_string()
    }

    #[test]
    fn test_document_prologue() {
        let xhtml = to_xhtml(&Html::parse_document("<!doctype html><title>T</title><p>x</p>"));
        assert!(xhtml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n"));
        assert!(xhtml.contains(r#"<html xmlns="http://www.w3.org/1999/xhtml">"#));
        assert_eq!(xhtml.matches("<!DOCTYPE").count(), 1);
        assert_eq!(xhtml.matches("xmlns=").count(), 1);
    }

    #[rstest]
    #[case("<p>a<br>b</p>", "<p>a<br/>b</p>")]
    #[case(r#"<img src="a.png" alt="x">"#, r#"<img alt="x" src="a.png"/>"#)]
    #[case("<p>1 &lt; 2 &amp; 3 &gt; 2</p>", "<p>1 &lt; 2 &amp; 3 &gt; 2</p>")]
    #[case(r#"<a href="?a=1&amp;b=&quot;2&quot;">x</a>"#, r#"<a href="?a=1&amp;b=&quot;2&quot;">x</a>"#)]
    #[case("<p>a<!-- gone -->b</p>", "<p>ab</p>")]
    #[case("<div></div>", "<div></div>")]
    #[case("<p>a\u{1}b\u{FFFF}c</p>", "<p>abc</p>")]
    #[case(r#"<p foo:bar="1" data-ok="2">x</p>"#, r#"<p data-ok="2">x</p>"#)]
    #[case(r#"<p lang="en" xml:lang="en">x</p>"#, r#"<p lang="en">x</p>"#)]
    fn test_body_serialization(#[case] html: &str, #[case] expected: &str) {
        assert_eq!(body(html), expected);
    }

    #[test]
    fn test_foreign_namespaces() {
        let out = body(r##"<svg><use xlink:href="#a"></use></svg><p>x</p>"##);
        assert_eq!(
            out,
            r##"<svg xmlns="http://www.w3.org/2000/svg"><use xmlns:xlink="http://www.w3.org/1999/xlink" xlink:href="#a"></use></svg><p>x</p>"##
        );
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let html = "<div>".repeat(5_000);
        let xhtml = to_xhtml(&Html::parse_document(&html));
        assert!(xhtml.ends_with("</html>\n"));
    }

    #[rstest]
    #[case("p", true)]
    #[case("data-x", true)]
    #[case("_a.b", true)]
    #[case("ü", true)]
    #[case("1a", false)]
    #[case("-a", false)]
    #[case("a:b", false)]
    #[case("a\"b", false)]
    #[case("", false)]
    fn test_xml_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_xml_name(name), valid);
    }
}
