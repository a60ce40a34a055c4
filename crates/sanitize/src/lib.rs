//! Readability-style cleanup of raw HTML documents.
//!
//! A source `article.html` is parsed leniently, stripped of scripts, styles
//! and page furniture, reduced to its main content block and re-emitted as a
//! small well-formed XHTML document next to it as `article.xhtml`. The derived
//! file is reused for as long as it is at least as new as its source.

mod consts;
pub mod error;
mod template;
mod xhtml;

use crate::error::{ErrorKind, Result};
use ego_tree::{NodeId, NodeRef};
use exn::{OptionExt, ResultExt};
use litepub_storage::{Freshness, is_html, write_atomic};
use scraper::node::Text;
use scraper::{ElementRef, Html, Node, Selector, StrTendril};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub use crate::template::Templates;
pub use crate::xhtml::{DOCTYPE, XML_DECLARATION, to_xhtml};

/// Sanitize `source` into its sibling `.xhtml` file, unless that file is
/// already current, and return the sibling's path.
///
/// # Errors
///
/// Fails if `source` is not an `.html`/`.htm` file, cannot be read, or the
/// result cannot be written. A failed write never leaves a partial file.
#[instrument(skip_all, fields(path = %source.as_ref().display()))]
pub fn sanitize_file(source: impl AsRef<Path>) -> Result<PathBuf> {
    let source = source.as_ref();
    if !is_html(source) {
        exn::bail!(ErrorKind::Unsupported(source.to_path_buf()));
    }
    let target = source.with_extension("xhtml");
    match Freshness::check(source, &target).or_raise(|| ErrorKind::Read(source.to_path_buf()))? {
        Freshness::Current => {
            tracing::debug!(target = %target.display(), "Sanitized document is up to date");
            return Ok(target);
        },
        Freshness::SourceMissing => exn::bail!(ErrorKind::SourceMissing(source.to_path_buf())),
        Freshness::Missing | Freshness::Stale => {},
    }
    let raw = std::fs::read(source).or_raise(|| ErrorKind::Read(source.to_path_buf()))?;
    let xhtml = sanitize_html(&String::from_utf8_lossy(&raw))?;
    write_atomic(&target, xhtml.as_bytes()).or_raise(|| ErrorKind::Write(target.clone()))?;
    tracing::info!(target = %target.display(), bytes = xhtml.len(), "Regenerated sanitized document");
    Ok(target)
}

/// Clean up an HTML string and return the serialized XHTML document.
///
/// 1. `script`, `style`, `nav`, `footer` and `iframe` elements are removed
///    along with everything inside them.
/// 2. The content block is the first of: a `main` element, an `article`
///    element, an element inside `body` whose class contains `content`,
///    `main` or `article` (any case), the `body` itself.
/// 3. The block is copied into the builtin template, which keeps the original
///    `<title>` text.
///
/// # Examples
///
/// ```
/// let xhtml = litepub_sanitize::sanitize_html(
///     "<title>Hi</title><nav>menu</nav><main><p>Hello</p><script>x()</script></main>",
/// ).unwrap();
/// assert!(xhtml.contains("<title>Hi</title>"));
/// assert!(xhtml.contains("<main><p>Hello</p></main>"));
/// assert!(!xhtml.contains("menu"));
/// ```
#[instrument(level = "debug", skip(html), fields(html_size = html.len()))]
pub fn sanitize_html(html: &str) -> Result<String> {
    let mut document = Html::parse_document(html);
    let noise: Vec<NodeId> = document.root_element().select(&consts::NOISE_SELECTOR).map(|el| el.id()).collect();
    tracing::trace!(count = noise.len(), "Removing noise elements");
    detach(&mut document, noise);
    let title = self::title(&document);

    let template = Templates::load(template::DOCUMENT_TEMPLATE)?;
    let mut output = Html::parse_document(&String::from_utf8_lossy(&template));
    if let Some(title) = title.filter(|title| !title.is_empty()) {
        let title_id = output.root_element().select(&consts::TITLE_SELECTOR).next().map(|el| el.id());
        if let Some(mut node) = title_id.and_then(|id| output.tree.get_mut(id)) {
            node.append(Node::Text(Text { text: StrTendril::from_slice(&title) }));
        }
    }
    let body = output
        .root_element()
        .select(&consts::BODY_SELECTOR)
        .next()
        .ok_or_raise(|| ErrorKind::Template(template::DOCUMENT_TEMPLATE))?;
    // Whatever whitespace the template body picked up while parsing.
    let placeholder: Vec<NodeId> = body.children().map(|child| child.id()).collect();
    let body = body.id();
    detach(&mut output, placeholder);
    if let Some(content) = self::content_block(&document) {
        graft(&mut output, &content, body);
    }
    Ok(to_xhtml(&output))
}

/// Detach nodes (and their subtrees) from the document.
fn detach(document: &mut Html, nodes: Vec<NodeId>) {
    for id in nodes {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn title(document: &Html) -> Option<String> {
    first(document, &consts::TITLE_SELECTOR).map(|el| el.text().collect::<String>().trim().to_string())
}

/// First match wins, there is no scoring.
fn content_block(document: &Html) -> Option<ElementRef<'_>> {
    first(document, &consts::MAIN_SELECTOR)
        .or_else(|| first(document, &consts::ARTICLE_SELECTOR))
        .or_else(|| {
            document.root_element().select(&consts::CLASSED_SELECTOR).find(|el| {
                el.value()
                    .attr("class")
                    .is_some_and(|class| consts::CONTENT_CLASS_REGEX.is_match(class))
            })
        })
        .or_else(|| first(document, &consts::BODY_SELECTOR))
}

/// First element still attached under the document root.
///
/// `Html::select` also visits detached nodes, which stay in the arena.
fn first<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.root_element().select(selector).next()
}

/// Copy `content` (or, for the `body` element, only its children) underneath
/// `parent` in another tree.
fn graft(output: &mut Html, content: &ElementRef<'_>, parent: NodeId) {
    let mut pending: Vec<(NodeRef<'_, Node>, NodeId)> = Vec::new();
    if content.value().name() == "body" {
        pending.push((**content, parent));
    } else if let Some(mut node) = output.tree.get_mut(parent) {
        let id = node.append(Node::Element(content.value().clone())).id();
        pending.push((**content, id));
    }
    while let Some((source, target)) = pending.pop() {
        let Some(mut target) = output.tree.get_mut(target) else {
            continue;
        };
        for child in source.children() {
            let id = target.append(child.value().clone()).id();
            pending.push((child, id));
        }
    }
}
