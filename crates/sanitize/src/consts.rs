use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Removed together with their whole subtree before anything else happens.
selector!(NOISE_SELECTOR, "script, style, nav, footer, iframe");
selector!(TITLE_SELECTOR, "title");
selector!(BODY_SELECTOR, "body");
// Content block candidates, tried in this order.
selector!(MAIN_SELECTOR, "main");
selector!(ARTICLE_SELECTOR, "article");
selector!(CLASSED_SELECTOR, "body [class]");
regex!(CONTENT_CLASS_REGEX, r"(?i)content|main|article");

pub(crate) const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub(crate) const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// HTML elements that can never have children, serialized as `<name/>`.
pub(crate) const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];
