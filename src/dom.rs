//! Explicit immutable document tree.
//!
//! Pages are parsed with `scraper`, then the selected subtree is copied into
//! plain [`Node`]/[`Element`] values. Extractors pattern-match on these instead
//! of issuing string queries, and the tree is `Send` so it can cross await points.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is emitted unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A node of the document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Element with tag, attributes and children
    Element(Element),
    /// Character data, entities already decoded
    Text(String),
}

impl Node {
    /// Concatenated text of this node
    pub fn text(&self) -> String {
        match self {
            Node::Element(el) => el.text(),
            Node::Text(t) => t.clone(),
        }
    }

    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }
}

/// An element of the document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes
    pub fn new(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children,
        }
    }

    /// Copy a parsed element, dropping subtrees that match any `strip` selector
    pub fn from_element_ref(el: ElementRef<'_>, strip: &[Selector]) -> Self {
        let mut children = Vec::new();
        for child in el.children() {
            match child.value() {
                scraper::Node::Text(text) => {
                    let content: &str = text;
                    children.push(Node::Text(content.to_string()));
                }
                scraper::Node::Element(_) => {
                    if let Some(child_ref) = ElementRef::wrap(child) {
                        if strip.iter().any(|s| s.matches(&child_ref)) {
                            continue;
                        }
                        children.push(Node::Element(Self::from_element_ref(child_ref, strip)));
                    }
                }
                _ => {}
            }
        }

        Self {
            tag: el.value().name().to_ascii_lowercase(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    /// True if this element has the given tag
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Heading level for `h1`..`h6`
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// True for `ul`/`ol`
    pub fn is_list(&self) -> bool {
        self.is("ul") || self.is("ol")
    }

    /// Attribute value, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Direct element children
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.push_text(out),
            }
        }
    }

    /// All descendant elements in document order, excluding `self`
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.push_descendants(&mut out);
        out
    }

    fn push_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            out.push(child);
            child.push_descendants(out);
        }
    }

    /// Descendant elements with the given tag, in document order
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|el| el.is(tag))
            .collect()
    }

    /// True if any descendant has the given tag
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.child_elements()
            .any(|el| el.is(tag) || el.contains_tag(tag))
    }

    /// Copy of this element with every descendant of the given tags removed
    pub fn without_tags(&self, tags: &[&str]) -> Element {
        Element {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: self
                .children
                .iter()
                .filter_map(|child| match child {
                    Node::Element(el) if tags.contains(&el.tag.as_str()) => None,
                    Node::Element(el) => Some(Node::Element(el.without_tags(tags))),
                    Node::Text(t) => Some(Node::Text(t.clone())),
                })
                .collect(),
        }
    }

    /// Visit every descendant element mutably, in document order
    pub fn for_each_descendant_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        for child in &mut self.children {
            if let Node::Element(el) = child {
                f(el);
                el.for_each_descendant_mut(f);
            }
        }
    }

    /// Serialized children
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            write_node(child, raw, &mut out);
        }
        out
    }

    /// Serialized element including its own tags
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(t) if raw_text => out.push_str(t),
        Node::Text(t) => escape_text(t, out),
        Node::Element(el) => write_element(el, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }
    out.push_str(&el.inner_html());
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// Parse a CSS selector, reporting failures as configuration errors
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Config {
        message: format!("invalid selector '{}': {}", selector, e),
        key: Some(selector.to_string()),
    })
}

/// Parse a list of CSS selectors
pub fn parse_selectors(selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| parse_selector(s)).collect()
}

/// Text content of an HTML fragment with tags removed and entities decoded
pub fn fragment_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect()
}

/// Every element of `document` matching `selector`, copied into the tree model
pub fn select_all(document: &Html, selector: &Selector, strip: &[Selector]) -> Vec<Element> {
    document
        .select(selector)
        .map(|el| Element::from_element_ref(el, strip))
        .collect()
}

/// A content root and the selector that produced it
#[derive(Clone, Debug)]
pub struct ContentRoot {
    /// The root element with strip selectors applied
    pub element: Element,
    /// Selector of the chain that matched
    pub selector: String,
    /// Position of that selector in the chain
    pub position: usize,
}

/// Locate the content root through a selector fallback chain
///
/// Every selector but the last must match an element with non-blank text to be
/// accepted; the last one is accepted whenever it matches. Returns `None` when
/// the chain is exhausted.
pub fn locate_content_root(
    document: &Html,
    selectors: &[String],
    strip: &[Selector],
) -> Result<Option<ContentRoot>> {
    let last = selectors.len().saturating_sub(1);
    for (position, raw) in selectors.iter().enumerate() {
        let selector = parse_selector(raw)?;
        let Some(found) = document.select(&selector).next() else {
            continue;
        };
        let element = Element::from_element_ref(found, strip);
        let has_text = !crate::text::collapse_whitespace(&element.text()).is_empty();
        if has_text || position == last {
            return Ok(Some(ContentRoot {
                element,
                selector: raw.clone(),
                position,
            }));
        }
    }
    Ok(None)
}
