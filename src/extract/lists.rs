//! Nested list parsing.

use crate::dom::{Element, Node};
use crate::text::{ExcludeTerms, normalize_item};

use super::model::{IndexedMap, Section, SectionChild};

/// Text of an `li` without its nested lists
fn direct_text(item: &Element) -> String {
    let mut out = String::new();
    for child in &item.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) if el.is_list() => {}
            Node::Element(el) => out.push_str(&el.text()),
        }
    }
    out
}

/// Convert a `ul`/`ol` into an index-keyed tree, one level per nesting
///
/// Items whose direct text matches an exclusion term are skipped together with
/// their nested lists. Items with neither text nor nested items are dropped.
pub fn parse_list(list: &Element, exclude: &ExcludeTerms) -> IndexedMap<SectionChild> {
    let mut out = IndexedMap::new();
    for item in list.child_elements().filter(|e| e.is("li")) {
        let text = normalize_item(&direct_text(item));
        if exclude.matches(&text) {
            continue;
        }

        let mut children = IndexedMap::new();
        let mut has_nested = false;
        for nested in item.child_elements().filter(|e| e.is_list()) {
            has_nested = true;
            children.extend(parse_list(nested, exclude));
        }

        if has_nested {
            out.push(SectionChild::Node(Section { text, children }));
        } else if !text.is_empty() {
            out.push(SectionChild::Leaf(text));
        }
    }
    out
}
