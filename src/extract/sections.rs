//! Heading-driven sectioning for guide pages.

use crate::dom::{Element, Node};
use crate::text::{ExcludeTerms, collapse_whitespace, normalize_item};

use super::lists::parse_list;
use super::model::{IndexedMap, Section, SectionChild};
use super::tables::parse_table;

/// Label of a fallback section built from a bare table
pub const TABLE_LABEL: &str = "표";

/// A heading together with the sibling slice it lives in
struct HeadingSpan<'a> {
    level: u8,
    text: String,
    siblings: &'a [Node],
    index: usize,
}

fn collect_headings<'a>(parent: &'a Element, out: &mut Vec<HeadingSpan<'a>>) {
    for (index, child) in parent.children.iter().enumerate() {
        let Node::Element(el) = child else { continue };
        if let Some(level) = el.heading_level() {
            let text = collapse_whitespace(&el.text());
            if !text.is_empty() {
                out.push(HeadingSpan {
                    level,
                    text,
                    siblings: &parent.children,
                    index,
                });
            }
        }
        collect_headings(el, out);
    }
}

/// Build the heading-indexed section map of `root`
///
/// Each heading owns the following sibling elements up to the next heading of
/// the same or a shallower level. An excluded heading drops its whole span,
/// including when it sits inside the span of a kept heading. Table rows are
/// excluded as whole flattened rows. Without any heading, every direct child of
/// `root` becomes its own top-level section.
pub fn parse_sections(root: &Element, exclude: &ExcludeTerms) -> IndexedMap<Section> {
    let mut headings = Vec::new();
    collect_headings(root, &mut headings);

    if headings.is_empty() {
        return parse_flat(root, exclude);
    }

    let mut sections = IndexedMap::new();
    // Level of an excluded heading whose sub-headings are being skipped
    let mut skipping_below: Option<u8> = None;

    for heading in &headings {
        if let Some(level) = skipping_below {
            if heading.level > level {
                continue;
            }
            skipping_below = None;
        }
        if exclude.matches(&heading.text) {
            skipping_below = Some(heading.level);
            continue;
        }

        let mut children = IndexedMap::new();
        // Level of an excluded sub-heading whose span is being dropped
        let mut dropping_below: Option<u8> = None;
        for sibling in heading.siblings[heading.index + 1..]
            .iter()
            .filter_map(Node::as_element)
        {
            let level = sibling.heading_level();
            if level.is_some_and(|l| l <= heading.level) {
                break;
            }
            if let Some(dropped) = dropping_below {
                if level.is_none_or(|l| l > dropped) {
                    continue;
                }
                dropping_below = None;
            }
            if let Some(l) = level
                && exclude.matches(&collapse_whitespace(&sibling.text()))
            {
                dropping_below = Some(l);
                continue;
            }
            append_span_element(sibling, exclude, &mut children);
        }

        sections.push(Section {
            text: heading.text.clone(),
            children,
        });
    }
    sections
}

fn append_span_element(el: &Element, exclude: &ExcludeTerms, out: &mut IndexedMap<SectionChild>) {
    let text = collapse_whitespace(&el.text());
    if text.is_empty() {
        return;
    }

    if el.is_list() {
        for child in parse_list(el, exclude) {
            if !exclude.matches(child.text()) {
                out.push(child);
            }
        }
    } else if el.is("table") {
        for row in parse_table(el).flatten() {
            if !exclude.matches(&row) {
                out.push(SectionChild::Leaf(row));
            }
        }
    } else if !exclude.matches(&text) {
        let cleaned = normalize_item(&text);
        if !cleaned.is_empty() {
            out.push(SectionChild::Leaf(cleaned));
        }
    }
}

fn list_label(list: &Element) -> String {
    format!("목록 ({})", list.tag.to_ascii_uppercase())
}

fn parse_flat(root: &Element, exclude: &ExcludeTerms) -> IndexedMap<Section> {
    let mut sections = IndexedMap::new();
    for child in &root.children {
        match child {
            Node::Text(t) => {
                let cleaned = normalize_item(t);
                if !cleaned.is_empty() && !exclude.matches(&cleaned) {
                    sections.push(Section::leaf(cleaned));
                }
            }
            Node::Element(el) => {
                let text = collapse_whitespace(&el.text());
                if text.is_empty() {
                    continue;
                }
                if el.is_list() {
                    let children = parse_list(el, exclude);
                    if !children.is_empty() {
                        sections.push(Section {
                            text: list_label(el),
                            children,
                        });
                    }
                } else if el.is("table") {
                    let children: IndexedMap<SectionChild> = parse_table(el)
                        .flatten()
                        .into_iter()
                        .filter(|row| !exclude.matches(row))
                        .map(SectionChild::Leaf)
                        .collect();
                    if !children.is_empty() {
                        sections.push(Section {
                            text: TABLE_LABEL.to_string(),
                            children,
                        });
                    }
                } else if !exclude.matches(&text) {
                    let cleaned = normalize_item(&text);
                    if !cleaned.is_empty() {
                        sections.push(Section::leaf(cleaned));
                    }
                }
            }
        }
    }
    sections
}
