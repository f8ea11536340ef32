//! Block extraction for board-style documents.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::dom::{Element, Node, fragment_text};
use crate::text::{builtin_regex, clean_paragraph, collapse_whitespace};
use crate::utils::resolve_url;

use super::model::{ContentBlock, ImageBlock};
use super::tables::table_rows;

/// Elements whose inner HTML is split into paragraphs
const TEXT_CONTAINERS: &[&str] = &["p", "div", "dd", "span", "section"];

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| builtin_regex(r"(?i)<br\s*/?>"));
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| builtin_regex(r"\n{2,}"));

/// Walks content roots and classifies their children into blocks
///
/// Keeps a running image counter so synthetic names stay unique across every
/// root extracted with the same extractor.
pub struct BlockExtractor<'a> {
    base: Option<&'a Url>,
    images: usize,
}

impl<'a> BlockExtractor<'a> {
    /// Extractor resolving relative image sources against `base`
    pub fn new(base: Option<&'a Url>) -> Self {
        Self { base, images: 0 }
    }

    /// Blocks for the direct children of `root`, in document order
    pub fn extract(&mut self, root: &Element) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        for child in &root.children {
            match child {
                Node::Element(el) if el.is("table") => blocks.push(ContentBlock::Table(table_rows(el))),
                Node::Element(el) if el.is("img") => {
                    if let Some(image) = self.image(el) {
                        blocks.push(ContentBlock::Image(image));
                    }
                }
                Node::Element(el) if TEXT_CONTAINERS.contains(&el.tag.as_str()) => {
                    self.container(el, &mut blocks)
                }
                Node::Element(_) => {}
                Node::Text(t) => {
                    let cleaned = clean_paragraph(t);
                    if !cleaned.is_empty() {
                        blocks.push(ContentBlock::Text(cleaned));
                    }
                }
            }
        }
        blocks
    }

    /// Blocks for a whole document root
    ///
    /// When the root holds `scope_tag` elements (the board's `dd` body cells),
    /// each of them is extracted in turn; otherwise the root itself is.
    pub fn extract_scoped(&mut self, root: &Element, scope_tag: Option<&str>) -> Vec<ContentBlock> {
        let scopes = scope_tag.map(|tag| root.find_all(tag)).unwrap_or_default();
        if scopes.is_empty() {
            return self.extract(root);
        }
        scopes.into_iter().flat_map(|scope| self.extract(scope)).collect()
    }

    fn image(&mut self, img: &Element) -> Option<ImageBlock> {
        let url = resolve_url(self.base, img.attr("src")?)?;
        self.images += 1;

        let alt = non_blank(img.attr("alt"));
        let title = non_blank(img.attr("title"));
        Some(ImageBlock {
            url,
            alt: alt.or(title).unwrap_or_default().to_string(),
            origin_name: title
                .or(alt)
                .map(str::to_string)
                .unwrap_or_else(|| format!("image{}.jpg", self.images)),
            local_path: None,
            file_name: None,
        })
    }

    fn container(&mut self, el: &Element, blocks: &mut Vec<ContentBlock>) {
        let html = el.without_tags(&["table", "img"]).inner_html();
        let html = LINE_BREAK.replace_all(&html, "\n");

        let mut first = true;
        for paragraph in PARAGRAPH_BREAK.split(&html) {
            let cleaned = clean_paragraph(&fragment_text(&paragraph));
            if cleaned.is_empty() {
                continue;
            }
            if !first {
                blocks.push(ContentBlock::Newline);
            }
            first = false;
            blocks.push(ContentBlock::Text(cleaned));
        }

        self.nested(el, blocks);
    }

    /// Images and tables inside a container, after its text
    fn nested(&mut self, el: &Element, blocks: &mut Vec<ContentBlock>) {
        for child in el.child_elements() {
            if child.is("img") {
                if let Some(image) = self.image(child) {
                    blocks.push(ContentBlock::Image(image));
                }
            } else if child.is("table") {
                blocks.push(ContentBlock::Table(table_rows(child)));
            } else {
                self.nested(child, blocks);
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !collapse_whitespace(v).is_empty())
}

/// Blocks for the direct children of `root`
pub fn extract_blocks(root: &Element, base: Option<&Url>) -> Vec<ContentBlock> {
    BlockExtractor::new(base).extract(root)
}
