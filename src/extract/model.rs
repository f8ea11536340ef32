//! Content model produced by the extractors.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One classified unit of extracted content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A paragraph of text
    Text(String),
    /// Separator between paragraphs of the same container
    Newline,
    /// Table rows, ragged rows kept as-is
    Table(Vec<Vec<String>>),
    /// Image reference
    Image(ImageBlock),
}

impl ContentBlock {
    /// The image payload, if this is an image block
    pub fn as_image(&self) -> Option<&ImageBlock> {
        match self {
            ContentBlock::Image(img) => Some(img),
            _ => None,
        }
    }
}

/// Image reference within the content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    /// Absolute source URL
    pub url: String,
    /// Alternative text (`alt`, else `title`)
    pub alt: String,
    /// Name suggested by the page (`title`, else `alt`, else `image{N}.jpg`)
    pub origin_name: String,
    /// Local path once downloaded
    pub local_path: Option<String>,
    /// Local file name once downloaded
    pub file_name: Option<String>,
}

impl ImageBlock {
    /// Record the local copy; a populated block is never changed again
    ///
    /// Returns false if the block was already populated.
    pub fn attach(&mut self, file_name: &str, local_path: &str) -> bool {
        if self.local_path.is_some() || self.file_name.is_some() {
            return false;
        }
        self.file_name = Some(file_name.to_string());
        self.local_path = Some(local_path.to_string());
        true
    }

    /// True once the image has a local copy
    pub fn is_materialized(&self) -> bool {
        self.local_path.is_some() && self.file_name.is_some()
    }
}

/// Dense 1-based ordered map, serialized as `{"1": .., "2": ..}`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedMap<T>(Vec<T>);

impl<T> Default for IndexedMap<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> IndexedMap<T> {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append under the next index
    pub fn push(&mut self, value: T) {
        self.0.push(value);
    }

    /// Append every value of `other`, renumbering densely
    pub fn extend(&mut self, other: IndexedMap<T>) {
        self.0.extend(other.0);
    }

    /// Value at a 1-based index
    pub fn get(&self, index: usize) -> Option<&T> {
        index.checked_sub(1).and_then(|i| self.0.get(i))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in index order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> IntoIterator for IndexedMap<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> FromIterator<T> for IndexedMap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for IndexedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, value) in self.0.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), value)?;
        }
        map.end()
    }
}

/// Heading-scoped subtree
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Heading (or list/table label) text
    pub text: String,
    /// Owned content in document order
    pub children: IndexedMap<SectionChild>,
}

impl Section {
    /// Section with no children
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: IndexedMap::new(),
        }
    }
}

/// Child of a section: plain text or a nested node
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionChild {
    /// Text, list item or flattened table row
    Leaf(String),
    /// Item with a nested list
    Node(Section),
}

impl SectionChild {
    /// Text of the leaf or node
    pub fn text(&self) -> &str {
        match self {
            SectionChild::Leaf(t) => t,
            SectionChild::Node(s) => &s.text,
        }
    }
}

/// Table split into header and data rows
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableData {
    /// Header cells
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Each row (headers first) joined with `" | "`
    pub fn flatten(&self) -> Vec<String> {
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .filter(|row| !row.is_empty())
            .map(|row| row.join(" | "))
            .collect()
    }
}
