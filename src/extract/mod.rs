//! DOM-to-content-model transformation.
//!
//! - [`blocks`] - Flat block extraction for board documents
//! - [`sections`] - Heading-indexed sectioning for guide pages
//! - [`lists`] - Recursive `ul`/`ol` flattening
//! - [`tables`] - Table rows and header/row splitting
//! - [`model`] - Content model types and their JSON shape

pub mod blocks;
pub mod lists;
pub mod model;
pub mod sections;
pub mod tables;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use blocks::{BlockExtractor, extract_blocks};
pub use lists::parse_list;
pub use model::{ContentBlock, ImageBlock, IndexedMap, Section, SectionChild, TableData};
pub use sections::parse_sections;
pub use tables::{parse_table, table_rows};
