//! Custom assertions for materialized documents

use std::path::Path;
use campus_materializer::{ContentBlock, DocumentDetail};

/// Short name of a block's kind, for order assertions
pub fn block_kind(block: &ContentBlock) -> &'static str {
    match block {
        ContentBlock::Text(_) => "text",
        ContentBlock::Newline => "newline",
        ContentBlock::Table(_) => "table",
        ContentBlock::Image(_) => "image",
    }
}

/// Kinds of every block of a detail, in order
pub fn block_kinds(detail: &DocumentDetail) -> Vec<&'static str> {
    detail.content.iter().map(block_kind).collect()
}

/// Assert every populated image block points at a file that exists and
/// every unpopulated one has both fields null
pub fn assert_images_consistent(detail: &DocumentDetail) {
    for image in detail.content.iter().filter_map(ContentBlock::as_image) {
        match (&image.local_path, &image.file_name) {
            (Some(local_path), Some(file_name)) => {
                assert!(
                    Path::new(local_path).exists(),
                    "image {} points at missing file {}",
                    image.url,
                    local_path
                );
                assert!(local_path.ends_with(file_name.as_str()));
            }
            (None, None) => {}
            other => panic!("image {} is half populated: {:?}", image.url, other),
        }
    }
}

/// Recursively count files in a directory
pub fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| {
                    let path = e.path();
                    if path.is_dir() { count_files(&path) } else { 1 }
                })
                .sum()
        })
        .unwrap_or(0)
}
