//! Reference rewriting after downloads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::dom::Element;
use crate::extract::ContentBlock;
use crate::types::FileRole;
use crate::utils::resolve_url;

use super::{DownloadOutcome, FileIntent, StoredAsset};

/// A stored image as listed under `assets` in the detail JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    /// Forward-slash path of the local copy
    pub local_path: String,
    /// Local file name
    pub file_name: String,
}

/// An attachment as listed under `attachments` in the detail JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentEntry {
    /// Source URL
    pub origin_url: String,
    /// Name shown on the page
    pub origin_name: String,
    /// Local path, `null` if the download failed
    pub local_path: Option<String>,
    /// Local file name, `null` if the download failed
    pub file_name: Option<String>,
}

fn stored_images(outcomes: &[DownloadOutcome]) -> HashMap<&str, &StoredAsset> {
    outcomes
        .iter()
        .filter_map(DownloadOutcome::stored)
        .filter(|s| s.intent.role == FileRole::Image)
        .map(|s| (s.intent.url.as_str(), s))
        .collect()
}

/// Fill in `localPath`/`fileName` of image blocks whose download succeeded
///
/// Blocks of failed downloads stay untouched. Returns the number of blocks
/// populated by this call.
pub fn apply_to_blocks(blocks: &mut [ContentBlock], outcomes: &[DownloadOutcome]) -> usize {
    let stored = stored_images(outcomes);
    let mut populated = 0;
    for block in blocks.iter_mut() {
        let ContentBlock::Image(image) = block else {
            continue;
        };
        if let Some(s) = stored.get(image.url.as_str())
            && image.attach(&s.file_name, &s.local_path)
        {
            populated += 1;
        }
    }
    populated
}

/// Point every `img` under `root` with a stored copy at its local file name
pub fn rewrite_image_sources(root: &mut Element, base: Option<&Url>, outcomes: &[DownloadOutcome]) -> usize {
    let stored = stored_images(outcomes);
    let mut rewritten = 0;
    root.for_each_descendant_mut(&mut |el| {
        if !el.is("img") {
            return;
        }
        let Some(url) = el.attr("src").and_then(|src| resolve_url(base, src)) else {
            return;
        };
        if let Some(s) = stored.get(url.as_str()) {
            el.set_attr("src", s.file_name.clone());
            rewritten += 1;
        }
    });
    rewritten
}

/// Stored images in intent order
pub fn asset_entries(outcomes: &[DownloadOutcome]) -> Vec<AssetEntry> {
    outcomes
        .iter()
        .filter_map(DownloadOutcome::stored)
        .filter(|s| s.intent.role == FileRole::Image)
        .map(|s| AssetEntry {
            local_path: s.local_path.clone(),
            file_name: s.file_name.clone(),
        })
        .collect()
}

/// One entry per attachment intent, with null paths where the download failed
pub fn attachment_entries(intents: &[FileIntent], outcomes: &[DownloadOutcome]) -> Vec<AttachmentEntry> {
    let stored: HashMap<&str, &StoredAsset> = outcomes
        .iter()
        .filter_map(DownloadOutcome::stored)
        .filter(|s| s.intent.role == FileRole::Attachment)
        .map(|s| (s.intent.url.as_str(), s))
        .collect();

    intents
        .iter()
        .filter(|i| i.role == FileRole::Attachment)
        .map(|intent| {
            let stored = stored.get(intent.url.as_str());
            AttachmentEntry {
                origin_url: intent.url.clone(),
                origin_name: intent.origin_name.clone(),
                local_path: stored.map(|s| s.local_path.clone()),
                file_name: stored.map(|s| s.file_name.clone()),
            }
        })
        .collect()
}
