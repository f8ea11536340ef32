//! Utility functions for file names, paths and URLs

use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::LazyLock;
use url::Url;

use crate::text::{builtin_regex, collapse_whitespace};
use crate::types::FileRole;

/// Maximum number of rename attempts when resolving file name collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Longest suffix still treated as a file extension
const MAX_EXTENSION_LEN: usize = 5;

static PATH_HOSTILE: LazyLock<Regex> = LazyLock::new(|| builtin_regex(r#"[\\/:*?"<>|]+"#));

/// Resolve a possibly relative `src`/`href` against the page URL
///
/// Returns `None` for blank references. Without a base, an absolute URL is
/// normalized and anything else is returned as written.
///
/// # Examples
///
/// ```
/// use campus_materializer::utils::resolve_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.ac.kr/Home/view.mbz").unwrap();
/// assert_eq!(
///     resolve_url(Some(&base), "/upload/a.jpg").as_deref(),
///     Some("https://www.example.ac.kr/upload/a.jpg")
/// );
/// assert_eq!(resolve_url(Some(&base), "   "), None);
/// ```
pub fn resolve_url(base: Option<&Url>, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    match base {
        Some(base) => match base.join(src) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::debug!(src, error = %e, "could not resolve reference, keeping it as written");
                Some(src.to_string())
            }
        },
        None => Some(
            Url::parse(src)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| src.to_string()),
        ),
    }
}

/// Last path segment of a URL, without query or fragment
#[must_use]
pub fn url_basename(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extension of `name` including the dot, if it looks like one
fn extension_of(name: &str) -> Option<&str> {
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    let looks_like_extension = dot > 0
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    looks_like_extension.then_some(&name[dot..])
}

/// Sanitize an origin name into a local file name
///
/// Runs of path-hostile characters (`\ / : * ? " < > |`) become `_`. A name
/// without an extension gets the role's fallback extension, and a blank name
/// becomes `file_{ordinal}` with that extension.
///
/// # Examples
///
/// ```
/// use campus_materializer::utils::safe_filename;
/// use campus_materializer::types::FileRole;
///
/// assert_eq!(safe_filename("a/b:c.png", FileRole::Image, 1), "a_b_c.png");
/// assert_eq!(safe_filename("신청서", FileRole::Attachment, 2), "신청서.pdf");
/// assert_eq!(safe_filename("  ", FileRole::Image, 3), "file_3.jpg");
/// ```
#[must_use]
pub fn safe_filename(origin: &str, role: FileRole, ordinal: usize) -> String {
    let cleaned = collapse_whitespace(origin);
    let replaced = PATH_HOSTILE.replace_all(&cleaned, "_");
    // Leading dots would make hidden files or parent references
    let name = replaced.trim().trim_start_matches('.').trim();

    if name.is_empty() || name.chars().all(|c| c == '_') {
        return format!("file_{}{}", ordinal, role.fallback_extension());
    }
    match extension_of(name) {
        Some(_) => name.to_string(),
        None => format!("{}{}", name, role.fallback_extension()),
    }
}

/// Make `name` unique within `taken`, renaming collisions to `stem (n).ext`
///
/// The chosen name is inserted into `taken`.
pub fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match extension_of(name) {
        Some(ext) => (&name[..name.len() - ext.len()], ext),
        None => (name, ""),
    };

    // Try adding (1), (2), (3), ... until we find a free name
    for i in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = format!("{} ({}){}", stem, i, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
    }

    // Every numbered name is taken; fall back to something that cannot collide
    let candidate = format!("{} ({}){}", stem, taken.len() + 1, ext);
    taken.insert(candidate.clone());
    candidate
}

/// Path rendered with forward slashes, as stored in JSON and asset records
#[must_use]
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir => Some(String::new()),
            Component::Prefix(p) => Some(p.as_os_str().to_string_lossy().into_owned()),
            Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
