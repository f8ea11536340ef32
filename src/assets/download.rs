//! Concurrent asset downloads for one document.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::fetcher::Fetcher;
use crate::utils::{safe_filename, to_url_path, unique_name};

use super::{DownloadOutcome, FileIntent, StoredAsset};

/// A copy stored by an earlier run that may be kept instead of downloading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReusableAsset {
    /// File name inside the document directory
    pub file_name: String,
    /// Hex SHA-256 recorded for the file
    pub sha256: String,
}

/// What to do for one intent
enum Job {
    Reuse(StoredAsset),
    Fetch { intent: FileIntent, file_name: String },
}

/// Downloads a document's assets into its directory
///
/// Every intent gets exactly one attempt. Failures are returned as data and
/// never cancel the other downloads.
pub struct AssetDownloader<'a> {
    fetcher: &'a dyn Fetcher,
    target_dir: PathBuf,
    limit: Option<usize>,
    reusable: HashMap<String, ReusableAsset>,
}

impl<'a> AssetDownloader<'a> {
    /// Downloader writing into `target_dir`
    ///
    /// `limit` bounds in-flight downloads; `None` dispatches every intent at once.
    pub fn new(fetcher: &'a dyn Fetcher, target_dir: impl Into<PathBuf>, limit: Option<usize>) -> Self {
        Self {
            fetcher,
            target_dir: target_dir.into(),
            limit,
            reusable: HashMap::new(),
        }
    }

    /// Copies from earlier runs, keyed by source URL
    pub fn with_reusable(mut self, reusable: HashMap<String, ReusableAsset>) -> Self {
        self.reusable = reusable;
        self
    }

    /// Directory the assets are written to
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Download every intent; outcomes are returned in intent order
    pub async fn download_all(&self, intents: Vec<FileIntent>) -> Vec<DownloadOutcome> {
        if intents.is_empty() {
            return Vec::new();
        }

        let jobs = self.plan(intents).await;
        let width = self.limit.unwrap_or(jobs.len()).max(1);

        stream::iter(jobs)
            .map(|job| self.run(job))
            .buffered(width)
            .collect()
            .await
    }

    /// Decide reuse and assign collision-free file names
    ///
    /// Reused names are reserved first so new downloads never overwrite them.
    async fn plan(&self, intents: Vec<FileIntent>) -> Vec<Job> {
        let mut planned = Vec::with_capacity(intents.len());
        for intent in intents {
            let reused = match self.reusable.get(&intent.url) {
                Some(previous) => self.reuse(&intent, previous).await,
                None => None,
            };
            planned.push((intent, reused));
        }

        let mut taken: HashSet<String> = planned
            .iter()
            .filter_map(|(_, reused)| reused.as_ref().map(|r| r.file_name.clone()))
            .collect();

        planned
            .into_iter()
            .enumerate()
            .map(|(index, (intent, reused))| match reused {
                Some(stored) => Job::Reuse(stored),
                None => {
                    let name = safe_filename(&intent.origin_name, intent.role, index + 1);
                    Job::Fetch {
                        file_name: unique_name(&name, &mut taken),
                        intent,
                    }
                }
            })
            .collect()
    }

    async fn reuse(&self, intent: &FileIntent, previous: &ReusableAsset) -> Option<StoredAsset> {
        let path = self.target_dir.join(&previous.file_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(url = %intent.url, path = %path.display(), "recorded asset missing on disk, downloading again");
            return None;
        }
        Some(StoredAsset {
            intent: intent.clone(),
            file_name: previous.file_name.clone(),
            local_path: to_url_path(&path),
            sha256: previous.sha256.clone(),
            reused: true,
        })
    }

    async fn run(&self, job: Job) -> DownloadOutcome {
        let (intent, file_name) = match job {
            Job::Reuse(stored) => return DownloadOutcome::Success(stored),
            Job::Fetch { intent, file_name } => (intent, file_name),
        };

        let path = self.target_dir.join(&file_name);
        match self.fetcher.download(&intent.url, &path).await {
            Ok(file) => {
                tracing::debug!(url = %intent.url, file_name = %file_name, bytes = file.bytes, "asset stored");
                DownloadOutcome::Success(StoredAsset {
                    intent,
                    local_path: to_url_path(&path),
                    file_name,
                    sha256: file.sha256,
                    reused: false,
                })
            }
            Err(error) => DownloadOutcome::Failure { intent, error },
        }
    }
}
