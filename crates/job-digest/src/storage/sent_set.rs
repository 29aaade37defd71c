//! Sent-set persistence.
//!
//! Tracks which listing ids have already gone out in a digest. The backing
//! file is plain text with one id per line.

use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::wanted::Listing;

/// Ids of listings already included in a delivered digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentSet {
    ids: BTreeSet<String>,
}

impl SentSet {
    /// Check whether an id has already been notified.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record an id as notified.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Listings not yet notified, in API order.
    ///
    /// An id repeated within `listings` is returned once.
    pub fn new_listings(&self, listings: &[Listing]) -> Vec<Listing> {
        let mut seen = HashSet::new();
        listings
            .iter()
            .filter(|listing| {
                let id = listing.id.as_str();
                !self.contains(id) && seen.insert(id)
            })
            .cloned()
            .collect()
    }

    /// Add every listing id to the set.
    pub fn mark_sent(&mut self, listings: &[Listing]) {
        for listing in listings {
            self.insert(listing.id.as_str());
        }
    }
}

impl<S: Into<String>> FromIterator<S> for SentSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Line-delimited file store for the [`SentSet`].
#[derive(Debug, Clone)]
pub struct SentSetStore {
    path: PathBuf,
}

impl SentSetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the set, returning an empty one if the file does not exist.
    pub fn load(&self) -> Result<SentSet, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No sent-set file yet");
                return Ok(SentSet::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let set: SentSet = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        tracing::debug!(path = %self.path.display(), ids = set.len(), "Loaded sent-set");
        Ok(set)
    }

    /// Replace the backing file with `set`, one id per line.
    ///
    /// The ids are written to a sibling temp file which is then renamed over
    /// the original, so a failed write leaves the previous contents intact.
    pub fn save(&self, set: &SentSet) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = self.tmp_path();
        let result = write_lines(&tmp_path, set).and_then(|()| std::fs::rename(&tmp_path, &self.path));
        if let Err(source) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_err(source));
        }

        tracing::debug!(path = %self.path.display(), ids = set.len(), "Saved sent-set");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn write_lines(path: &Path, set: &SentSet) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for id in set.iter() {
        writeln!(file, "{id}")?;
    }
    file.sync_all()
}
