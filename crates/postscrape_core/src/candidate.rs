use std::collections::BTreeMap;

use crate::{is_blob_url, strip_byte_range_params};

/// A URL suspected of pointing at the video resource, not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub url: String,
    /// Request headers the browser sent when it fetched this URL, if seen.
    pub observed_headers: Option<BTreeMap<String, String>>,
}

impl VideoCandidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            observed_headers: None,
        }
    }
}

/// Insertion-ordered candidate collection, deduplicated by exact URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    items: Vec<VideoCandidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL unless it is already present or a `blob:` URL.
    /// Returns true when the set grew.
    pub fn insert(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || is_blob_url(url) || self.contains(url) {
            return false;
        }
        self.items.push(VideoCandidate::new(url));
        true
    }

    /// Adds the URL and, when it differs, its byte-range-stripped form as a
    /// second related candidate. Returns how many entries were added.
    pub fn insert_with_stripped(&mut self, url: &str) -> usize {
        if is_blob_url(url) {
            return 0;
        }
        let mut added = usize::from(self.insert(url));
        let stripped = strip_byte_range_params(url.trim());
        if stripped != url.trim() {
            added += usize::from(self.insert(&stripped));
        }
        added
    }

    /// Attaches observed request headers to an existing candidate.
    /// Headers already recorded for the URL are kept.
    pub fn attach_headers(&mut self, url: &str, headers: BTreeMap<String, String>) {
        if let Some(candidate) = self.items.iter_mut().find(|c| c.url == url) {
            if candidate.observed_headers.is_none() {
                candidate.observed_headers = Some(headers);
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.items.iter().any(|c| c.url == url)
    }

    pub fn get(&self, url: &str) -> Option<&VideoCandidate> {
        self.items.iter().find(|c| c.url == url)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoCandidate> {
        self.items.iter()
    }

    pub fn urls(&self) -> Vec<String> {
        self.items.iter().map(|c| c.url.clone()).collect()
    }
}

impl IntoIterator for CandidateSet {
    type Item = VideoCandidate;
    type IntoIter = std::vec::IntoIter<VideoCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
