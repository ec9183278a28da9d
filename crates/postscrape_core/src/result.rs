use serde::{Deserialize, Serialize};

use crate::{ParsedPostRef, ScrapeTarget};

/// Outcome of one network probe against a candidate URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProbeResult {
    pub ok: bool,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub used_referer: Option<String>,
    pub error: Option<String>,
}

/// Terminal state of one video resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// A candidate passed the ranged-fetch validation.
    Resolved,
    /// No candidate validated; the best-scored one is returned anyway.
    Unvalidated,
    NotFound,
    Failed,
}

impl Resolution {
    pub fn is_success(self) -> bool {
        matches!(self, Resolution::Resolved | Resolution::Unvalidated)
    }
}

/// Where a batch of candidates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    PrimaryExtraction,
    PlaybackTrigger,
    ResourceTiming,
    NetworkLog,
    Cookies,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The signal ran and contributed this many new candidates.
    Found(usize),
    /// The signal ran and contributed nothing.
    Empty,
    /// The signal could not be read; the reason is kept for diagnostics.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalReport {
    pub source: SignalSource,
    pub outcome: SignalOutcome,
}

impl SignalReport {
    pub fn new(source: SignalSource, outcome: SignalOutcome) -> Self {
        Self { source, outcome }
    }
}

/// Result of a video resolution as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub url: String,
    pub mobile_url: String,
    pub video_url: Option<String>,
    pub probe: Option<ProbeResult>,
    pub probe_mobile: Option<ProbeResult>,
    pub error: Option<String>,
    pub resolution: Resolution,
    /// Which signals were consulted and what each yielded.
    #[serde(skip)]
    pub signals: Vec<SignalReport>,
}

impl ScrapeResult {
    pub fn resolved(
        target: &ScrapeTarget,
        video_url: String,
        validated: bool,
        probe: Option<ProbeResult>,
        probe_mobile: Option<ProbeResult>,
    ) -> Self {
        let resolution = if validated {
            Resolution::Resolved
        } else {
            Resolution::Unvalidated
        };
        Self {
            success: true,
            url: target.url.clone(),
            mobile_url: target.mobile_url.clone(),
            video_url: Some(video_url),
            probe,
            probe_mobile,
            error: None,
            resolution,
            signals: Vec::new(),
        }
    }

    pub fn not_found(target: &ScrapeTarget) -> Self {
        Self {
            success: false,
            url: target.url.clone(),
            mobile_url: target.mobile_url.clone(),
            video_url: None,
            probe: None,
            probe_mobile: None,
            error: Some("video not found".to_string()),
            resolution: Resolution::NotFound,
            signals: Vec::new(),
        }
    }

    pub fn failed(target: &ScrapeTarget, message: impl Into<String>) -> Self {
        Self {
            success: false,
            url: target.url.clone(),
            mobile_url: target.mobile_url.clone(),
            video_url: None,
            probe: None,
            probe_mobile: None,
            error: Some(message.into()),
            resolution: Resolution::Failed,
            signals: Vec::new(),
        }
    }

    pub fn with_signals(mut self, signals: Vec<SignalReport>) -> Self {
        self.signals = signals;
        self
    }

    /// True when the named signal was consulted, whatever it yielded.
    pub fn tried(&self, source: SignalSource) -> bool {
        self.signals.iter().any(|report| report.source == source)
    }
}

/// Text and images of one post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostContent {
    pub text: String,
    pub images: Vec<String>,
    pub total_images: usize,
    pub page_name: Option<String>,
    pub post_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResult {
    pub success: bool,
    pub url: String,
    pub mobile_url: String,
    pub parsed: ParsedPostRef,
    pub post: Option<PostContent>,
    pub error: Option<String>,
}

impl PostResult {
    pub fn found(target: &ScrapeTarget, parsed: ParsedPostRef, post: PostContent) -> Self {
        Self {
            success: true,
            url: target.url.clone(),
            mobile_url: target.mobile_url.clone(),
            parsed,
            post: Some(post),
            error: None,
        }
    }

    pub fn failed(target: &ScrapeTarget, parsed: ParsedPostRef, message: impl Into<String>) -> Self {
        Self {
            success: false,
            url: target.url.clone(),
            mobile_url: target.mobile_url.clone(),
            parsed,
            post: None,
            error: Some(message.into()),
        }
    }
}
