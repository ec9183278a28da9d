//! Postscrape core: pure URL handling, candidate scoring and the admission gate.
mod candidate;
mod gate;
mod normalize;
mod post_ref;
mod result;
mod score;

pub use candidate::{CandidateSet, VideoCandidate};
pub use gate::{AdmissionGate, AdmissionToken, Busy, GateStatus, DEFAULT_MAX_CONCURRENT};
pub use normalize::{
    is_blob_url, looks_like_video, strip_byte_range_params, to_mobile_url, ScrapeTarget,
    BYTE_RANGE_PARAMS, MOBILE_BASE_URL,
};
pub use post_ref::{parse_post_url, ParsedPostRef, UrlType};
pub use result::{
    PostContent, PostResult, ProbeResult, Resolution, ScrapeResult, SignalOutcome, SignalReport,
    SignalSource,
};
pub use score::{
    heuristic_score, order_by_score, size_bonus, CandidateScore, FAST_STREAM_FRAGMENT,
    MEDIA_CDN_DOMAIN,
};
