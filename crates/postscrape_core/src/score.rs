use std::cmp::Ordering;

use crate::VideoCandidate;

/// Host suffix of the platform's media content delivery network.
pub const MEDIA_CDN_DOMAIN: &str = "fbcdn.net";
/// Host fragment of the fast video streaming edge.
pub const FAST_STREAM_FRAGMENT: &str = "video.fsci";

const MEDIA_EXTENSION_BONUS: f64 = 100.0;
const FAST_STREAM_BONUS: f64 = 50.0;
const MEDIA_CDN_BONUS: f64 = 30.0;
const VIDEO_HINT_BONUS: f64 = 20.0;
const BYTE_RANGE_PENALTY: f64 = 40.0;
const MAX_SIZE_BONUS: f64 = 50.0;
const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub candidate: VideoCandidate,
    pub score: f64,
}

/// URL-shape part of the candidate score. Case-insensitive.
///
/// | signal | delta |
/// |---|---|
/// | `.mp4` / `.m3u8` | +100 |
/// | fast streaming host fragment | +50 |
/// | media CDN host | +30 |
/// | `nc_ht=video` hint | +20 |
/// | `bytestart=` / `byteend=` | −40 |
pub fn heuristic_score(url: &str) -> f64 {
    let low = url.to_ascii_lowercase();
    let mut score = 0.0;
    if low.contains(".mp4") || low.contains(".m3u8") {
        score += MEDIA_EXTENSION_BONUS;
    }
    if low.contains(FAST_STREAM_FRAGMENT) {
        score += FAST_STREAM_BONUS;
    }
    if low.contains(MEDIA_CDN_DOMAIN) {
        score += MEDIA_CDN_BONUS;
    }
    // `_nc_ht=video` contains `nc_ht=video`.
    if low.contains("nc_ht=video") {
        score += VIDEO_HINT_BONUS;
    }
    if low.contains("bytestart=") || low.contains("byteend=") {
        score -= BYTE_RANGE_PENALTY;
    }
    score
}

/// Bonus for a declared content length: one point per MiB, capped at 50.
pub fn size_bonus(content_length: u64) -> f64 {
    (content_length as f64 / MIB).min(MAX_SIZE_BONUS)
}

/// Orders by score, then by URL length, both descending.
///
/// URL length carries no meaning; it only makes the order deterministic.
/// Entries equal on both keys keep their input order.
pub fn order_by_score(mut scores: Vec<CandidateScore>) -> Vec<CandidateScore> {
    scores.sort_by(compare_desc);
    scores
}

fn compare_desc(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.candidate.url.len().cmp(&a.candidate.url.len()))
}
