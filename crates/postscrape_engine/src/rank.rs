use postscrape_core::{heuristic_score, order_by_score, size_bonus, CandidateScore, CandidateSet};
use postscrape_logging::{scrape_debug, scrape_info, short_url};

use crate::probe::{request_headers, ProbeClient, ProbeSettings};
use crate::Cookies;

#[derive(Debug, Clone, PartialEq)]
pub struct RankOutcome {
    pub best: Option<String>,
    /// False when no candidate passed validation and `best` is the top-scored
    /// fallback.
    pub validated: bool,
    /// Every candidate with its final score, best first.
    pub scores: Vec<CandidateScore>,
}

/// Picks the most plausible video URL. See [`rank_detailed`].
pub async fn rank(
    client: &dyn ProbeClient,
    settings: &ProbeSettings,
    candidates: &CandidateSet,
    referer: Option<&str>,
    cookies: &Cookies,
) -> Option<String> {
    rank_detailed(client, settings, candidates, referer, cookies)
        .await
        .best
}

/// Scores every candidate, then validates them best first.
///
/// The score is the URL-shape heuristic plus a size bonus from a HEAD probe.
/// Validation fetches the first `range_bytes` of each candidate in order and
/// accepts the first one that returns, or declares, more than
/// `min_validated_bytes`. A failing probe only skips its candidate. When
/// nothing validates the top-scored candidate is returned unvalidated.
pub async fn rank_detailed(
    client: &dyn ProbeClient,
    settings: &ProbeSettings,
    candidates: &CandidateSet,
    referer: Option<&str>,
    cookies: &Cookies,
) -> RankOutcome {
    if candidates.is_empty() {
        return RankOutcome {
            best: None,
            validated: false,
            scores: Vec::new(),
        };
    }

    let headers = request_headers(settings, referer, cookies, None);

    let mut scores = Vec::with_capacity(candidates.len());
    for candidate in candidates.iter() {
        let mut score = heuristic_score(&candidate.url);
        match client
            .head(&candidate.url, &headers, settings.size_probe_timeout)
            .await
        {
            Ok(response) => {
                if let Some(length) = response.content_length {
                    score += size_bonus(length);
                }
            }
            Err(err) => {
                scrape_debug!("size probe failed for {}: {}", short_url(&candidate.url), err);
            }
        }
        scores.push(CandidateScore {
            candidate: candidate.clone(),
            score,
        });
    }

    let scores = order_by_score(scores);

    let mut accepted = None;
    for (idx, entry) in scores.iter().enumerate() {
        let url = &entry.candidate.url;
        let response = match client
            .get_range(url, &headers, settings.range_bytes, settings.validation_timeout)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                scrape_debug!("validation skipped {}: {}", short_url(url), err);
                continue;
            }
        };

        let declared = response.declared_length().unwrap_or(0);
        if response.body_len > settings.min_validated_bytes
            || declared > settings.min_validated_bytes
        {
            scrape_info!(
                "validated {} (score {:.1}, {} bytes read, {} declared)",
                short_url(url),
                entry.score,
                response.body_len,
                declared
            );
            accepted = Some(idx);
            break;
        }
        scrape_debug!(
            "rejected {}: {} bytes read, {} declared",
            short_url(url),
            response.body_len,
            declared
        );
    }

    let validated = accepted.is_some();
    let best = scores
        .get(accepted.unwrap_or(0))
        .map(|entry| entry.candidate.url.clone());
    RankOutcome {
        best,
        validated,
        scores,
    }
}
