use std::sync::Arc;
use std::time::Duration;

use postscrape_core::{
    is_blob_url, CandidateSet, ScrapeResult, ScrapeTarget, SignalOutcome, SignalReport,
    SignalSource,
};
use postscrape_logging::{scrape_debug, scrape_info, scrape_warn, short_url};

use crate::browser::BrowserSession;
use crate::extract::{default_strategies, extract_with, PageDocument, VideoUrlStrategy};
use crate::probe::{probe, ProbeClient, ProbeSettings};
use crate::rank::rank_detailed;
use crate::signals::{gather_network_log, gather_resource_timing, PLAY_SCRIPT};
use crate::{Cookies, ResolveError};

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Wait after navigation before reading the page.
    pub navigation_settle: Duration,
    /// Wait after triggering playback before reading resource timings.
    pub playback_settle: Duration,
    /// Upper bound on one whole resolution.
    pub deadline: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            navigation_settle: Duration::from_secs(3),
            playback_settle: Duration::from_secs(3),
            deadline: Duration::from_secs(90),
        }
    }
}

/// Turns a post URL into a validated, directly fetchable video URL.
pub struct VideoResolver {
    strategies: Vec<Box<dyn VideoUrlStrategy>>,
    probe_client: Arc<dyn ProbeClient>,
    probe_settings: ProbeSettings,
    settings: ResolverSettings,
}

impl VideoResolver {
    pub fn new(
        probe_client: Arc<dyn ProbeClient>,
        probe_settings: ProbeSettings,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            strategies: default_strategies(),
            probe_client,
            probe_settings,
            settings,
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn VideoUrlStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves `post_url`. Every failure ends up in the returned result.
    pub async fn resolve(&self, session: &dyn BrowserSession, post_url: &str) -> ScrapeResult {
        let target = ScrapeTarget::new(post_url);
        match self.run(session, &target).await {
            Ok(result) => result,
            Err(err) => {
                scrape_warn!("resolution of {} failed: {}", short_url(&target.url), err);
                ScrapeResult::failed(&target, err.to_string())
            }
        }
    }

    /// Resolves `target` within the configured deadline.
    ///
    /// Only navigation failures and the deadline are errors; every other
    /// browser or probe failure skips the step it happened in.
    pub async fn run(
        &self,
        session: &dyn BrowserSession,
        target: &ScrapeTarget,
    ) -> Result<ScrapeResult, ResolveError> {
        let deadline = self.settings.deadline;
        tokio::time::timeout(deadline, self.steps(session, target))
            .await
            .map_err(|_| ResolveError::DeadlineExceeded(deadline))?
    }

    async fn steps(
        &self,
        session: &dyn BrowserSession,
        target: &ScrapeTarget,
    ) -> Result<ScrapeResult, ResolveError> {
        scrape_info!("resolving video for {}", short_url(&target.mobile_url));
        session
            .navigate(&target.mobile_url)
            .await
            .map_err(ResolveError::Navigation)?;
        tokio::time::sleep(self.settings.navigation_settle).await;

        let mut signals = Vec::new();
        let mut candidates = CandidateSet::new();

        let primary = match session.current_document().await {
            Ok(markup) => {
                let found = extract_with(&self.strategies, &PageDocument::parse(markup))
                    .filter(|url| !is_blob_url(url));
                let outcome = match &found {
                    Some(url) if candidates.insert(url) => SignalOutcome::Found(1),
                    _ => SignalOutcome::Empty,
                };
                signals.push(SignalReport::new(SignalSource::PrimaryExtraction, outcome));
                found
            }
            Err(err) => {
                signals.push(SignalReport::new(
                    SignalSource::PrimaryExtraction,
                    SignalOutcome::Skipped(err.to_string()),
                ));
                None
            }
        };

        let played = match session.execute_script(PLAY_SCRIPT).await {
            Ok(_) => SignalOutcome::Empty,
            Err(err) => SignalOutcome::Skipped(err.to_string()),
        };
        signals.push(SignalReport::new(SignalSource::PlaybackTrigger, played));
        tokio::time::sleep(self.settings.playback_settle).await;

        let timing = match session.resource_timing_entries().await {
            Ok(entries) => gather_resource_timing(&entries, &mut candidates),
            Err(err) => SignalOutcome::Skipped(err.to_string()),
        };
        signals.push(SignalReport::new(SignalSource::ResourceTiming, timing));

        if primary.is_none() {
            let network = match session.network_event_log().await {
                Ok(events) => gather_network_log(&events, &mut candidates),
                Err(err) => SignalOutcome::Skipped(err.to_string()),
            };
            signals.push(SignalReport::new(SignalSource::NetworkLog, network));
        }

        if candidates.is_empty() {
            scrape_info!("no video candidates on {}", short_url(&target.mobile_url));
            return Ok(ScrapeResult::not_found(target).with_signals(signals));
        }
        scrape_debug!("{} candidates gathered", candidates.len());

        let cookies = match session.cookies().await {
            Ok(cookies) => {
                let outcome = if cookies.is_empty() {
                    SignalOutcome::Empty
                } else {
                    SignalOutcome::Found(cookies.len())
                };
                signals.push(SignalReport::new(SignalSource::Cookies, outcome));
                cookies
            }
            Err(err) => {
                signals.push(SignalReport::new(
                    SignalSource::Cookies,
                    SignalOutcome::Skipped(err.to_string()),
                ));
                Cookies::new()
            }
        };

        let client = self.probe_client.as_ref();
        let ranked = rank_detailed(
            client,
            &self.probe_settings,
            &candidates,
            Some(&target.url),
            &cookies,
        )
        .await;
        let Some(best) = ranked.best else {
            return Ok(ScrapeResult::not_found(target).with_signals(signals));
        };

        let observed = candidates
            .get(&best)
            .and_then(|candidate| candidate.observed_headers.as_ref());
        let first = probe(
            client,
            &self.probe_settings,
            &best,
            Some(&target.url),
            &cookies,
            observed,
        )
        .await;
        let mobile = if first.ok {
            None
        } else {
            Some(
                probe(
                    client,
                    &self.probe_settings,
                    &best,
                    Some(&target.mobile_url),
                    &cookies,
                    observed,
                )
                .await,
            )
        };

        if ranked.validated {
            scrape_info!("resolved {}", short_url(&best));
        } else {
            scrape_warn!(
                "no candidate validated for {}; returning best guess {}",
                short_url(&target.url),
                short_url(&best)
            );
        }
        Ok(
            ScrapeResult::resolved(target, best, ranked.validated, Some(first), mobile)
                .with_signals(signals),
        )
    }
}
