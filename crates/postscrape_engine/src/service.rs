use std::sync::Arc;

use postscrape_core::{
    parse_post_url, AdmissionGate, Busy, GateStatus, PostResult, ScrapeResult, ScrapeTarget,
    DEFAULT_MAX_CONCURRENT,
};
use postscrape_logging::{scrape_info, scrape_warn, short_url};

use crate::browser::{BrowserSession, BrowserSettings, ChromiumSessionFactory, SessionFactory};
use crate::post::{extract_post_content, load_post_markup, PostSettings};
use crate::probe::{ProbeClient, ProbeSettings, ReqwestProbeClient};
use crate::resolve::{ResolverSettings, VideoResolver};
use crate::session::SessionManager;
use crate::{ProbeError, ResolveError};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Admission limit. Values above one are only safe when every admitted
    /// request gets its own browser session, which this service does not do.
    pub max_concurrent: usize,
    pub browser: BrowserSettings,
    pub probe: ProbeSettings,
    pub resolver: ResolverSettings,
    pub post: PostSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            browser: BrowserSettings::default(),
            probe: ProbeSettings::default(),
            resolver: ResolverSettings::default(),
            post: PostSettings::default(),
        }
    }
}

/// Entry point for scrape requests: admission, then the shared session.
///
/// Nothing reaches the browser session without holding an admission token.
pub struct ScrapeService {
    gate: AdmissionGate,
    sessions: SessionManager,
    resolver: VideoResolver,
    post_settings: PostSettings,
}

impl ScrapeService {
    pub fn new(
        settings: ServiceSettings,
        factory: Arc<dyn SessionFactory>,
        probe_client: Arc<dyn ProbeClient>,
    ) -> Self {
        Self {
            gate: AdmissionGate::new(settings.max_concurrent),
            sessions: SessionManager::new(factory),
            resolver: VideoResolver::new(probe_client, settings.probe, settings.resolver),
            post_settings: settings.post,
        }
    }

    /// Service backed by a local Chrome and a reqwest probe client.
    pub fn with_chromium(settings: ServiceSettings) -> Result<Self, ProbeError> {
        let probe_client = Arc::new(ReqwestProbeClient::new(&settings.probe)?);
        let factory = Arc::new(ChromiumSessionFactory::new(settings.browser.clone()));
        Ok(Self::new(settings, factory, probe_client))
    }

    /// Finds the video of one post.
    ///
    /// Fails only with [`Busy`]; everything else is reported in the result.
    /// A failed resolution discards the browser session.
    pub async fn resolve_video(&self, url: &str) -> Result<ScrapeResult, Busy> {
        let _token = self.gate.admit()?;
        let target = ScrapeTarget::new(url);

        let session = match self.acquire_session().await {
            Ok(session) => session,
            Err(reason) => return Ok(ScrapeResult::failed(&target, reason)),
        };

        match self.resolver.run(session.as_ref(), &target).await {
            Ok(result) => Ok(result),
            Err(err) => {
                scrape_warn!("resolution of {} failed: {}", short_url(&target.url), err);
                self.sessions.invalidate().await;
                Ok(ScrapeResult::failed(&target, err.to_string()))
            }
        }
    }

    /// Reads the text and images of one post.
    pub async fn scrape_post(&self, url: &str) -> Result<PostResult, Busy> {
        let _token = self.gate.admit()?;
        let target = ScrapeTarget::new(url);
        let parsed = parse_post_url(url);

        let session = match self.acquire_session().await {
            Ok(session) => session,
            Err(reason) => return Ok(PostResult::failed(&target, parsed, reason)),
        };

        match load_post_markup(session.as_ref(), &target.mobile_url, &self.post_settings).await {
            Ok(markup) => {
                let post = extract_post_content(&markup, &parsed);
                scrape_info!(
                    "found {} images on {}",
                    post.total_images,
                    short_url(&target.url)
                );
                Ok(PostResult::found(&target, parsed, post))
            }
            Err(err) => {
                scrape_warn!("post scrape of {} failed: {}", short_url(&target.url), err);
                self.sessions.invalidate().await;
                Ok(PostResult::failed(&target, parsed, err.to_string()))
            }
        }
    }

    /// Gets the shared session, launching it within the resolution deadline.
    async fn acquire_session(&self) -> Result<Arc<dyn BrowserSession>, String> {
        let deadline = self.resolver.settings().deadline;
        let reason = match tokio::time::timeout(deadline, self.sessions.session()).await {
            Ok(Ok(session)) => return Ok(session),
            Ok(Err(err)) => err.to_string(),
            Err(_) => ResolveError::DeadlineExceeded(deadline).to_string(),
        };
        scrape_warn!("browser session unavailable: {}", reason);
        Err(reason)
    }

    pub fn status(&self) -> GateStatus {
        self.gate.status()
    }

    pub fn session_active(&self) -> bool {
        self.sessions.is_active()
    }

    /// Drops the browser session so the next request launches a fresh one.
    /// Refused with [`Busy`] while a request holds the session.
    pub async fn reset_session(&self) -> Result<(), Busy> {
        let _token = self.gate.admit()?;
        self.sessions.invalidate().await;
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.sessions.shutdown().await;
    }
}
