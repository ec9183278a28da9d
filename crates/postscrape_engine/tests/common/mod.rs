#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use postscrape_engine::{
    BrowserError, BrowserSession, Cookies, NetworkEvent, ProbeClient, ProbeError, ProbeResponse,
    RequestHeaders, ResolverSettings, SessionFactory, PLAY_SCRIPT, RESOURCE_TIMING_SCRIPT,
};

/// Scripted browser session. Every call is recorded by name.
#[derive(Default)]
pub struct FakeSession {
    pub markup: String,
    pub timing: Vec<String>,
    pub network: Mutex<Vec<NetworkEvent>>,
    pub cookies: Cookies,
    pub fail_navigation: bool,
    pub fail_scripts: bool,
    pub navigation_delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

impl FakeSession {
    pub fn with_markup(markup: &str) -> Self {
        Self {
            markup: markup.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait::async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.record(format!("navigate {url}"));
        if let Some(delay) = self.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_navigation {
            return Err(BrowserError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        Ok(())
    }

    async fn current_document(&self) -> Result<String, BrowserError> {
        self.record("document");
        Ok(self.markup.clone())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        if self.fail_scripts {
            self.record("script failed");
            return Err(BrowserError::Script("Execution context was destroyed".to_string()));
        }
        if script == PLAY_SCRIPT {
            self.record("play");
            return Ok(serde_json::Value::Bool(true));
        }
        if script == RESOURCE_TIMING_SCRIPT {
            self.record("resource timing");
            return Ok(serde_json::json!(self.timing));
        }
        self.record("script");
        Ok(serde_json::Value::Null)
    }

    async fn network_event_log(&self) -> Result<Vec<NetworkEvent>, BrowserError> {
        self.record("network log");
        Ok(std::mem::take(&mut *self.network.lock().unwrap()))
    }

    async fn cookies(&self) -> Result<Cookies, BrowserError> {
        self.record("cookies");
        Ok(self.cookies.clone())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out pre-built sessions and counts how many were requested.
pub struct FakeFactory {
    pub session: Arc<FakeSession>,
    pub created: AtomicUsize,
    pub fail: bool,
    pub launch_delay: Option<Duration>,
}

impl FakeFactory {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session: Arc::new(session),
            created: AtomicUsize::new(0),
            fail: false,
            launch_delay: None,
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionFactory for FakeFactory {
    async fn create(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.launch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(BrowserError::Launch("no chrome binary".to_string()));
        }
        Ok(self.session.clone())
    }
}

/// Probe client answering from a table of `url -> (status, size)`.
/// Unknown URLs fail with a network error.
#[derive(Default)]
pub struct FakeProbe {
    pub resources: BTreeMap<String, (u16, u64)>,
    pub requests: Mutex<Vec<(String, RequestHeaders)>>,
}

impl FakeProbe {
    pub fn serving(resources: &[(&str, u16, u64)]) -> Self {
        Self {
            resources: resources
                .iter()
                .map(|(url, status, size)| (url.to_string(), (*status, *size)))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn lookup(&self, url: &str, headers: &RequestHeaders) -> Result<(u16, u64), ProbeError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));
        self.resources
            .get(url)
            .copied()
            .ok_or_else(|| ProbeError::Network(format!("connection refused: {url}")))
    }
}

#[async_trait::async_trait]
impl ProbeClient for FakeProbe {
    async fn head(
        &self,
        url: &str,
        headers: &RequestHeaders,
        _timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError> {
        let (status, size) = self.lookup(url, headers)?;
        Ok(ProbeResponse {
            status,
            content_type: Some("video/mp4".to_string()),
            content_length: Some(size),
            ..ProbeResponse::default()
        })
    }

    async fn get_range(
        &self,
        url: &str,
        headers: &RequestHeaders,
        range_bytes: u64,
        _timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError> {
        let (status, size) = self.lookup(url, headers)?;
        let served = size.min(range_bytes + 1);
        let status = if status == 200 { 206 } else { status };
        Ok(ProbeResponse {
            status,
            content_type: Some("video/mp4".to_string()),
            content_length: Some(served),
            total_length: None,
            body_len: served,
        })
    }
}

pub fn instant_settings() -> ResolverSettings {
    ResolverSettings {
        navigation_settle: Duration::ZERO,
        playback_settle: Duration::ZERO,
        deadline: Duration::from_secs(5),
    }
}
