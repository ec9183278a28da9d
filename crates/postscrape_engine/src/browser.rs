use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::Page;
use futures_util::StreamExt;
use postscrape_logging::{scrape_debug, scrape_info, scrape_warn, short_url};
use tokio::task::JoinHandle;

use crate::signals::{string_entries, RESOURCE_TIMING_SCRIPT};
use crate::{BrowserError, Cookies, NetworkEvent};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Chrome/Chromium binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub no_sandbox: bool,
    pub extra_args: Vec<String>,
    /// Per-command timeout on the devtools connection.
    pub request_timeout: Duration,
    pub navigation_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_size: (412, 915),
            no_sandbox: true,
            extra_args: Vec::new(),
            request_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(45),
        }
    }
}

/// A live, stateful browser session.
///
/// Navigation replaces the page; the network log only covers traffic since the
/// last navigation.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Serialized markup of the current page.
    async fn current_document(&self) -> Result<String, BrowserError>;

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    async fn resource_timing_entries(&self) -> Result<Vec<String>, BrowserError> {
        let value = self.execute_script(RESOURCE_TIMING_SCRIPT).await?;
        Ok(string_entries(&value))
    }

    /// Takes every network event captured since the last drain or navigation.
    async fn network_event_log(&self) -> Result<Vec<NetworkEvent>, BrowserError>;

    async fn cookies(&self) -> Result<Cookies, BrowserError>;

    async fn close(&self);
}

#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn BrowserSession>, BrowserError>;
}

type NetworkLog = Arc<Mutex<Vec<NetworkEvent>>>;

/// [`BrowserSession`] over a chromiumoxide-driven Chrome instance.
pub struct ChromiumSession {
    browser: tokio::sync::Mutex<Option<Browser>>,
    page: Page,
    network_log: NetworkLog,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    navigation_timeout: Duration,
}

impl ChromiumSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        let config = browser_config(settings)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;

        let mut tasks = vec![tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    scrape_debug!("browser handler: {}", err);
                }
            }
        })];

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;
        page.execute(EnableParams::default())
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;

        let network_log = NetworkLog::default();

        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;
        let log = network_log.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = requests.next().await {
                let headers = header_map(&event.request.headers);
                push(&log, NetworkEvent::request(event.request.url.clone(), headers));
            }
        }));

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;
        let log = network_log.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                push(&log, NetworkEvent::response(event.response.url.clone()));
            }
        }));

        scrape_info!("browser session started");
        Ok(Self {
            browser: tokio::sync::Mutex::new(Some(browser)),
            page,
            network_log,
            tasks: Mutex::new(tasks),
            navigation_timeout: settings.navigation_timeout,
        })
    }
}

#[async_trait::async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.network_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        scrape_debug!("navigating to {}", short_url(url));

        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|err| BrowserError::Navigation(err.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|err| BrowserError::Navigation(err.to_string()))?;
            Ok(())
        };
        tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| BrowserError::Timeout(self.navigation_timeout))?
    }

    async fn current_document(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|err| BrowserError::Script(err.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn network_event_log(&self) -> Result<Vec<NetworkEvent>, BrowserError> {
        let mut log = self
            .network_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(std::mem::take(&mut *log))
    }

    async fn cookies(&self) -> Result<Cookies, BrowserError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|err| BrowserError::Protocol(err.to_string()))?;
        Ok(cookies
            .into_iter()
            .map(|cookie| (cookie.name, cookie.value))
            .collect())
    }

    async fn close(&self) {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return;
        };
        if let Err(err) = browser.close().await {
            scrape_warn!("browser close failed: {}", err);
        }
        if let Err(err) = browser.wait().await {
            scrape_debug!("browser wait failed: {}", err);
        }
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.abort();
        }
        scrape_info!("browser session closed");
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumSessionFactory {
    settings: BrowserSettings,
}

impl ChromiumSessionFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn create(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        let session = ChromiumSession::launch(&self.settings).await?;
        Ok(Arc::new(session))
    }
}

fn browser_config(settings: &BrowserSettings) -> Result<BrowserConfig, BrowserError> {
    let (width, height) = settings.window_size;
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--no-first-run".to_string(),
        format!("--user-agent={}", settings.user_agent),
    ];
    args.extend(settings.extra_args.iter().cloned());

    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .request_timeout(settings.request_timeout)
        .args(args);
    if let Some(path) = &settings.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    if settings.no_sandbox {
        builder = builder.no_sandbox();
    }
    if !settings.headless {
        builder = builder.with_head();
    }
    builder.build().map_err(BrowserError::Launch)
}

fn push(log: &NetworkLog, event: NetworkEvent) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(event);
}

/// Flattens devtools request headers into lower-case string pairs.
fn header_map<T: serde::Serialize>(headers: &T) -> BTreeMap<String, String> {
    let Ok(serde_json::Value::Object(map)) = serde_json::to_value(headers) else {
        return BTreeMap::new();
    };
    map.into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            (name.to_ascii_lowercase(), value)
        })
        .collect()
}
