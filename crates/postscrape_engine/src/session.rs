use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use postscrape_logging::{scrape_info, scrape_warn};
use tokio::sync::Mutex;

use crate::browser::{BrowserSession, SessionFactory};
use crate::BrowserError;

/// Owns the one shared browser session: created on first use, replaced after
/// an invalidation, closed once at shutdown.
pub struct SessionManager {
    factory: Arc<dyn SessionFactory>,
    current: Mutex<Option<Arc<dyn BrowserSession>>>,
    active: AtomicBool,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    /// Returns the live session, launching one if there is none.
    pub async fn session(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            return Ok(session.clone());
        }
        let session = self.factory.create().await?;
        *current = Some(session.clone());
        self.active.store(true, Ordering::Release);
        Ok(session)
    }

    /// Closes and forgets the current session; the next request starts fresh.
    pub async fn invalidate(&self) {
        let session = self.take().await;
        if let Some(session) = session {
            scrape_warn!("invalidating browser session");
            session.close().await;
        }
    }

    pub async fn shutdown(&self) {
        let session = self.take().await;
        if let Some(session) = session {
            scrape_info!("shutting down browser session");
            session.close().await;
        }
    }

    /// Whether a session is live. Never waits on a launch in progress.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    async fn take(&self) -> Option<Arc<dyn BrowserSession>> {
        let mut current = self.current.lock().await;
        self.active.store(false, Ordering::Release);
        current.take()
    }
}
