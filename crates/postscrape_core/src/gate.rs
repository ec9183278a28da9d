use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// One in-flight operation at a time: a single browser session cannot serve
/// concurrent navigations.
pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Returned by [`AdmissionGate::admit`] when every slot is taken.
/// Nothing changed; the caller may retry later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scraper is busy: {active} of {max_concurrent} slots in use")]
pub struct Busy {
    pub active: usize,
    pub max_concurrent: usize,
}

/// Read-only snapshot of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatus {
    pub active_requests: usize,
    pub max_concurrent: usize,
    pub busy: bool,
}

#[derive(Debug)]
struct GateInner {
    active: Mutex<usize>,
    max_concurrent: usize,
}

impl GateInner {
    fn lock(&self) -> MutexGuard<'_, usize> {
        // The counter is a plain integer; a panic elsewhere cannot leave it torn.
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release_one(&self) {
        let mut active = self.lock();
        *active = active.saturating_sub(1);
    }
}

/// Bounds the number of concurrently admitted scrape operations.
///
/// `admit` never blocks: it either takes a slot or fails with [`Busy`]. The
/// lock is held only for the increment or decrement, never across an
/// operation.
///
/// Raising `max_concurrent` above one is only safe when every admitted
/// operation drives its own browser session. The shared session is not safe
/// for concurrent navigation.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    inner: Arc<GateInner>,
}

impl AdmissionGate {
    /// `max_concurrent` is clamped to at least one.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(GateInner {
                active: Mutex::new(0),
                max_concurrent: max_concurrent.max(1),
            }),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    pub fn admit(&self) -> Result<AdmissionToken, Busy> {
        let mut active = self.inner.lock();
        if *active >= self.inner.max_concurrent {
            return Err(Busy {
                active: *active,
                max_concurrent: self.inner.max_concurrent,
            });
        }
        *active += 1;
        Ok(AdmissionToken {
            gate: Arc::clone(&self.inner),
            slot: *active,
        })
    }

    /// Explicit release. Dropping the token has the same effect.
    pub fn release(&self, token: AdmissionToken) {
        drop(token);
    }

    pub fn status(&self) -> GateStatus {
        let active = *self.inner.lock();
        GateStatus {
            active_requests: active,
            max_concurrent: self.inner.max_concurrent,
            busy: active >= self.inner.max_concurrent,
        }
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

/// Proof of admission. The slot is released when the token is dropped, so
/// every exit path of the admitted operation gives it back.
#[derive(Debug)]
#[must_use = "dropping the token releases the slot immediately"]
pub struct AdmissionToken {
    gate: Arc<GateInner>,
    slot: usize,
}

impl AdmissionToken {
    /// Number of active operations at the moment this one was admitted.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        self.gate.release_one();
    }
}
