use core::time::Duration;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Shared outbound request budget for the remote API.
///
/// At most `max_concurrent` requests hold a permit at once. When the controller answers
/// with a rate-limit response, any request may call [`Throttler::pause_for`] to hold back
/// new dispatches until the controller's retry delay has elapsed. Requests already on the
/// wire are not interrupted.
///
/// Overlapping pauses keep the latest deadline.
#[derive(Debug)]
pub struct Throttler {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    paused_until: Mutex<Option<Instant>>,
}

impl Throttler {
    /// A new pause must end at least this much later than the active one to replace it.
    const MIN_PAUSE_EXTENSION: Duration = Duration::from_millis(500);

    /// Create a throttler that allows at most `max_concurrent` requests in flight.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            paused_until: Mutex::new(None),
        })
    }

    #[must_use]
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Wait out any active pause, then take a request slot.
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        loop {
            if let Some(deadline) = self.active_pause() {
                tokio::time::sleep_until(deadline).await;
                continue;
            }

            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            // a pause may have started while we were queued for a slot
            if let Some(deadline) = self.active_pause() {
                drop(permit);
                tokio::time::sleep_until(deadline).await;
                continue;
            }

            return permit;
        }
    }

    /// Returns whether new dispatches are currently held back.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.active_pause().is_some()
    }

    /// Hold back new dispatches for `duration`.
    ///
    /// Returns `false` without changing anything when an active pause already ends at
    /// about the same time or later.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let new_deadline = Instant::now() + duration;
        let mut guard = self.paused_until.lock().expect("lock not poisoned");

        if guard.is_some_and(|existing| existing + Self::MIN_PAUSE_EXTENSION >= new_deadline) {
            return false;
        }

        *guard = Some(new_deadline);
        true
    }

    fn active_pause(&self) -> Option<Instant> {
        let mut guard = self.paused_until.lock().expect("lock not poisoned");
        match *guard {
            Some(deadline) if deadline > Instant::now() => Some(deadline),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }
}
