use std::sync::{Arc, Weak};

use crate::feed::{FeedError, FetchOutcome, PaginationController};

/// Intersection ratio at which the sentinel counts as in view.
pub const FULL_VISIBILITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Armed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The observation was released, or the hosting view is gone.
    Detached,
    OutOfView,
    /// Still in view since the last fire; waits for the sentinel to leave and come back.
    AlreadyArmed,
    /// No next page, or a fetch is already running.
    Held,
    Fired(FetchOutcome),
}

/// Watches the feed's sentinel and asks the controller for the next page
/// each time the sentinel comes fully into view.
///
/// The hosting view owns the controller; the trigger only keeps a weak
/// handle to it, so reports arriving after the view is gone are ignored.
pub struct ScrollTrigger {
    controller: Weak<PaginationController>,
    state: TriggerState,
    threshold: f64,
    connected: bool,
}

impl ScrollTrigger {
    #[must_use]
    pub fn observe(controller: &Arc<PaginationController>) -> Self {
        Self::with_threshold(controller, FULL_VISIBILITY)
    }

    #[must_use]
    pub fn with_threshold(controller: &Arc<PaginationController>, threshold: f64) -> Self {
        Self {
            controller: Arc::downgrade(controller),
            state: TriggerState::Idle,
            threshold,
            connected: true,
        }
    }

    #[must_use]
    pub const fn state(&self) -> TriggerState {
        self.state
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Feeds one visibility report for the sentinel.
    pub async fn on_intersection(&mut self, ratio: f64) -> Result<TriggerOutcome, FeedError> {
        if !self.connected {
            return Ok(TriggerOutcome::Detached);
        }
        if ratio < self.threshold {
            self.state = TriggerState::Idle;
            return Ok(TriggerOutcome::OutOfView);
        }
        if self.state == TriggerState::Armed {
            return Ok(TriggerOutcome::AlreadyArmed);
        }

        let Some(controller) = self.controller.upgrade() else {
            self.disconnect();
            return Ok(TriggerOutcome::Detached);
        };
        if !controller.has_next() || controller.is_fetching() {
            return Ok(TriggerOutcome::Held);
        }

        self.state = TriggerState::Armed;
        match controller.fetch_next().await {
            Ok(outcome) => Ok(TriggerOutcome::Fired(outcome)),
            Err(e) => {
                self.state = TriggerState::Idle;
                Err(e)
            }
        }
    }

    /// Releases the observation. Later reports are ignored.
    pub fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.state = TriggerState::Idle;
            tracing::debug!("feed sentinel observation released");
        }
    }
}

impl Drop for ScrollTrigger {
    fn drop(&mut self) {
        self.disconnect();
    }
}
