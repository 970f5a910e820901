//! Turns notify payloads into bubbles and schedules their fade-out.

use std::sync::Arc;
use std::time::Duration;

use super::board::DisplaySurface;
use super::fade::FadeScheduler;
use super::payload::NotificationPayload;
use super::types::BubbleId;

/// How long a bubble stays fully visible.
pub const DWELL_TIME: Duration = Duration::from_secs(10);
pub const FADE_DURATION: Duration = Duration::from_secs(1);

/// Visible-then-fade timing applied to every bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadePolicy {
    pub dwell: Duration,
    pub fade: Duration,
}

impl Default for FadePolicy {
    fn default() -> Self {
        Self {
            dwell: DWELL_TIME,
            fade: FADE_DURATION,
        }
    }
}

#[derive(Clone)]
pub struct NotificationRenderer {
    surface: Arc<dyn DisplaySurface>,
    fader: FadeScheduler,
    policy: FadePolicy,
}

impl NotificationRenderer {
    pub fn new(surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            fader: FadeScheduler::new(surface.clone()),
            surface,
            policy: FadePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FadePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append a bubble for `raw` and arm its fade. Must run inside a tokio
    /// runtime.
    pub fn render(&self, raw: &str) -> BubbleId {
        let payload = NotificationPayload::parse(raw);
        let id = self.surface.append(&payload.sender, &payload.body);
        tracing::debug!(%id, sender = %payload.sender, "Rendered notification");
        self.fader.schedule(id, self.policy.dwell, self.policy.fade);
        id
    }

    pub fn fader(&self) -> &FadeScheduler {
        &self.fader
    }
}
