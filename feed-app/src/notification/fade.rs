//! Timed fade-out of bubbles.
//!
//! Each fade is a repeating task keyed by bubble id: opacity decays linearly
//! by `interval / duration` per tick, and once the next value would reach
//! the threshold the bubble is hidden instead. The tick count is fixed up
//! front, so termination never depends on float accumulation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, interval_at, sleep};

use super::board::DisplaySurface;
use super::types::BubbleId;

pub const TICK_INTERVAL: Duration = Duration::from_millis(5);
pub const OPACITY_THRESHOLD: f64 = 0.05;

/// Number of ticks until a fade of `duration` hides its element:
/// `⌈(1 − threshold) / (interval / duration)⌉`, at least one.
pub fn ticks_for(duration: Duration, interval: Duration) -> u32 {
    if interval.is_zero() {
        return 1;
    }
    let ratio = duration.as_nanos() as f64 / interval.as_nanos() as f64;
    let ticks = ((1.0 - OPACITY_THRESHOLD) * ratio).ceil();
    if ticks < 1.0 {
        1
    } else {
        ticks.min(f64::from(u32::MAX)) as u32
    }
}

/// Runs fades against one display surface.
#[derive(Clone)]
pub struct FadeScheduler {
    surface: Arc<dyn DisplaySurface>,
    tasks: Arc<Mutex<HashMap<BubbleId, AbortHandle>>>,
    interval: Duration,
}

impl FadeScheduler {
    pub fn new(surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            surface,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            interval: TICK_INTERVAL,
        }
    }

    /// Fade `id` out over `duration`, starting now.
    pub fn fade_out(&self, id: BubbleId, duration: Duration) {
        self.schedule(id, Duration::ZERO, duration);
    }

    /// Fade `id` out over `duration` once `delay` has elapsed. Rescheduling
    /// an id replaces its pending fade.
    pub fn schedule(&self, id: BubbleId, delay: Duration, duration: Duration) {
        let mut tasks = self.lock_tasks();
        let this = self.clone();
        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let ticks = this.run(id, duration).await;
            tracing::debug!(%id, ticks, "Fade finished");
            this.lock_tasks().remove(&id);
        });
        if let Some(previous) = tasks.insert(id, task.abort_handle()) {
            previous.abort();
        }
    }

    /// Stop a pending or running fade. The bubble stays where it is.
    pub fn cancel(&self, id: BubbleId) -> bool {
        match self.lock_tasks().remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.lock_tasks().drain().collect();
        for (_, handle) in &drained {
            handle.abort();
        }
        drained.len()
    }

    /// Fades scheduled or in progress.
    pub fn pending(&self) -> usize {
        self.lock_tasks().len()
    }

    async fn run(&self, id: BubbleId, duration: Duration) -> u32 {
        let ticks = ticks_for(duration, self.interval);
        let step = self.interval.as_secs_f64() / duration.as_secs_f64();
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);

        for tick in 1..=ticks {
            ticker.tick().await;
            if tick == ticks {
                self.surface.hide(id);
                break;
            }
            self.surface.set_opacity(id, 1.0 - f64::from(tick) * step);
        }
        ticks
    }

    fn lock_tasks(&self) -> MutexGuard<'_, HashMap<BubbleId, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
