//! Display container and result surface.
//!
//! `BubbleBoard` is the in-memory page: bubbles in arrival order plus a
//! single result text slot. Markup uses the `chat` / `chatter` / `comment`
//! class names an external stylesheet targets.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::types::{Bubble, BubbleId};

/// Shown instead of the feed when push connections cannot be opened.
pub const UNSUPPORTED_MESSAGE: &str = "Sorry, your runtime does not support server-sent events...";

/// Container that receives bubbles and applies fade updates.
pub trait DisplaySurface: Send + Sync + 'static {
    /// Append a bubble as the last child and return its id.
    fn append(&self, sender: &str, body: &str) -> BubbleId;
    fn set_opacity(&self, id: BubbleId, opacity: f64);
    /// Remove the bubble from the visible layout.
    fn hide(&self, id: BubbleId);
}

/// Single text slot used for the one-time unsupported message.
pub trait ResultSurface: Send + Sync {
    fn show_result(&self, text: &str);
}

#[derive(Default)]
struct BoardState {
    bubbles: Vec<Bubble>,
    next_id: u64,
    result: Option<String>,
}

#[derive(Default)]
pub struct BubbleBoard {
    state: Mutex<BoardState>,
}

impl BubbleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible bubbles, oldest first.
    pub fn bubbles(&self) -> Vec<Bubble> {
        self.lock().bubbles.clone()
    }

    pub fn get(&self, id: BubbleId) -> Option<Bubble> {
        self.lock().bubbles.iter().find(|b| b.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn result(&self) -> Option<String> {
        self.lock().result.clone()
    }

    /// Markup of every visible bubble, in order.
    pub fn render_html(&self) -> String {
        self.lock().bubbles.iter().map(bubble_html).collect()
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySurface for BubbleBoard {
    fn append(&self, sender: &str, body: &str) -> BubbleId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = BubbleId(state.next_id);
        state.bubbles.push(Bubble {
            id,
            sender: sender.to_string(),
            body: body.to_string(),
            opacity: 1.0,
            received_at: Utc::now(),
        });
        id
    }

    fn set_opacity(&self, id: BubbleId, opacity: f64) {
        let mut state = self.lock();
        if let Some(bubble) = state.bubbles.iter_mut().find(|b| b.id == id) {
            bubble.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn hide(&self, id: BubbleId) {
        self.lock().bubbles.retain(|b| b.id != id);
    }
}

impl ResultSurface for BubbleBoard {
    fn show_result(&self, text: &str) {
        self.lock().result = Some(text.to_string());
    }
}

/// Markup for one bubble. Sender and body are escaped.
pub fn bubble_html(bubble: &Bubble) -> String {
    let style = if bubble.opacity < 1.0 {
        format!(" style=\"opacity: {:.3}\"", bubble.opacity)
    } else {
        String::new()
    };
    format!(
        "<div class=\"chat\"{style}><p class=\"chatter\">{}</p><p class=\"comment\">{}</p></div>",
        escape_html(&bubble.sender),
        escape_html(&bubble.body),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
