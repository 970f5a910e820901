//! Transient notification bubbles.
//!
//! Payload parsing, the bubble board (display container + result slot),
//! timed fade-out, and the renderer tying them together.

pub mod board;
pub mod console;
pub mod fade;
pub mod payload;
pub mod renderer;
pub mod types;

pub use board::{BubbleBoard, DisplaySurface, ResultSurface, UNSUPPORTED_MESSAGE};
pub use console::ConsoleSurface;
pub use fade::FadeScheduler;
pub use payload::NotificationPayload;
pub use renderer::{FadePolicy, NotificationRenderer};
pub use types::{Bubble, BubbleId, OutputFormat};
