//! Notification type definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one bubble on a board. Ids increase in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BubbleId(pub u64);

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bubble-{}", self.0)
    }
}

/// A rendered notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    pub sender: String,
    pub body: String,
    /// 1.0 when fully visible, decays while fading.
    pub opacity: f64,
    pub received_at: DateTime<Utc>,
}

/// How the console surface prints board changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str_setting(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}
