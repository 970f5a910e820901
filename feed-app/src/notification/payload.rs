//! `sender:body` payload parsing.

/// Separates sender from body; only the first occurrence counts.
pub const DELIMITER: char = ':';

/// A parsed notify payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub sender: String,
    pub body: String,
}

impl NotificationPayload {
    /// Split on the first colon. Never fails: without a colon the whole
    /// string is the sender and the body is empty.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(DELIMITER) {
            Some((sender, body)) => Self {
                sender: sender.to_string(),
                body: body.to_string(),
            },
            None => Self {
                sender: raw.to_string(),
                body: String::new(),
            },
        }
    }
}
