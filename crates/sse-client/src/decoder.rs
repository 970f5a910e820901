//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; complete lines are interpreted as SSE
//! fields and a blank line dispatches the accumulated event.

use std::time::Duration;

const DEFAULT_EVENT: &str = "message";
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name, `message` when the server did not send one.
    pub event: String,
    /// Data lines joined by `\n`.
    pub data: String,
    /// Last event id in effect when this event was dispatched.
    pub id: Option<String>,
    /// Reconnection hint in effect when this event was dispatched.
    pub retry: Option<Duration>,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }
}

/// Stateful decoder fed with raw body chunks.
#[derive(Debug, Default)]
pub struct EventDecoder {
    line: Vec<u8>,
    data: String,
    event: String,
    last_event_id: Option<String>,
    retry: Option<Duration>,
    started: bool,
    after_cr: bool,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();
        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => self.finish_line(&mut out),
                b'\r' => {
                    self.finish_line(&mut out);
                    self.after_cr = true;
                }
                _ => self.line.push(byte),
            }
        }
        out
    }

    /// Most recent `retry` hint sent by the server.
    pub fn retry_hint(&self) -> Option<Duration> {
        self.retry
    }

    fn finish_line(&mut self, out: &mut Vec<SseEvent>) {
        let mut bytes = std::mem::take(&mut self.line);
        if !self.started {
            self.started = true;
            if bytes.starts_with(BOM) {
                bytes.drain(..BOM.len());
            }
        }
        let line = String::from_utf8_lossy(&bytes);
        self.process_line(&line, out);
    }

    fn process_line(&mut self, line: &str, out: &mut Vec<SseEvent>) {
        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                out.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            other => {
                tracing::trace!(field = other, "Ignoring unknown SSE field");
            }
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = std::mem::take(&mut self.event);
        if self.data.is_empty() {
            return None;
        }
        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        Some(SseEvent {
            event: if event.is_empty() {
                DEFAULT_EVENT.to_string()
            } else {
                event
            },
            data,
            id: self.last_event_id.clone(),
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_notify_event() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"event: notify\ndata: alice:hello world\n\n");
        assert_eq!(events, vec![SseEvent::new("notify", "alice:hello world")]);
    }

    #[test]
    fn event_split_across_chunks() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"event: not").is_empty());
        assert!(decoder.feed(b"ify\ndata: bob:10:30").is_empty());
        let events = decoder.feed(b":00 meeting\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "notify");
        assert_eq!(events[0].data, "bob:10:30:00 meeting");
    }

    #[test]
    fn unnamed_event_defaults_to_message() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"data: hi\n\n");
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"data: first\ndata:second\ndata\n\n");
        assert_eq!(events[0].data, "first\nsecond\n");
    }

    #[test]
    fn crlf_and_cr_line_endings() {
        let mut decoder = EventDecoder::new();
        let mut events = decoder.feed(b"event: notify\r\ndata: a:b\r\n\r\n");
        events.extend(decoder.feed(b"event: notify\rdata: c:d\r\r"));
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["a:b", "c:d"]);
    }

    #[test]
    fn crlf_split_between_chunks_is_one_line_break() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: x\r").is_empty());
        let events = decoder.feed(b"\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn comments_and_unknown_fields_ignored() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b": keepalive\nfoo: bar\ndata: x\n\n");
        assert_eq!(events, vec![SseEvent::new("message", "x")]);
    }

    #[test]
    fn event_without_data_is_not_dispatched() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"event: notify\n\n").is_empty());
        // the dangling name must not leak into the next event
        let events = decoder.feed(b"data: y\n\n");
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn leading_bom_stripped() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"\xEF\xBB\xBFdata: z\n\n");
        assert_eq!(events[0].data, "z");
    }

    #[test]
    fn id_and_retry_tracked() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"id: 7\nretry: 2500\ndata: a\n\nretry: soon\ndata: b\n\n");
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(events[0].retry, Some(Duration::from_millis(2500)));
        assert_eq!(events[1].id.as_deref(), Some("7"));
        assert_eq!(decoder.retry_hint(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn only_one_leading_space_stripped() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(b"data:  padded\n\n");
        assert_eq!(events[0].data, " padded");
    }
}
