//! Console rendition of the board: mirrors bubble changes to a writer.

use std::io::{Stdout, Write};
use std::sync::{Mutex, PoisonError};

use serde_json::json;

use super::board::{BubbleBoard, DisplaySurface, ResultSurface};
use super::types::{BubbleId, OutputFormat};

/// Board that also prints additions, removals and the result text.
pub struct ConsoleSurface<W = Stdout> {
    board: BubbleBoard,
    format: OutputFormat,
    out: Mutex<W>,
}

impl ConsoleSurface<Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::with_writer(format, std::io::stdout())
    }
}

impl<W: Write + Send + 'static> ConsoleSurface<W> {
    pub fn with_writer(format: OutputFormat, out: W) -> Self {
        Self {
            board: BubbleBoard::new(),
            format,
            out: Mutex::new(out),
        }
    }

    pub fn board(&self) -> &BubbleBoard {
        &self.board
    }

    fn emit(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!("Failed to write console output: {e}");
        }
    }
}

impl<W> ConsoleSurface<W> {
    #[cfg(test)]
    fn into_writer(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send + 'static> DisplaySurface for ConsoleSurface<W> {
    fn append(&self, sender: &str, body: &str) -> BubbleId {
        let id = self.board.append(sender, body);
        let line = match self.format {
            OutputFormat::Text => format!("{}: {}", printable(sender), printable(body)),
            OutputFormat::Json => {
                let bubble = self.board.get(id);
                json!({ "type": "bubble_added", "data": bubble }).to_string()
            }
        };
        self.emit(&line);
        id
    }

    fn set_opacity(&self, id: BubbleId, opacity: f64) {
        tracing::trace!(%id, opacity, "Bubble opacity");
        self.board.set_opacity(id, opacity);
    }

    fn hide(&self, id: BubbleId) {
        self.board.hide(id);
        match self.format {
            OutputFormat::Text => tracing::debug!(%id, "Bubble removed"),
            OutputFormat::Json => {
                self.emit(&json!({ "type": "bubble_removed", "data": { "id": id } }).to_string())
            }
        }
    }
}

impl<W: Write + Send + 'static> ResultSurface for ConsoleSurface<W> {
    fn show_result(&self, text: &str) {
        self.board.show_result(text);
        let line = match self.format {
            OutputFormat::Text => text.to_string(),
            OutputFormat::Json => json!({ "type": "result", "data": text }).to_string(),
        };
        self.emit(&line);
    }
}

/// Replace control characters so payloads cannot drive the terminal.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect()
}
