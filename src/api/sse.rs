//! Incremental `text/event-stream` decoding.
//!
//! Bytes arrive in arbitrary chunks from the network; the decoder buffers
//! partial lines and yields an event each time a blank line closes one.

/// A dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `event:` field, "message" when absent.
    pub event: String,
    /// `data:` lines joined with '\n'.
    pub data: String,
    pub id: Option<String>,
}

/// Upper bound on a single buffered line.
const MAX_LINE: usize = 1024 * 1024;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    last_id: Option<String>,
    retry_ms: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the last dispatched event that carried one.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Reconnect delay most recently requested with a `retry:` field, in
    /// milliseconds. Takes effect as soon as the line is read, with or
    /// without an event around it.
    pub fn retry(&self) -> Option<u64> {
        self.retry_ms
    }

    /// Discard any partial event, e.g. before reading a new connection's body.
    /// The last event id and the reconnect delay survive.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.event = None;
        self.data.clear();
        self.id = None;
    }

    /// Feed a chunk and collect every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LINE {
            tracing::warn!(bytes = self.buffer.len(), "Dropping oversized event-stream line");
            self.buffer.clear();
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => {
                if !value.contains('\0') {
                    self.id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry_ms = Some(ms);
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if id.is_some() {
            self.last_id.clone_from(&id);
        }

        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");

        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
            id,
        })
    }
}
