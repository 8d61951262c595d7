//! Incremental parser for `text/event-stream` bodies as produced by the
//! realtime database streaming endpoint.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body; returns every event completed by it. Chunks
    /// may split lines (or UTF-8 sequences) anywhere.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if event.is_none() && self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_put_and_keep_alive() {
        let mut parser = SseParser::new();
        let events = parser.feed(
            b"event: put\ndata: {\"path\":\"/\",\"data\":null}\n\nevent: keep-alive\ndata: null\n\n",
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "put");
        assert_eq!(events[0].data, "{\"path\":\"/\",\"data\":null}");
        assert_eq!(events[1].event, "keep-alive");
    }

    #[test]
    fn handles_lines_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: pa").is_empty());
        assert!(parser.feed(b"tch\r\ndata: {\"a\"").is_empty());
        let events = parser.feed(b":1}\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent { event: "patch".to_string(), data: "{\"a\":1}".to_string() }]
        );
    }

    #[test]
    fn ignores_comments() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b": heartbeat\n\n").is_empty());
    }
}
