//! Incremental Server-Sent-Events framing.
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers partial lines and
//! yields one [`SseMessage`] per dispatched event. Bare JSON lines outside
//! any `data:` field are passed through too, so NDJSON bodies also work.

/// One dispatched event: its joined `data:` payload and `event:` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental decoder for `text/event-stream` bodies.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every payload completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.handle_line(line.trim_end_matches(['\n', '\r']), &mut out);
        }
        out
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<SseMessage> {
        let mut out = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.handle_line(line.trim_end_matches('\r'), &mut out);
        }
        self.dispatch(&mut out);
        out
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<SseMessage>) {
        if line.is_empty() {
            self.dispatch(out);
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        } else if let Some(name) = line.strip_prefix("event:") {
            let name = name.trim();
            self.event = (!name.is_empty()).then(|| name.to_string());
        } else if line.starts_with(':') || is_ignored_field(line) {
            // comment, or a field we do not use
        } else if line.trim_start().starts_with('{') {
            self.dispatch(out);
            out.push(SseMessage {
                event: None,
                data: line.trim().to_string(),
            });
        }
    }

    /// Emit the buffered event. The event name never outlives its event.
    fn dispatch(&mut self, out: &mut Vec<SseMessage>) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        let data = self.data.join("\n");
        self.data.clear();
        if !data.trim().is_empty() {
            out.push(SseMessage { event, data });
        }
    }
}

fn is_ignored_field(line: &str) -> bool {
    ["id:", "retry:"].iter().any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payloads(messages: Vec<SseMessage>) -> Vec<String> {
        messages.into_iter().map(|m| m.data).collect()
    }

    #[test]
    fn events_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"event: message\ndata: {\"type\":").is_empty());
        let out = dec.push(b"\"STEP\"}\n\ndata: {\"type\":\"COMPLETE\"}\r\n\r\n");
        assert_eq!(out[0].event.as_deref(), Some("message"));
        assert_eq!(out[1].event, None);
        assert_eq!(payloads(out), vec![r#"{"type":"STEP"}"#, r#"{"type":"COMPLETE"}"#]);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b"data: {\"a\":\ndata: 1}\n\n");
        assert_eq!(payloads(out), vec!["{\"a\":\n1}"]);
    }

    #[test]
    fn comments_are_skipped_and_ndjson_passes_through() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b": keep-alive\nid: 7\n{\"type\":\"STEP\"}\n");
        assert_eq!(payloads(out), vec![r#"{"type":"STEP"}"#]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: {\"type\":\"DONE\"}").is_empty());
        assert_eq!(payloads(dec.finish()), vec![r#"{"type":"DONE"}"#]);
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn event_name_travels_with_its_data_only() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b"event: error\ndata: {\"message\":\"blocked\"}\n\ndata: {}\n\n");
        assert_eq!(
            out,
            vec![
                SseMessage {
                    event: Some("error".into()),
                    data: r#"{"message":"blocked"}"#.into(),
                },
                SseMessage {
                    event: None,
                    data: "{}".into(),
                },
            ]
        );

        // A name with no data is dropped at the blank line.
        let out = dec.push(b"event: ping\n\ndata: {\"type\":\"STEP\"}\n\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event, None);
    }
}
