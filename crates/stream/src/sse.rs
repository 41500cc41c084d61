//! Server-Sent-Events reframing.
//!
//! Upstream bodies arrive as arbitrary byte chunks with no alignment
//! between chunk boundaries and event boundaries: one event may span many
//! chunks, one chunk may hold many events, and a chunk may even split a
//! multi-byte character. [`SseFramer`] buffers raw bytes and yields only
//! complete event payloads, so the same input always produces the same
//! events regardless of how it was sliced.

/// Incremental SSE event reframer.
///
/// Feed it raw chunks as they arrive; it returns the `data` payload of every
/// event completed so far. Field lines other than `data` and comment lines
/// are ignored (`id`/`retry` carry no meaning in this protocol).
#[derive(Debug, Default)]
pub struct SseFramer {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one raw chunk, returning every event payload it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // the \n itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            // A line is only handled once complete, so its bytes form whole
            // characters even when chunks split mid-character.
            let line = String::from_utf8_lossy(&line).into_owned();
            self.handle_line(&line, &mut events);
        }
        events
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            // Blank line terminates an event.
            if !self.data_lines.is_empty() {
                events.push(self.data_lines.join("\n"));
                self.data_lines.clear();
            }
            return;
        }

        if line.starts_with(':') {
            return; // comment
        }

        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data_lines.push(value.to_string());
        } else if line == "data" {
            self.data_lines.push(String::new());
        }
        // Other fields (event, id, retry) are not meaningful here.
    }
}

/// Serialize one normalized payload as an SSE `data:` frame.
pub fn sse_frame(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_single_event() {
        let mut framer = SseFramer::new();
        let events = framer.feed(b"data: {\"text\":\"hi\"}\n\n");
        assert_eq!(events, vec![r#"{"text":"hi"}"#]);
    }

    #[test]
    fn one_chunk_many_events() {
        let mut framer = SseFramer::new();
        let events = framer.feed(b"data: one\n\ndata: two\n\ndata: three\n\n");
        assert_eq!(events, vec!["one", "two", "three"]);
    }

    #[test]
    fn event_split_across_three_chunks_matches_single_chunk() {
        let whole = b"data: {\"text\":\"hello world\"}\n\n";

        let mut one_shot = SseFramer::new();
        let expected = one_shot.feed(whole);

        let mut split = SseFramer::new();
        let mut events = Vec::new();
        events.extend(split.feed(&whole[..7]));
        events.extend(split.feed(&whole[7..23]));
        events.extend(split.feed(&whole[23..]));

        assert_eq!(events, expected);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn never_yields_partial_event() {
        let mut framer = SseFramer::new();
        assert!(framer.feed(b"data: {\"tex").is_empty());
        assert!(framer.feed(b"t\":\"x\"}").is_empty());
        // Payload complete but no terminating blank line yet.
        assert!(framer.feed(b"\n").is_empty());
        assert_eq!(framer.feed(b"\n"), vec![r#"{"text":"x"}"#]);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let whole = "data: héllo\n\n".as_bytes();
        // Split inside the two-byte 'é'.
        let split_at = whole.iter().position(|&b| b == 0xc3).unwrap() + 1;

        let mut framer = SseFramer::new();
        let mut events = Vec::new();
        events.extend(framer.feed(&whole[..split_at]));
        events.extend(framer.feed(&whole[split_at..]));

        assert_eq!(events, vec!["héllo"]);
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let mut framer = SseFramer::new();
        let events = framer.feed(b"data: one\r\n\r\n");
        assert_eq!(events, vec!["one"]);
    }

    #[test]
    fn comments_and_foreign_fields_are_ignored() {
        let mut framer = SseFramer::new();
        let events = framer.feed(b": keep-alive\nevent: message\nid: 7\ndata: payload\n\n");
        assert_eq!(events, vec!["payload"]);
    }

    #[test]
    fn multi_line_data_joins_with_newline() {
        let mut framer = SseFramer::new();
        let events = framer.feed(b"data: first\ndata: second\n\n");
        assert_eq!(events, vec!["first\nsecond"]);
    }

    #[test]
    fn blank_line_without_data_emits_nothing() {
        let mut framer = SseFramer::new();
        assert!(framer.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn frame_serialization_shape() {
        assert_eq!(sse_frame(r#"{"text":"hi"}"#), "data: {\"text\":\"hi\"}\n\n");
    }
}
