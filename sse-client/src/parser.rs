//! Incremental parser for the SSE line framing format.
//!
//! Feed raw response-body chunks in with [`SseParser::push_bytes`]; frames
//! come out whenever a blank-line boundary completes a record. Chunk
//! boundaries are invisible to the output: a multi-byte character or a
//! line split across two chunks parses the same as an unsplit stream.
//!
//! Each connection attempt uses a fresh parser; nothing here survives a
//! reconnect.

use crate::event::SseFrame;

/// Output of a parser push: a completed frame, or an advisory
/// `retry:` interval from the server (never scheduled here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserItem {
    Frame(SseFrame),
    RetryHint(u64),
}

#[derive(Debug, Default)]
pub struct SseParser {
    /// Undecoded byte tail: a UTF-8 sequence cut off by a chunk boundary.
    bytes: Vec<u8>,
    /// Trailing partial line, prepended to the next chunk's text.
    line: String,
    event_type: Option<String>,
    id: Option<String>,
    data: String,
    has_data: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk of the response body, returning every item the
    /// chunk completed.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<ParserItem> {
        self.bytes.extend_from_slice(chunk);
        let decoded = self.take_decoded();

        let mut items = Vec::new();
        let mut text = std::mem::take(&mut self.line);
        text.push_str(&decoded);

        let mut rest = text.as_str();
        while let Some(pos) = rest.find('\n') {
            let line = rest[..pos].trim_end_matches('\r');
            self.process_line(line, &mut items);
            rest = &rest[pos + 1..];
        }
        self.line = rest.to_owned();
        items
    }

    /// Decode the longest valid UTF-8 prefix of the byte buffer, keeping
    /// an incomplete trailing sequence for the next chunk. Genuinely
    /// invalid sequences are replaced rather than stalling the stream.
    fn take_decoded(&mut self) -> String {
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(text) => {
                    out.push_str(text);
                    self.bytes.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.bytes[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.bytes.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.bytes.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    fn process_line(&mut self, line: &str, items: &mut Vec<ParserItem>) {
        if line.is_empty() {
            if !self.data.is_empty() {
                items.push(ParserItem::Frame(SseFrame {
                    event_type: self
                        .event_type
                        .take()
                        .unwrap_or_else(|| "message".to_owned()),
                    id: self.id.take(),
                    data: std::mem::take(&mut self.data),
                }));
            } else {
                self.event_type = None;
                self.id = None;
            }
            self.has_data = false;
            return;
        }

        if let Some(rest) = line.strip_prefix("data: ") {
            if self.has_data {
                self.data.push('\n');
            }
            self.data.push_str(rest);
            self.has_data = true;
        } else if let Some(rest) = line.strip_prefix("event: ") {
            self.event_type = Some(rest.to_owned());
        } else if let Some(rest) = line.strip_prefix("id: ") {
            self.id = Some(rest.to_owned());
        } else if let Some(rest) = line.strip_prefix("retry: ") {
            if let Ok(ms) = rest.trim().parse::<u64>() {
                items.push(ParserItem::RetryHint(ms));
            }
        }
        // Comments and unknown fields are ignored.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(items: Vec<ParserItem>) -> Vec<SseFrame> {
        items
            .into_iter()
            .filter_map(|item| match item {
                ParserItem::Frame(frame) => Some(frame),
                ParserItem::RetryHint(_) => None,
            })
            .collect()
    }

    fn parse_whole(input: &[u8]) -> Vec<SseFrame> {
        let mut parser = SseParser::new();
        frames(parser.push_bytes(input))
    }

    #[test]
    fn parses_minimal_frame_with_defaults() {
        let got = parse_whole(b"data: {\"x\":1}\n\n");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].event_type, "message");
        assert_eq!(got[0].id, None);
        assert_eq!(got[0].data, "{\"x\":1}");
    }

    #[test]
    fn parses_all_fields() {
        let got = parse_whole(b"event: update\nid: 7\ndata: hello\n\n");
        assert_eq!(
            got,
            vec![SseFrame {
                event_type: "update".to_owned(),
                id: Some("7".to_owned()),
                data: "hello".to_owned(),
            }]
        );
    }

    #[test]
    fn joins_multi_line_data_with_newline() {
        let got = parse_whole(b"data: line one\ndata: line two\n\n");
        assert_eq!(got[0].data, "line one\nline two");
    }

    #[test]
    fn ignores_comments_and_unknown_fields() {
        let got = parse_whole(b": keep-alive\nwhatever: junk\ndata: x\n\n");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].data, "x");
    }

    #[test]
    fn blank_line_without_data_emits_nothing_and_resets() {
        let mut parser = SseParser::new();
        assert!(frames(parser.push_bytes(b"id: 5\n\n")).is_empty());
        // The orphaned id must not leak into the next frame.
        let got = frames(parser.push_bytes(b"data: x\n\n"));
        assert_eq!(got[0].id, None);
    }

    #[test]
    fn emits_retry_hint_without_a_frame() {
        let mut parser = SseParser::new();
        let items = parser.push_bytes(b"retry: 5000\n");
        assert_eq!(items, vec![ParserItem::RetryHint(5000)]);
    }

    #[test]
    fn strips_carriage_returns() {
        let got = parse_whole(b"data: x\r\n\r\n");
        assert_eq!(got[0].data, "x");
    }

    #[test]
    fn frame_state_resets_between_frames() {
        let got = parse_whole(b"event: a\nid: 1\ndata: one\n\ndata: two\n\n");
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].event_type, "message");
        assert_eq!(got[1].id, None);
    }

    #[test]
    fn chunk_boundary_invariance() {
        let input: &[u8] =
            b"event: update\nid: 12\ndata: {\"n\":\"caf\xc3\xa9\"}\nretry: 250\n\ndata: plain\n\n";
        let expected = parse_whole(input);
        assert_eq!(expected.len(), 2);

        // Splitting at every byte offset must yield the same frames,
        // including through the middle of the multi-byte character.
        for split in 1..input.len() {
            let mut parser = SseParser::new();
            let mut got = frames(parser.push_bytes(&input[..split]));
            got.extend(frames(parser.push_bytes(&input[split..])));
            assert_eq!(got, expected, "split at byte {split}");
        }

        // One byte at a time as the degenerate case.
        let mut parser = SseParser::new();
        let mut got = Vec::new();
        for byte in input {
            got.extend(frames(parser.push_bytes(std::slice::from_ref(byte))));
        }
        assert_eq!(got, expected);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut parser = SseParser::new();
        let mut items = parser.push_bytes(b"data: a\xff");
        items.extend(parser.push_bytes(b"b\n\n"));
        let got = frames(items);
        assert_eq!(got.len(), 1);
        assert!(got[0].data.starts_with('a'));
        assert!(got[0].data.ends_with('b'));
    }
}
