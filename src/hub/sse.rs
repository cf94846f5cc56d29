//! Incremental `text/event-stream` decoder.
//!
//! Feed raw body chunks in, get dispatched events out. Handles the
//! parts of the SSE framing the hub actually uses: `event:` and `data:`
//! fields, multi-line data joined with `\n`, `:` comment lines, CRLF
//! line endings, and dispatch on a blank line. `id:` and `retry:`
//! fields are ignored. Chunk boundaries may fall anywhere, including
//! mid-line.

use bytes::{Buf, BytesMut};

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    /// Event name; `message` when the stream never names it.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
}

/// Stateful decoder. One instance per subscription.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(line) = self.take_line() {
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Pop one complete line off the buffer, stripping the terminator.
    fn take_line(&mut self) -> Option<String> {
        let nl = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line = self.buf.split_to(nl);
        self.buf.advance(1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        // Non-UTF-8 bytes can't carry our base64 payloads; decode
        // lossily and let the payload decoder reject the frame.
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            // Blank line dispatches the accumulated event, if any.
            // No data buffered means nothing to dispatch (per the SSE
            // processing model, the event name alone is discarded).
            if self.data.is_empty() {
                self.event = None;
                return None;
            }
            let frame = SseFrame {
                event: self.event.take().unwrap_or_else(|| "message".to_string()),
                data: self.data.join("\n"),
            };
            self.data.clear();
            return Some(frame);
        }

        if line.starts_with(':') {
            return None; // comment / keep-alive
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id, retry, anything unknown: ignored.
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.into(),
            data: data.into(),
        }
    }

    #[test]
    fn single_event() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"event: texts\ndata: aGVsbG8=\n\n");
        assert_eq!(frames, vec![frame("texts", "aGVsbG8=")]);
    }

    #[test]
    fn split_across_arbitrary_chunks() {
        let mut dec = SseDecoder::new();
        let stream = b"event: texts\ndata: abc\n\nevent: texts\ndata: def\n\n";
        let mut frames = Vec::new();
        // Worst case: one byte per chunk.
        for b in stream {
            frames.extend(dec.feed(&[*b]));
        }
        assert_eq!(frames, vec![frame("texts", "abc"), frame("texts", "def")]);
    }

    #[test]
    fn multi_line_data_joined() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"data: one\ndata: two\n\n");
        assert_eq!(frames, vec![frame("message", "one\ntwo")]);
    }

    #[test]
    fn comments_and_unknown_fields_ignored() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b": keep-alive\nid: 7\nretry: 100\n\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn crlf_line_endings() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"event: texts\r\ndata: x\r\n\r\n");
        assert_eq!(frames, vec![frame("texts", "x")]);
    }

    #[test]
    fn value_space_is_optional() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"data:nospace\n\n");
        assert_eq!(frames, vec![frame("message", "nospace")]);
    }
}
