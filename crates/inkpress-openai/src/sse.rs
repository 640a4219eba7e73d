//! Incremental decoding of a `text/event-stream` chat-completion body.
//!
//! Three layers, each usable on its own:
//!
//! 1. [`Utf8ChunkDecoder`] turns raw network reads into text without ever
//!    splitting a multi-byte character.
//! 2. [`LineFramer`] reassembles that text into complete lines.
//! 3. [`classify_line`] / [`SseDecoder`] interpret lines as SSE `data:`
//!    fields and pull tokens out of the JSON payloads.
//!
//! A decoder lives for exactly one request; nothing here is shared.

use std::str;

use serde_json::Value;

use crate::profile::ProviderProfile;

/// Lossy, chunk-boundary-aware UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + bytes` as possible.
    ///
    /// An incomplete sequence at the very end is held back for the next
    /// call; invalid bytes anywhere else become U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest = self.pending.as_slice();

        loop {
            match str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let held = rest.len();
        let consumed = self.pending.len() - held;
        self.pending.drain(..consumed);
        out
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Reassembles text chunks into complete lines.
///
/// Lines end at `\n`; a `\r` right before it is dropped.  Whatever follows
/// the last newline stays in the remainder until more text arrives.
#[derive(Debug, Default)]
pub struct LineFramer {
    remainder: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.remainder.push_str(chunk);

        let Some(last_newline) = self.remainder.rfind('\n') else {
            return Vec::new();
        };

        let tail = self.remainder.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.remainder, tail);

        complete
            .split_terminator('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
            .collect()
    }

    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    pub fn clear(&mut self) {
        self.remainder.clear();
    }
}

/// What a single framed line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// JSON text that should carry a token.
    Payload(&'a str),
    /// `data: [DONE]`.
    Done,
    /// Blank line ending an SSE event.
    Boundary,
    /// Comments, other fields, empty `data:` and anything unrecognised.
    Ignored,
}

pub fn classify_line(line: &str) -> SseLine<'_> {
    if let Some(data) = line.strip_prefix("data: ") {
        return match data.trim() {
            "[DONE]" => SseLine::Done,
            "" => SseLine::Ignored,
            payload => SseLine::Payload(payload),
        };
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        SseLine::Boundary
    } else if trimmed.starts_with('{') && trimmed.ends_with('}') {
        SseLine::Payload(trimmed)
    } else {
        SseLine::Ignored
    }
}

/// Bytes in, tokens out, for one streaming response.
#[derive(Debug)]
pub struct SseDecoder {
    utf8: Utf8ChunkDecoder,
    framer: LineFramer,
    profile: &'static ProviderProfile,
    events: usize,
}

impl SseDecoder {
    pub fn new(profile: &'static ProviderProfile) -> Self {
        Self {
            utf8: Utf8ChunkDecoder::new(),
            framer: LineFramer::new(),
            profile,
            events: 0,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(bytes);
        self.feed_str(&text)
    }

    /// Tokens found in the complete lines of `text`, in arrival order.
    pub fn feed_str(&mut self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        for line in self.framer.push(text) {
            match classify_line(&line) {
                SseLine::Payload(payload) => match serde_json::from_str::<Value>(payload) {
                    Ok(json) => tokens.extend(self.profile.stream_token(&json)),
                    Err(err) => {
                        tracing::warn!(provider = self.profile.id, error = %err, line = %line, "skipping malformed stream payload");
                    }
                },
                SseLine::Boundary => self.events += 1,
                SseLine::Done | SseLine::Ignored => {}
            }
        }

        tokens
    }

    /// Number of SSE event boundaries seen so far.
    pub fn events(&self) -> usize {
        self.events
    }

    /// End of body.  Returns the unterminated text that is being dropped,
    /// if any.
    pub fn finish(&mut self) -> Option<String> {
        let mut leftover = std::mem::take(&mut self.framer.remainder);
        if !self.utf8.pending().is_empty() {
            leftover.push(char::REPLACEMENT_CHARACTER);
            self.utf8.clear();
        }
        (!leftover.is_empty()).then_some(leftover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile_for;

    fn data(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n")
    }

    #[test]
    fn framer_keeps_the_trailing_partial_line() {
        let mut framer = LineFramer::new();

        assert_eq!(framer.push("a\nb\nc"), vec!["a", "b"]);
        assert_eq!(framer.remainder(), "c");
    }

    #[test]
    fn framer_emits_nothing_without_a_newline() {
        let mut framer = LineFramer::new();

        assert!(framer.push("data: {\"partial\":").is_empty());
        assert!(framer.push("").is_empty());
        assert_eq!(framer.remainder(), "data: {\"partial\":");
    }

    #[test]
    fn framer_preserves_the_input() {
        let input = "data: one\r\n\r\ndata: two\n\nda";
        let chunks = ["da", "ta: one\r", "\n\r\nda", "ta: two\n", "\nda"];
        let mut framer = LineFramer::new();

        let mut rebuilt = String::new();
        for chunk in chunks {
            for line in framer.push(chunk) {
                rebuilt.push_str(&line);
                rebuilt.push('\n');
            }
        }
        rebuilt.push_str(framer.remainder());

        assert_eq!(rebuilt, input.replace("\r\n", "\n"));
    }

    #[test]
    fn done_marker_yields_nothing() {
        assert_eq!(classify_line("data: [DONE]"), SseLine::Done);
        assert_eq!(classify_line("data:   [DONE]  "), SseLine::Done);

        let mut decoder = SseDecoder::new(profile_for("openai"));
        assert!(decoder.feed(b"data: [DONE]\n\ndata:  [DONE] \n").is_empty());
    }

    #[test]
    fn line_kinds() {
        assert_eq!(classify_line("data: "), SseLine::Ignored);
        assert_eq!(classify_line(": keep-alive"), SseLine::Ignored);
        assert_eq!(classify_line("event: message"), SseLine::Ignored);
        assert_eq!(classify_line("   "), SseLine::Boundary);
        assert_eq!(classify_line(" {\"a\":1} "), SseLine::Payload("{\"a\":1}"));
    }

    #[test]
    fn malformed_payload_skips_only_that_line() {
        let mut decoder = SseDecoder::new(profile_for("deepseek"));
        let chunk = format!("{}data: {{not json}}\n{}", data("a"), data("b"));

        assert_eq!(decoder.feed(chunk.as_bytes()), vec!["a", "b"]);
    }

    #[test]
    fn bare_json_lines_are_tolerated() {
        let mut decoder = SseDecoder::new(profile_for("custom"));
        let tokens = decoder.feed_str("{\"choices\":[{\"delta\":{\"content\":\"bare\"}}]}\n");

        assert_eq!(tokens, vec!["bare"]);
    }

    #[test]
    fn tokens_split_across_chunks() {
        let mut decoder = SseDecoder::new(profile_for("custom"));

        let first = decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: {\"cho");
        assert_eq!(first, vec!["Hi"]);

        let second =
            decoder.feed(b"ices\":[{\"delta\":{\"content\":\" there\"}}]}\n\ndata: [DONE]\n\n");
        assert_eq!(second, vec![" there"]);

        assert_eq!(decoder.events(), 3);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn blank_line_keeps_the_next_partial_event() {
        let mut decoder = SseDecoder::new(profile_for("qwen"));

        assert!(decoder.feed(b"\n\ndata: {\"choices\":[{\"delta\":").is_empty());
        assert_eq!(decoder.feed(b"{\"content\":\"kept\"}}]}\n"), vec!["kept"]);
    }

    #[test]
    fn split_multibyte_character() {
        let text = data("héllo ✓");
        let bytes = text.as_bytes();
        let split = text.find('✓').unwrap() + 1;

        let mut decoder = SseDecoder::new(profile_for("zhipu"));
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(decoder.feed(&bytes[split..]), vec!["héllo ✓"]);
    }

    #[test]
    fn utf8_decoder_replaces_invalid_bytes() {
        let mut utf8 = Utf8ChunkDecoder::new();

        assert_eq!(utf8.decode(b"ok\xffok"), "ok\u{fffd}ok");
        assert_eq!(utf8.decode(&[0xe2, 0x9c]), "");
        assert_eq!(utf8.pending(), &[0xe2, 0x9c]);
        assert_eq!(utf8.decode(&[0x93, b'!']), "✓!");
        assert!(utf8.pending().is_empty());
    }

    #[test]
    fn finish_reports_unterminated_text() {
        let mut decoder = SseDecoder::new(profile_for("doubao"));
        decoder.feed(b"data: {\"choices\"");

        assert_eq!(decoder.finish().as_deref(), Some("data: {\"choices\""));
        assert_eq!(decoder.finish(), None);
    }
}
