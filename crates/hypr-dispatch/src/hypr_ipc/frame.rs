//! Framing and parsing of the event socket wire format
//!
//! Hyprland writes one event per line as `KIND>>PAYLOAD\n`. A single socket
//! read may contain several lines, and a line may be split across reads, so
//! `FrameDecoder` keeps the unterminated tail of each read until the rest
//! arrives.

use super::error::FrameError;
use crate::event::Event;

/// Separator between event kind and payload
pub const DELIMITER: &str = ">>";

/// Parse one protocol line (without its trailing newline) into an [`Event`]
///
/// The line is split at the first `>>` only, so the payload may itself
/// contain `>>`.
pub fn parse_message(line: &str) -> Result<Event, FrameError> {
    let (kind, payload) = line
        .split_once(DELIMITER)
        .ok_or_else(|| FrameError::MissingDelimiter {
            line: line.to_string(),
        })?;

    if kind.is_empty() {
        return Err(FrameError::EmptyKind {
            line: line.to_string(),
        });
    }

    Ok(Event::new(kind, payload))
}

/// Incremental line splitter for the event stream
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes received after the last newline
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every line completed by them, in order
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<String, FrameError>> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let line = std::str::from_utf8(&self.pending[start..end])
                .map(str::to_owned)
                .map_err(|_| FrameError::InvalidUtf8);
            lines.push(line);
            start = end + 1;
        }

        self.pending.drain(..start);
        lines
    }

    /// Append `bytes` and parse every completed line into an event
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Result<Event, FrameError>> {
        self.feed(bytes)
            .into_iter()
            .map(|line| line.and_then(|line| parse_message(&line)))
            .collect()
    }

    /// Number of buffered bytes still waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partial line, e.g. after the connection was replaced
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(results: Vec<Result<Event, FrameError>>) -> Vec<Event> {
        results.into_iter().filter_map(Result::ok).collect()
    }

    #[test]
    fn test_parse_message_splits_kind_and_payload() {
        let event = parse_message("activewindow>>firefox,Mozilla Firefox").unwrap();
        assert_eq!(event, Event::new("activewindow", "firefox,Mozilla Firefox"));
    }

    #[test]
    fn test_parse_message_splits_on_first_delimiter_only() {
        let event = parse_message("x>>a>>b>>c").unwrap();
        assert_eq!(event.kind, "x");
        assert_eq!(event.payload, "a>>b>>c");
    }

    #[test]
    fn test_parse_message_allows_empty_payload() {
        let event = parse_message("configreloaded>>").unwrap();
        assert_eq!(event, Event::new("configreloaded", ""));
    }

    #[test]
    fn test_parse_message_without_delimiter_is_rejected() {
        assert_eq!(
            parse_message("noise"),
            Err(FrameError::MissingDelimiter {
                line: "noise".to_string()
            })
        );
        // A single '>' is not the delimiter
        assert!(parse_message("workspace>2").is_err());
    }

    #[test]
    fn test_parse_message_with_empty_kind_is_rejected() {
        assert!(matches!(
            parse_message(">>payload"),
            Err(FrameError::EmptyKind { .. })
        ));
    }

    #[test]
    fn test_decode_batched_messages_in_order() {
        let mut decoder = FrameDecoder::new();
        let decoded =
            events(decoder.decode(b"activewindow>>firefox,Mozilla Firefox\nworkspace>>2\n"));

        assert_eq!(
            decoded,
            vec![
                Event::new("activewindow", "firefox,Mozilla Firefox"),
                Event::new("workspace", "2"),
            ]
        );
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_decode_noise_does_not_disturb_neighbours() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.decode(b"workspace>>1\nnoise\nworkspace>>2\n");

        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());
        assert_eq!(
            events(results),
            vec![Event::new("workspace", "1"), Event::new("workspace", "2")]
        );
    }

    #[test]
    fn test_decode_reassembles_line_split_across_reads() {
        let mut decoder = FrameDecoder::new();

        let first = decoder.decode(b"workspace>>1\nactivewin");
        assert_eq!(events(first), vec![Event::new("workspace", "1")]);
        assert_eq!(decoder.pending_len(), "activewin".len());

        let second = decoder.decode(b"dow>>kitty,zsh\n");
        assert_eq!(events(second), vec![Event::new("activewindow", "kitty,zsh")]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_decode_reassembles_multibyte_char_split_across_reads() {
        let mut decoder = FrameDecoder::new();
        let line = "activewindow>>kitty,caf\u{e9}\n".as_bytes();
        let split = line.len() - 2; // inside the two-byte 'é'

        assert!(decoder.decode(&line[..split]).is_empty());
        assert_eq!(
            events(decoder.decode(&line[split..])),
            vec![Event::new("activewindow", "kitty,caf\u{e9}")]
        );
    }

    #[test]
    fn test_decode_invalid_utf8_line_is_dropped() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.decode(b"workspace>>\xff\xfe\nworkspace>>3\n");

        assert_eq!(results[0], Err(FrameError::InvalidUtf8));
        assert_eq!(events(results), vec![Event::new("workspace", "3")]);
    }

    #[test]
    fn test_empty_read_yields_nothing() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"").is_empty());
    }

    #[test]
    fn test_clear_discards_partial_line() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(b"workspace>>");
        decoder.clear();

        assert_eq!(decoder.pending_len(), 0);
        assert_eq!(events(decoder.decode(b"1\n")), vec![]);
    }
}
