//! Line Framing for the Sensor Byte Stream

use tracing::trace;

/// Maximum number of bytes held while waiting for a line delimiter
pub const MAX_LINE_LEN: usize = 128;

/// Splits a raw serial byte stream into newline-terminated lines.
///
/// Carriage returns are dropped. When a line grows past [`MAX_LINE_LEN`]
/// without a delimiter, the oldest bytes are discarded so that only the most
/// recent [`MAX_LINE_LEN`] bytes remain. Empty and single-character lines are
/// never emitted. Lines are handed out as raw bytes, never longer than
/// [`MAX_LINE_LEN`]; decoding is left to the record parser.
#[derive(Debug)]
pub struct LineParser {
    holding: Vec<u8>,
}

impl LineParser {
    /// Create a parser with an empty holding buffer
    pub fn new() -> Self {
        Self {
            holding: Vec::with_capacity(MAX_LINE_LEN + 1),
        }
    }

    /// Feed one byte, returning the completed line when a `\n` arrives
    pub fn push_byte(&mut self, byte: u8) -> Option<Vec<u8>> {
        match byte {
            b'\r' => None,
            b'\n' => self.take_line(),
            _ => {
                self.holding.push(byte);
                if self.holding.len() > MAX_LINE_LEN {
                    let excess = self.holding.len() - MAX_LINE_LEN;
                    self.holding.drain(..excess);
                }
                None
            }
        }
    }

    /// Feed a chunk of bytes, handing every completed line to `on_line`
    pub fn feed(&mut self, bytes: &[u8], mut on_line: impl FnMut(&[u8])) {
        for &byte in bytes {
            if let Some(line) = self.push_byte(byte) {
                on_line(&line);
            }
        }
    }

    /// Bytes received since the last delimiter
    pub fn holding(&self) -> &[u8] {
        &self.holding
    }

    /// Discard any partial line
    pub fn clear(&mut self) {
        self.holding.clear();
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        if self.holding.len() <= 1 {
            self.holding.clear();
            return None;
        }

        let line = std::mem::replace(&mut self.holding, Vec::with_capacity(MAX_LINE_LEN + 1));
        trace!("Sensor line: {}", line.escape_ascii());
        Some(line)
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect(parser: &mut LineParser, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        parser.feed(bytes, |line| lines.push(String::from_utf8_lossy(line).into_owned()));
        lines
    }

    #[test]
    fn test_crlf_lines() {
        let mut parser = LineParser::new();
        let lines = collect(&mut parser, b"Z 00421\r\nZ 00430\r\n");
        assert_eq!(lines, vec!["Z 00421", "Z 00430"]);
        assert!(parser.holding().is_empty());
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut parser = LineParser::new();
        assert!(collect(&mut parser, b"Z 00").is_empty());
        assert_eq!(parser.holding(), b"Z 00");

        let lines = collect(&mut parser, b"421\r\nZ");
        assert_eq!(lines, vec!["Z 00421"]);
        assert_eq!(parser.holding(), b"Z");
    }

    #[test]
    fn test_short_lines_ignored() {
        let mut parser = LineParser::new();
        let lines = collect(&mut parser, b"\r\n\nZ\r\nK\nOK\n");
        assert_eq!(lines, vec!["OK"]);
    }

    #[test]
    fn test_overlong_line_keeps_most_recent_bytes() {
        let mut parser = LineParser::new();
        let input: Vec<u8> = (0..200u32).map(|i| b'a' + (i % 26) as u8).collect();

        assert!(collect(&mut parser, &input).is_empty());
        assert_eq!(parser.holding().len(), MAX_LINE_LEN);
        assert_eq!(parser.holding(), &input[200 - MAX_LINE_LEN..]);
    }

    #[test]
    fn test_invalid_utf8_line_stays_within_cap() {
        let mut parser = LineParser::new();
        let mut input = vec![0xFF; 200];
        input.push(b'\n');

        let mut lines = Vec::new();
        parser.feed(&input, |line| lines.push(line.to_vec()));

        assert_eq!(lines, vec![vec![0xFF; MAX_LINE_LEN]]);
        assert!(parser.holding().is_empty());
    }

    #[test]
    fn test_clear_discards_partial_line() {
        let mut parser = LineParser::new();
        collect(&mut parser, b"Z 12");
        parser.clear();
        assert_eq!(collect(&mut parser, b"3\n"), Vec::<String>::new());
    }

    proptest! {
        #[test]
        fn holding_never_exceeds_cap(bytes in prop::collection::vec(any::<u8>(), 0..600)) {
            let mut parser = LineParser::new();
            parser.feed(&bytes, |line| assert!(line.len() <= MAX_LINE_LEN));
            prop_assert!(parser.holding().len() <= MAX_LINE_LEN);
        }

        #[test]
        fn undelimited_input_keeps_tail(bytes in prop::collection::vec(b' '..=b'~', 0..600)) {
            let mut parser = LineParser::new();
            parser.feed(&bytes, |_| panic!("no delimiter was fed"));
            let keep = bytes.len().min(MAX_LINE_LEN);
            prop_assert_eq!(parser.holding(), &bytes[bytes.len() - keep..]);
        }
    }
}
