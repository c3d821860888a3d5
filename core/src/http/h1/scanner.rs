/*
 * scanner.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pinwire, an HTTP/1.1 client for caller-trusted TLS.
 *
 * Pinwire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pinwire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pinwire.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Incremental line scanner: splits a UTF-8 byte stream on a multi-character separator.
//!
//! Bytes are only buffered by `append`; decoding happens lazily in `next`, one character
//! at a time, so a line (or the separator itself) may straddle any number of appends.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

/// Byte sequence that could not be decoded as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid UTF-8 sequence starting with byte 0x{lead:02x}")]
pub struct DecodeError {
    pub lead: u8,
}

/// Line separator. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator(Vec<char>);

impl Separator {
    /// Returns None for the empty string.
    pub fn new(s: &str) -> Option<Self> {
        if s.is_empty() {
            None
        } else {
            Some(Self(s.chars().collect()))
        }
    }

    pub fn crlf() -> Self {
        Self(vec!['\r', '\n'])
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::crlf()
    }
}

/// Push-fed line tokenizer.
///
/// `string` holds decoded text of the current line, `frame` the last (at most
/// separator-length) decoded characters not yet known to be line content, and `data`
/// the undecoded backlog.
#[derive(Debug)]
pub struct LineScanner {
    separator: Separator,
    string: String,
    frame: VecDeque<char>,
    data: BytesMut,
}

impl LineScanner {
    pub fn new(separator: Separator) -> Self {
        let n = separator.len();
        Self {
            separator,
            string: String::new(),
            frame: VecDeque::with_capacity(n),
            data: BytesMut::new(),
        }
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Buffer raw bytes. No decoding is done here.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Decode up to and including the next separator and return the text before it.
    /// Returns `Ok(None)` when the backlog holds no complete separator yet; partial
    /// text is kept for the next call.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<String>, DecodeError> {
        let n = self.separator.len();
        while let Some((ch, width)) = decode_char(&self.data)? {
            self.data.advance(width);
            self.frame.push_back(ch);
            if self.frame.len() < n {
                continue;
            }
            if self.frame.iter().eq(self.separator.0.iter()) {
                self.frame.clear();
                return Ok(Some(std::mem::take(&mut self.string)));
            }
            if let Some(evicted) = self.frame.pop_front() {
                self.string.push(evicted);
            }
        }
        Ok(None)
    }

    /// Undecoded bytes left in the backlog after the last emitted line.
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the undecoded backlog, leaving it empty.
    pub fn take_remaining(&mut self) -> BytesMut {
        self.data.split()
    }

    /// Drop all buffered state.
    pub fn clear(&mut self) {
        self.string.clear();
        self.frame.clear();
        self.data.clear();
    }
}

impl Default for LineScanner {
    fn default() -> Self {
        Self::new(Separator::crlf())
    }
}

/// Decode the first UTF-8 character of `data`. `Ok(None)` if more bytes are needed.
fn decode_char(data: &[u8]) -> Result<Option<(char, usize)>, DecodeError> {
    let lead = match data.first() {
        Some(&b) => b,
        None => return Ok(None),
    };
    let width = match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Err(DecodeError { lead }),
    };
    // Reject a bad continuation byte as soon as it arrives.
    let available = data.len().min(width);
    if data[1..available].iter().any(|b| b & 0xc0 != 0x80) {
        return Err(DecodeError { lead });
    }
    if data.len() < width {
        return Ok(None);
    }
    match std::str::from_utf8(&data[..width]) {
        Ok(s) => Ok(s.chars().next().map(|c| (c, width))),
        Err(_) => Err(DecodeError { lead }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(scanner: &mut LineScanner) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = scanner.next().unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn splits_on_crlf() {
        let mut s = LineScanner::default();
        s.append(b"first\r\nsecond\r\n");
        assert_eq!(lines(&mut s), vec!["first", "second"]);
        assert!(s.remaining_bytes().is_empty());
    }

    #[test]
    fn empty_line_between_separators() {
        let mut s = LineScanner::default();
        s.append(b"a\r\n\r\nbody");
        assert_eq!(s.next().unwrap().as_deref(), Some("a"));
        assert_eq!(s.next().unwrap().as_deref(), Some(""));
        assert_eq!(s.next().unwrap(), None);
    }

    #[test]
    fn remaining_bytes_after_last_line() {
        let mut s = LineScanner::default();
        s.append(b"head\r\n\r\nhello");
        assert_eq!(lines(&mut s), vec!["head", ""]);
        // The tail was decoded into the frame/string, not left in the backlog.
        let mut s = LineScanner::default();
        s.append(b"head\r\n\r\n");
        assert_eq!(lines(&mut s), vec!["head", ""]);
        s.append(b"hello");
        assert_eq!(s.remaining_bytes(), b"hello");
        assert_eq!(&s.take_remaining()[..], b"hello");
        assert!(s.remaining_bytes().is_empty());
    }

    #[test]
    fn line_stops_at_separator_and_keeps_tail_undecoded() {
        let mut s = LineScanner::default();
        s.append(b"x\r\nyz");
        assert_eq!(s.next().unwrap().as_deref(), Some("x"));
        assert_eq!(s.remaining_bytes(), b"yz");
    }

    #[test]
    fn separator_straddling_appends() {
        let mut s = LineScanner::default();
        s.append(b"status\r");
        assert_eq!(s.next().unwrap(), None);
        s.append(b"\nnext\r\n");
        assert_eq!(lines(&mut s), vec!["status", "next"]);
    }

    #[test]
    fn chunk_boundary_invariance() {
        let text = "héllo wörld";
        let input = format!("{text}\r\n{text}\r\n");
        let bytes = input.as_bytes();
        for size in 1..=bytes.len() {
            let mut s = LineScanner::default();
            let mut out = Vec::new();
            for chunk in bytes.chunks(size) {
                s.append(chunk);
                out.extend(lines(&mut s));
            }
            assert_eq!(out, vec![text, text], "chunk size {size}");
            assert!(s.remaining_bytes().is_empty());
        }
    }

    #[test]
    fn custom_separator() {
        let sep = Separator::new("||").unwrap();
        let mut s = LineScanner::new(sep);
        s.append(b"a|b||c|");
        assert_eq!(s.next().unwrap().as_deref(), Some("a|b"));
        assert_eq!(s.next().unwrap(), None);
        s.append(b"|");
        assert_eq!(s.next().unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn multibyte_separator_character() {
        let sep = Separator::new("¶").unwrap();
        let mut s = LineScanner::new(sep);
        let bytes = "one¶two¶".as_bytes();
        for b in bytes {
            s.append(std::slice::from_ref(b));
        }
        assert_eq!(lines(&mut s), vec!["one", "two"]);
    }

    #[test]
    fn empty_separator_rejected() {
        assert!(Separator::new("").is_none());
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut s = LineScanner::default();
        s.append(b"ok\xff\r\n");
        assert_eq!(s.next(), Err(DecodeError { lead: 0xff }));
    }

    #[test]
    fn bad_continuation_byte_is_an_error() {
        let mut s = LineScanner::default();
        s.append(b"\xc3(");
        assert_eq!(s.next(), Err(DecodeError { lead: 0xc3 }));
    }

    #[test]
    fn incomplete_multibyte_char_waits() {
        let mut s = LineScanner::default();
        let bytes = "é\r\n".as_bytes();
        s.append(&bytes[..1]);
        assert_eq!(s.next().unwrap(), None);
        assert_eq!(s.remaining_bytes(), &bytes[..1]);
        s.append(&bytes[1..]);
        assert_eq!(s.next().unwrap().as_deref(), Some("é"));
    }
}
