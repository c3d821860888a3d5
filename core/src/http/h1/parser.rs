/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line and headers via the line scanner, then a
//! Content-Length delimited body.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::error::HttpError;
use crate::http::h1::scanner::{LineScanner, Separator};
use crate::http::response::Response;

/// Callback for parser events. For one exchange: `response_ready` at most once, then
/// `body_chunk` zero or more times, then exactly one `finished`.
pub trait H1ResponseHandler {
    fn response_ready(&mut self, response: Response);
    fn body_chunk(&mut self, data: &[u8]);
    fn finished(&mut self, error: Option<HttpError>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Headers,
    Body,
}

/// Per-response state, replaced wholesale on finish.
#[derive(Debug, Default)]
struct ParseContext {
    version: Option<String>,
    code: Option<u16>,
    headers: HashMap<String, String>,
    expected_length: u64,
    received_length: u64,
}

/// Push parser for HTTP/1.1 responses. Feed bytes via `receive`; the handler is called
/// as the head completes and body bytes arrive.
#[derive(Debug)]
pub struct ResponseParser {
    state: ParseState,
    scanner: LineScanner,
    context: ParseContext,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Headers,
            scanner: LineScanner::new(Separator::crlf()),
            context: ParseContext::default(),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Forget any partially parsed response.
    pub fn reset(&mut self) {
        self.state = ParseState::Headers;
        self.scanner.clear();
        self.context = ParseContext::default();
    }

    /// Consume one inbound chunk.
    pub fn receive<H: H1ResponseHandler>(&mut self, chunk: &[u8], handler: &mut H) {
        match self.state {
            ParseState::Headers => self.receive_head(chunk, handler),
            ParseState::Body => self.receive_body(chunk, handler),
        }
    }

    /// Reset for the next exchange, then deliver the single `finished` event.
    pub fn finish<H: H1ResponseHandler>(&mut self, error: Option<HttpError>, handler: &mut H) {
        self.reset();
        handler.finished(error);
    }

    fn receive_head<H: H1ResponseHandler>(&mut self, chunk: &[u8], handler: &mut H) {
        self.scanner.append(chunk);
        loop {
            let line = match self.scanner.next() {
                Ok(Some(line)) => line,
                Ok(None) => return,
                Err(e) => {
                    warn!(error = %e, "response head is not valid UTF-8");
                    self.finish(Some(e.into()), handler);
                    return;
                }
            };
            if line.is_empty() {
                // Body bytes may have arrived in the same read as the head.
                let leftover = self.scanner.take_remaining();
                self.end_head(handler);
                if self.state == ParseState::Body && !leftover.is_empty() {
                    self.receive_body(&leftover, handler);
                }
                return;
            }
            if let Err(e) = self.parse_head_line(line) {
                warn!(error = %e, "rejecting response");
                self.finish(Some(e), handler);
                return;
            }
        }
    }

    fn parse_head_line(&mut self, line: String) -> Result<(), HttpError> {
        if self.context.code.is_none() {
            let (version, code) = parse_status_line(&line)?;
            self.context.version = Some(version);
            self.context.code = Some(code);
        } else {
            let (name, value) = parse_header_line(&line)?;
            self.context.headers.insert(name, value);
        }
        Ok(())
    }

    fn end_head<H: H1ResponseHandler>(&mut self, handler: &mut H) {
        let (version, code) = match (self.context.version.take(), self.context.code) {
            (Some(version), Some(code)) => (version, code),
            _ => {
                warn!("blank line before status line");
                self.finish(Some(HttpError::MalformedStatusLine(String::new())), handler);
                return;
            }
        };
        let expected = match self.context.headers.get("content-length") {
            None => 0,
            Some(v) => match v.trim().parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    let line = format!("content-length: {}", v);
                    warn!(%line, "unusable content-length");
                    self.finish(Some(HttpError::MalformedHeaderLine(line)), handler);
                    return;
                }
            },
        };
        self.context.expected_length = expected;
        self.context.received_length = 0;
        self.state = ParseState::Body;
        let headers = std::mem::take(&mut self.context.headers);
        handler.response_ready(Response::new(version, code, headers));
        if expected == 0 {
            self.finish(None, handler);
        }
    }

    fn receive_body<H: H1ResponseHandler>(&mut self, chunk: &[u8], handler: &mut H) {
        let remaining = self.context.expected_length - self.context.received_length;
        let take = usize::try_from(remaining).unwrap_or(usize::MAX).min(chunk.len());
        if take < chunk.len() {
            trace!(dropped = chunk.len() - take, "bytes past content-length");
        }
        if take == 0 {
            return;
        }
        self.context.received_length += take as u64;
        handler.body_chunk(&chunk[..take]);
        if self.context.received_length == self.context.expected_length {
            self.finish(None, handler);
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `HTTP/<version> <code> <reason>`: exactly three space-separated fields (the reason may
/// itself contain spaces). Returns version and code.
fn parse_status_line(line: &str) -> Result<(String, u16), HttpError> {
    let malformed = || HttpError::MalformedStatusLine(line.to_string());
    let fields: Vec<&str> = line.splitn(3, ' ').collect();
    if fields.len() != 3 {
        return Err(malformed());
    }
    let protocol: Vec<&str> = fields[0].split('/').collect();
    if protocol.len() != 2 || !protocol[0].eq_ignore_ascii_case("HTTP") {
        return Err(malformed());
    }
    let code = fields[1].parse::<u16>().map_err(|_| malformed())?;
    Ok((protocol[1].to_string(), code))
}

/// `Name: value`, split on the first colon. Name lower-cased, value left-trimmed.
fn parse_header_line(line: &str) -> Result<(String, String), HttpError> {
    match line.split_once(':') {
        Some((name, value)) => Ok((name.to_ascii_lowercase(), value.trim_start().to_string())),
        None => Err(HttpError::MalformedHeaderLine(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Ready(u16, HashMap<String, String>),
        Body(Vec<u8>),
        Finished(Option<String>),
    }

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl H1ResponseHandler for Recorder {
        fn response_ready(&mut self, response: Response) {
            self.0.push(Event::Ready(response.code, response.headers));
        }
        fn body_chunk(&mut self, data: &[u8]) {
            self.0.push(Event::Body(data.to_vec()));
        }
        fn finished(&mut self, error: Option<HttpError>) {
            self.0.push(Event::Finished(error.map(|e| e.to_string())));
        }
    }

    /// Merge adjacent body events so split deliveries compare equal.
    fn normalized(events: Vec<Event>) -> Vec<Event> {
        let mut out: Vec<Event> = Vec::new();
        for e in events {
            if let (Some(Event::Body(prev)), Event::Body(next)) = (out.last_mut(), &e) {
                prev.extend_from_slice(next);
                continue;
            }
            out.push(e);
        }
        out
    }

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const HELLO: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello";

    #[test]
    fn no_content_finishes_without_body() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 204 No Content\r\n\r\n", &mut r);
        assert_eq!(r.0, vec![Event::Ready(204, HashMap::new()), Event::Finished(None)]);
        assert_eq!(p.state(), ParseState::Headers);
    }

    #[test]
    fn two_field_status_line_is_malformed() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200\r\n\r\n", &mut r);
        assert_eq!(r.0.len(), 1);
        assert!(matches!(&r.0[0], Event::Finished(Some(m)) if m.contains("malformed status line")));
    }

    #[test]
    fn bad_protocol_token_and_code() {
        for line in [
            &b"HTTX/1.1 200 OK\r\n"[..],
            &b"HTTP1.1 200 OK\r\n"[..],
            &b"HTTP/1/1 200 OK\r\n"[..],
            &b"HTTP/1.1 abc OK\r\n"[..],
        ] {
            let mut p = ResponseParser::new();
            let mut r = Recorder::default();
            p.receive(line, &mut r);
            assert!(
                matches!(&r.0[..], [Event::Finished(Some(m))] if m.contains("status line")),
                "{:?}",
                String::from_utf8_lossy(line)
            );
        }
    }

    #[test]
    fn protocol_name_is_case_insensitive() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"http/1.0 404 Not Found\r\n\r\n", &mut r);
        assert_eq!(r.0, vec![Event::Ready(404, HashMap::new()), Event::Finished(None)]);
    }

    #[test]
    fn header_without_colon_is_malformed() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200 OK\r\nbogus header\r\n\r\n", &mut r);
        assert!(matches!(&r.0[..], [Event::Finished(Some(m))] if m.contains("header line")));
    }

    #[test]
    fn header_split_on_first_colon_only() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 301 Moved\r\nLocation:   https://x:8443/y\r\n\r\n", &mut r);
        assert_eq!(
            r.0[0],
            Event::Ready(301, headers(&[("location", "https://x:8443/y")]))
        );
    }

    #[test]
    fn header_names_case_folded_last_wins() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(
            b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\nX-A: 1\r\ncontent-length: 5\r\nx-a: 2\r\n\r\nhello",
            &mut r,
        );
        assert_eq!(
            r.0,
            vec![
                Event::Ready(200, headers(&[("content-length", "5"), ("x-a", "2")])),
                Event::Body(b"hello".to_vec()),
                Event::Finished(None),
            ]
        );
    }

    #[test]
    fn split_anywhere_gives_same_events() {
        let mut whole = Recorder::default();
        ResponseParser::new().receive(HELLO, &mut whole);
        let expected = normalized(whole.0);
        assert_eq!(expected.last(), Some(&Event::Finished(None)));
        for at in 0..=HELLO.len() {
            let mut p = ResponseParser::new();
            let mut r = Recorder::default();
            p.receive(&HELLO[..at], &mut r);
            p.receive(&HELLO[at..], &mut r);
            assert_eq!(normalized(r.0), expected, "split at {}", at);
        }
    }

    #[test]
    fn byte_at_a_time() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        for b in HELLO {
            p.receive(std::slice::from_ref(b), &mut r);
        }
        assert_eq!(r.0.iter().filter(|e| matches!(e, Event::Body(_))).count(), 5);
        assert_eq!(r.0.last(), Some(&Event::Finished(None)));
    }

    #[test]
    fn bytes_past_content_length_dropped() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nokEXTRA", &mut r);
        assert_eq!(r.0[1], Event::Body(b"ok".to_vec()));
        assert_eq!(r.0[2], Event::Finished(None));
    }

    #[test]
    fn non_numeric_content_length_rejected() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200 OK\r\nContent-Length: lots\r\n\r\n", &mut r);
        assert!(matches!(&r.0[..], [Event::Finished(Some(m))] if m.contains("header line")));
    }

    #[test]
    fn blank_line_before_status_rejected() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"\r\n", &mut r);
        assert!(matches!(&r.0[..], [Event::Finished(Some(m))] if m.contains("status line")));
    }

    #[test]
    fn invalid_utf8_in_head() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200 OK\r\nX: \xfe\r\n\r\n", &mut r);
        assert!(matches!(&r.0[..], [Event::Finished(Some(m))] if m.contains("cannot parse")));
    }

    #[test]
    fn body_may_be_non_utf8() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\n\xff\x00\xfe", &mut r);
        assert_eq!(r.0[1], Event::Body(vec![0xff, 0x00, 0xfe]));
        assert_eq!(r.0[2], Event::Finished(None));
    }

    #[test]
    fn reusable_after_success_and_failure() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(HELLO, &mut r);
        p.receive(b"garbage\r\n", &mut r);
        p.receive(b"HTTP/1.1 204 No Content\r\n\r\n", &mut r);
        assert_eq!(
            r.0,
            vec![
                Event::Ready(200, headers(&[("content-length", "5")])),
                Event::Body(b"hello".to_vec()),
                Event::Finished(None),
                Event::Finished(Some(
                    "cannot parse response: malformed status line \"garbage\"".to_string()
                )),
                Event::Ready(204, HashMap::new()),
                Event::Finished(None),
            ]
        );
    }

    #[test]
    fn finish_mid_body_resets() {
        let mut p = ResponseParser::new();
        let mut r = Recorder::default();
        p.receive(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc", &mut r);
        assert_eq!(p.state(), ParseState::Body);
        p.finish(Some(HttpError::Transport(None)), &mut r);
        assert_eq!(p.state(), ParseState::Headers);
        p.receive(b"HTTP/1.1 204 No Content\r\n\r\n", &mut r);
        assert_eq!(r.0.last(), Some(&Event::Finished(None)));
        assert_eq!(r.0[r.0.len() - 2], Event::Ready(204, HashMap::new()));
    }
}
