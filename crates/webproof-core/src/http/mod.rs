//! HTTP/1.x message parsing for transcript redaction.
//!
//! The parser does not interpret HTTP semantics beyond what range computation
//! needs. It splits a raw message into four windows (whole message, info line,
//! header block, body) and reports each as an [`EncodedString`] plus its byte
//! range inside the whole message.
//!
//! The message encoding is taken from the message itself: the `charset`
//! parameter of its `Content-Type` header. A message without one cannot be
//! parsed, because byte offsets would be ambiguous.

use crate::encoding::{EncodedString, Encoding};
use crate::errors::{WebProofError, WebProofResult};
use crate::range::Range;

pub const CRLF: &str = "\r\n";
pub const HEADER_BODY_DELIMITER: &str = "\r\n\r\n";

/// A sub-part of a message and where it sits inside the whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub content: EncodedString,
    pub range: Range,
}

/// One header line located inside the whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    pub name: String,
    pub value: String,
    /// Range of `Name: value\r\n`, trailing CRLF included.
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct ParsedHttpMessage {
    pub encoding: Encoding,
    pub message: MessagePart,
    pub info: MessagePart,
    pub headers: MessagePart,
    pub body: MessagePart,
    info_line: String,
    header_lines: Vec<String>,
}

/// Parse a raw HTTP message (request or response).
pub fn parse_http_message(raw: &str) -> WebProofResult<ParsedHttpMessage> {
    let (head, body) = raw.split_once(HEADER_BODY_DELIMITER).ok_or_else(|| {
        WebProofError::invalid_http_message("missing header/body delimiter", raw)
    })?;

    let mut lines = head.split(CRLF);
    let info_line = lines.next().unwrap_or_default().to_string();
    let header_lines: Vec<String> = lines.map(str::to_string).collect();

    let encoding = discover_encoding(&header_lines, head)?;

    let message = EncodedString::new(raw, encoding);
    let info = EncodedString::new(&info_line, encoding);
    let headers = EncodedString::new(&header_lines.join(CRLF), encoding);
    let body = EncodedString::new(body, encoding);

    let info_range = Range::new(0, info.len());

    let headers_start = message
        .index_of(&headers, info_range.end)?
        .ok_or_else(|| WebProofError::invalid_http_message("header block not found in message", head))?;
    let headers_range = Range::new(headers_start, headers_start + headers.len());

    let body_from = headers_range.end + encoding.encoded_len(HEADER_BODY_DELIMITER);
    let body_start = message
        .index_of(&body, body_from)?
        .ok_or_else(|| WebProofError::invalid_http_message("body not found in message", raw))?;
    let body_range = Range::new(body_start, body_start + body.len());

    Ok(ParsedHttpMessage {
        encoding,
        message: MessagePart {
            range: Range::new(0, message.len()),
            content: message,
        },
        info: MessagePart {
            content: info,
            range: info_range,
        },
        headers: MessagePart {
            content: headers,
            range: headers_range,
        },
        body: MessagePart {
            content: body,
            range: body_range,
        },
        info_line,
        header_lines,
    })
}

/// Find `Content-Type` and read its `charset` parameter.
fn discover_encoding(header_lines: &[String], head: &str) -> WebProofResult<Encoding> {
    let content_type = header_lines
        .iter()
        .find(|line| {
            line.get(..13)
                .map(|p| p.eq_ignore_ascii_case("content-type:"))
                .unwrap_or(false)
        })
        .ok_or_else(|| WebProofError::invalid_http_message("missing Content-Type header", head))?;

    let value = &content_type[13..];
    let charset = value
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, v)| v.trim())
        .ok_or_else(|| WebProofError::invalid_http_message("Content-Type has no charset", content_type))?;

    Encoding::parse(charset).map_err(|_| {
        WebProofError::invalid_http_message(format!("unsupported charset {charset}"), content_type)
    })
}

impl ParsedHttpMessage {
    pub fn info_line(&self) -> &str {
        &self.info_line
    }

    /// Header lines in message order, each with its whole-message range.
    pub fn header_lines(&self) -> Vec<HeaderLine> {
        let mut out = Vec::with_capacity(self.header_lines.len());
        let crlf_len = self.encoding.encoded_len(CRLF);
        let mut cursor = self.headers.range.start;

        for line in &self.header_lines {
            let line_len = self.encoding.encoded_len(line);
            let (name, value) = match line.split_once(':') {
                Some((n, v)) => (n.trim().to_string(), v.trim().to_string()),
                None => (line.trim().to_string(), String::new()),
            };
            // Every header line is followed by CRLF in the message; the last one
            // borrows it from the header/body delimiter.
            out.push(HeaderLine {
                name,
                value,
                range: Range::new(cursor, cursor + line_len + crlf_len),
            });
            cursor += line_len + crlf_len;
        }
        out
    }

    /// Distinct header names, first spelling wins, message order.
    pub fn header_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for h in self.header_lines() {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&h.name)) {
                names.push(h.name);
            }
        }
        names
    }

    /// Request target from the info line and its byte offset in the message.
    ///
    /// Returns `None` for a response status line or a malformed request line.
    pub fn request_target(&self) -> Option<(String, usize)> {
        let mut parts = self.info_line.splitn(3, ' ');
        let method = parts.next()?;
        let target = parts.next()?;
        if method.is_empty() || target.is_empty() || method.starts_with("HTTP/") {
            return None;
        }
        let offset = self.encoding.encoded_len(method) + self.encoding.encoded_len(" ");
        Some((target.to_string(), offset))
    }

    /// Decoded body text.
    pub fn body_text(&self) -> WebProofResult<String> {
        self.body.content.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const REQUEST: &str = "GET /api/me?token=abc&x=1 HTTP/1.1\r\nHost: example.com\r\nContent-Type: application/json; charset=utf-8\r\nAuthorization: Bearer s3cr3t\r\n\r\n{\"a\":1}";

    #[test]
    fn parses_parts_and_ranges() {
        let p = parse_http_message(REQUEST).unwrap();
        assert_eq!(p.encoding, Encoding::Utf8);
        assert_eq!(p.info.range.start, 0);
        assert_eq!(p.info.content.decode().unwrap(), "GET /api/me?token=abc&x=1 HTTP/1.1");

        let headers = &REQUEST[p.headers.range.start..p.headers.range.end];
        assert!(headers.starts_with("Host: example.com"));
        assert!(headers.ends_with("Bearer s3cr3t"));

        assert_eq!(&REQUEST[p.body.range.start..p.body.range.end], "{\"a\":1}");
        assert_eq!(p.message.range, Range::new(0, REQUEST.len()));
    }

    #[test]
    fn header_lines_include_crlf() {
        let p = parse_http_message(REQUEST).unwrap();
        let lines = p.header_lines();
        assert_eq!(lines.len(), 3);
        for l in &lines {
            let text = &REQUEST[l.range.start..l.range.end];
            assert!(text.ends_with("\r\n"), "{text:?}");
            assert!(text.starts_with(&l.name));
        }
        assert_eq!(lines[2].name, "Authorization");
        assert_eq!(lines[2].value, "Bearer s3cr3t");
    }

    #[test]
    fn request_target_offset() {
        let p = parse_http_message(REQUEST).unwrap();
        let (target, offset) = p.request_target().unwrap();
        assert_eq!(target, "/api/me?token=abc&x=1");
        assert_eq!(&REQUEST[offset..offset + target.len()], target);
    }

    #[test]
    fn response_has_no_request_target() {
        let raw = "HTTP/1.1 200 OK\r\ncontent-type: text/plain;charset=UTF-8\r\n\r\nok";
        let p = parse_http_message(raw).unwrap();
        assert!(p.request_target().is_none());
        assert_eq!(p.body_text().unwrap(), "ok");
    }

    #[test]
    fn utf16_ranges_are_in_utf16_bytes() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-16be\r\n\r\nżółw";
        let p = parse_http_message(raw).unwrap();
        assert_eq!(p.encoding, Encoding::Utf16Be);
        assert_eq!(p.body.range.len(), 8);
        assert_eq!(p.body.range.end, p.message.content.len());
        assert_eq!(p.info.range.end, "HTTP/1.1 200 OK".len() * 2);
    }

    #[test]
    fn empty_body_is_allowed() {
        let raw = "GET / HTTP/1.1\r\nContent-Type: text/html; charset=utf-8\r\n\r\n";
        let p = parse_http_message(raw).unwrap();
        assert!(p.body.range.is_empty());
        assert_eq!(p.body.range.start, raw.len());
    }

    #[test]
    fn missing_delimiter_fails() {
        let e = parse_http_message("GET / HTTP/1.1\r\nHost: x\r\n").unwrap_err();
        assert_matches!(e, WebProofError::InvalidHttpMessage { .. });
    }

    #[test]
    fn missing_content_type_fails() {
        let e = parse_http_message("GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap_err();
        assert!(e.to_string().contains("Content-Type"));
    }

    #[test]
    fn unsupported_charset_fails() {
        let raw = "GET / HTTP/1.1\r\nContent-Type: text/html; charset=latin1\r\n\r\n";
        let e = parse_http_message(raw).unwrap_err();
        assert_matches!(e, WebProofError::InvalidHttpMessage { ref fragment, .. } if fragment.contains("latin1"));
    }

    #[test]
    fn missing_charset_fails() {
        let raw = "GET / HTTP/1.1\r\nContent-Type: text/html\r\n\r\n";
        assert!(parse_http_message(raw).is_err());
    }
}
