//! Wire-size prediction for HTTP/1.1 requests.
//!
//! The capture channel has a fixed capacity. Before anything is sent we
//! reconstruct the request exactly as it will be serialized (absolute-form
//! request line, synthesized `Host`, `Connection: close` and `Content-Length`
//! headers, CRLF line endings) and count its bytes, so an oversized request is
//! reported up front instead of failing mid-capture.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::NotaryLimits;
use crate::errors::{WebProofError, WebProofResult};

const CRLF_SIZE: usize = 2;

/// A request as described by a notarize step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    pub url: String,
    pub method: String,
    /// User headers in insertion order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
}

impl RequestParams {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Byte breakdown of a serialized request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSize {
    pub request_line: usize,
    pub headers: usize,
    pub body: usize,
}

impl RequestSize {
    pub fn total(&self) -> usize {
        self.request_line + self.headers + CRLF_SIZE + self.body
    }
}

/// Headers as they will be sent: defaults first, user values override in place.
pub fn effective_headers(url: &Url, params: &RequestParams) -> WebProofResult<Vec<(String, String)>> {
    let host = url
        .host_str()
        .ok_or_else(|| WebProofError::invalid_url(format!("url has no host: {}", params.url)))?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let content_length = params.body.as_deref().map(str::len).unwrap_or(0);

    let mut headers = vec![
        ("Host".to_string(), host),
        ("Connection".to_string(), "close".to_string()),
        ("Content-Length".to_string(), content_length.to_string()),
    ];

    for (name, value) in &params.headers {
        match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.clone(),
            None => headers.push((name.clone(), value.clone())),
        }
    }
    Ok(headers)
}

/// Compute the byte breakdown of `params` on the wire.
pub fn request_size(params: &RequestParams) -> WebProofResult<RequestSize> {
    let url = Url::parse(&params.url)
        .map_err(|e| WebProofError::invalid_url(format!("{}: {e}", params.url)))?;

    // Fragments never go on the wire.
    let mut target = url.clone();
    target.set_fragment(None);
    let request_line = format!("{} {} HTTP/1.1\r\n", params.method.to_ascii_uppercase(), target.as_str()).len();

    let headers = effective_headers(&url, params)?
        .iter()
        .map(|(n, v)| format!("{n}: {v}\r\n").len())
        .sum();

    let body = params.body.as_deref().map(str::len).unwrap_or(0);

    Ok(RequestSize {
        request_line,
        headers,
        body,
    })
}

/// Total bytes `params` occupies on the wire.
pub fn calculate_request_size(params: &RequestParams) -> WebProofResult<usize> {
    Ok(request_size(params)?.total())
}

/// Fail before any network activity if the request exceeds the notary's capacity.
pub fn ensure_within_capacity(params: &RequestParams, limits: &NotaryLimits) -> WebProofResult<usize> {
    let size = calculate_request_size(params)?;
    if size > limits.max_recv_size {
        tracing::warn!(size, max = limits.max_recv_size, url = %params.url, "request exceeds notary capacity");
        return Err(WebProofError::RequestTooLarge {
            size,
            max: limits.max_recv_size,
        });
    }
    Ok(size)
}
