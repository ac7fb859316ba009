//! Reconstruction of HTTP message heads from captured transactions.
//!
//! WARC request/response records carry the HTTP header block verbatim.
//! When the browser observed HTTP/1.x it usually hands us the raw
//! `headersText`, which we pass through untouched; for HTTP/2 (or when the
//! raw text is missing) the head is rebuilt from the structured header map
//! in HTTP/1.1 style, skipping the `:`-prefixed pseudo-headers.

use serde_json::Value;
use url::Url;

use crate::request_monitor::{CapturedRequest, CapturedResponse};

/// HTTP version token for the reconstructed status/request line.
fn http_version(protocol: Option<&str>) -> &'static str {
    match protocol {
        Some("h2") | Some("http/2") | Some("http/2.0") => "HTTP/2",
        Some("http/1.0") => "HTTP/1.0",
        _ => "HTTP/1.1",
    }
}

fn append_header_map(out: &mut String, headers: &Value) {
    if let Some(map) = headers.as_object() {
        for (name, value) in map {
            if name.starts_with(':') {
                continue;
            }
            // CDP folds repeated headers into one newline-joined value.
            if let Some(text) = value.as_str() {
                for line in text.split('\n') {
                    out.push_str(name);
                    out.push_str(": ");
                    out.push_str(line);
                    out.push_str("\r\n");
                }
            }
        }
    }
}

/// Request-target in origin form (path + query) for the request line.
fn request_target(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let mut target = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                target.push('?');
                target.push_str(query);
            }
            target
        }
        Err(_) => "/".to_string(),
    }
}

/// Serialize the HTTP request head for a captured transaction.
///
/// Returns `None` when the record never gained request fields (nothing
/// trustworthy to archive as a request).
#[must_use]
pub fn request_head(record: &CapturedRequest) -> Option<String> {
    let url = record.url.as_deref()?;
    let method = record.method.as_deref()?;
    let protocol = record
        .latest_response()
        .and_then(|r| r.protocol.as_deref());

    let mut head = String::with_capacity(256);
    head.push_str(method);
    head.push(' ');
    head.push_str(&request_target(url));
    head.push(' ');
    head.push_str(http_version(protocol));
    head.push_str("\r\n");

    let mut wrote_host = false;
    if let Some(headers) = &record.headers {
        if let Some(map) = headers.as_object() {
            wrote_host = map.keys().any(|k| k.eq_ignore_ascii_case("host"));
        }
        append_header_map(&mut head, headers);
    }
    if !wrote_host {
        if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
            head.push_str("Host: ");
            head.push_str(&host);
            head.push_str("\r\n");
        }
    }
    head.push_str("\r\n");
    Some(head)
}

/// Serialize the HTTP response head for one captured response.
///
/// Prefers the browser-provided raw `headersText`; falls back to
/// rebuilding from the structured header map.
#[must_use]
pub fn response_head(response: &CapturedResponse) -> String {
    if let Some(text) = &response.headers_text {
        if !text.is_empty() {
            // Raw heads from the wire already terminate with CRLF CRLF.
            if text.ends_with("\r\n\r\n") {
                return text.clone();
            }
            let mut head = text.trim_end_matches(['\r', '\n']).to_string();
            head.push_str("\r\n\r\n");
            return head;
        }
    }

    let mut head = String::with_capacity(256);
    head.push_str(http_version(response.protocol.as_deref()));
    head.push(' ');
    head.push_str(&response.status.to_string());
    if !response.status_text.is_empty() {
        head.push(' ');
        head.push_str(&response.status_text);
    }
    head.push_str("\r\n");
    append_header_map(&mut head, &response.headers);
    head.push_str("\r\n");
    head
}
