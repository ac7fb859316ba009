//! In-memory capture buffer for HTTP transactions observed during one
//! navigation.
//!
//! The monitor passively indexes CDP network events by request id and is
//! tolerant of the protocol's known anomalies: request ids reused for
//! redirect hops, responses arriving before a usable request event, and
//! multiple responses under one id. Outside callers may only read;
//! insertion happens exclusively through the two event handlers, so every
//! buffered transaction is backed by a real observed protocol event.

use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived, Headers, Response,
};
use log::{debug, trace};
use serde_json::Value;

/// A field that is usually a single value but can be promoted to an
/// ordered list when the protocol delivers more than one occurrence for
/// the same request id.
#[derive(Debug, Clone)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Append a value, promoting `One` to `Many` on the second occurrence.
    /// Arrival order is preserved.
    pub fn push(&mut self, value: T) {
        if let Self::Many(items) = self {
            items.push(value);
            return;
        }
        let prev = std::mem::replace(self, Self::Many(Vec::with_capacity(2)));
        if let (Self::Many(items), Self::One(first)) = (&mut *self, prev) {
            items.push(first);
            items.push(value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last value in arrival order.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(items) => items.last(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        match self {
            Self::One(value) => std::slice::from_ref(value).iter(),
            Self::Many(items) => items.iter(),
        }
    }
}

/// Redirect hop metadata lifted from a `redirectResponse` CDP field.
#[derive(Debug, Clone)]
pub struct RedirectInfo {
    pub url: String,
    pub status: i64,
    pub status_text: String,
    pub headers: Value,
    pub headers_text: Option<String>,
}

impl RedirectInfo {
    fn from_response(response: &Response) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.inner().clone(),
            // CDP removed Network.Response.headersText; the binding has no
            // such field, so event-sourced records never carry raw text.
            headers_text: None,
        }
    }
}

/// Response metadata for one observed response event.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub status: i64,
    pub status_text: String,
    pub headers: Value,
    pub headers_text: Option<String>,
    pub protocol: Option<String>,
}

impl CapturedResponse {
    fn from_response(response: &Response) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.inner().clone(),
            // CDP removed Network.Response.headersText; see RedirectInfo.
            headers_text: None,
            protocol: response.protocol.clone(),
        }
    }
}

/// One logical HTTP transaction, keyed by the transport-assigned request
/// id. Built up in place as events for the same id arrive.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_id: String,
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Value>,
    pub post_data: Option<String>,
    pub redirects: Option<OneOrMany<RedirectInfo>>,
    pub responses: Option<OneOrMany<CapturedResponse>>,
}

impl CapturedRequest {
    fn from_request_event(id: String, event: &EventRequestWillBeSent) -> Self {
        Self {
            request_id: id,
            url: Some(event.request.url.clone()),
            method: Some(event.request.method.clone()),
            headers: Some(event.request.headers.inner().clone()),
            post_data: event.request.post_data.clone(),
            redirects: None,
            responses: None,
        }
    }

    fn response_only(id: String, response: CapturedResponse) -> Self {
        Self {
            request_id: id,
            url: None,
            method: None,
            headers: None,
            post_data: None,
            redirects: None,
            responses: Some(OneOrMany::One(response)),
        }
    }

    /// A record that carries its own request fields (as opposed to one
    /// synthesized from a response-only event).
    #[must_use]
    pub fn has_request_fields(&self) -> bool {
        self.url.is_some() && self.method.is_some()
    }

    /// Latest response in arrival order, if any was observed.
    #[must_use]
    pub fn latest_response(&self) -> Option<&CapturedResponse> {
        self.responses.as_ref().and_then(OneOrMany::latest)
    }

    fn attach_redirect(&mut self, info: RedirectInfo) {
        match &mut self.redirects {
            Some(chain) => chain.push(info),
            None => self.redirects = Some(OneOrMany::One(info)),
        }
    }

    fn attach_response(&mut self, response: CapturedResponse) {
        match &mut self.responses {
            Some(list) => list.push(response),
            None => self.responses = Some(OneOrMany::One(response)),
        }
    }

    /// Backfill request fields from response-level data: HTTP/2 sends the
    /// method and target as pseudo-headers on the request headers of the
    /// response event.
    fn backfill_from_response(&mut self, response: &Response) {
        if self.url.is_none() {
            self.url = Some(response.url.clone());
        }
        if let Some(request_headers) = &response.request_headers {
            let headers = request_headers.inner();
            if self.method.is_none() {
                if let Some(method) = headers.get(":method").and_then(Value::as_str) {
                    self.method = Some(method.to_string());
                }
            }
            if self.headers.is_none() {
                self.headers = Some(headers.clone());
            }
        }
    }
}

/// Append-only index of captured transactions in insertion order.
///
/// The only mutators are the two `pub(crate)` event handlers driven by the
/// orchestrator's event pump; everything public is read-only.
#[derive(Debug, Default)]
pub struct RequestMonitor {
    capturing: bool,
    entries: Vec<CapturedRequest>,
    index: std::collections::HashMap<String, usize>,
}

impl RequestMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a capture window, optionally clearing records from the
    /// previous navigation.
    pub fn start_capturing(&mut self, clear: bool) {
        if clear {
            self.entries.clear();
            self.index.clear();
        }
        self.capturing = true;
    }

    /// Close the capture window; subsequent events are ignored until the
    /// next `start_capturing`.
    pub fn stop_capturing(&mut self) {
        self.capturing = false;
        debug!(
            target: "warcforge::monitor",
            "Capture stopped with {} transaction(s) buffered",
            self.entries.len()
        );
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captured transactions in insertion order. Only meaningful after
    /// `stop_capturing()`; while capturing, new entries may still append.
    pub fn iter(&self) -> impl Iterator<Item = &CapturedRequest> {
        self.entries.iter()
    }

    pub(crate) fn on_request_will_be_sent(&mut self, event: &EventRequestWillBeSent) {
        if !self.capturing {
            return;
        }
        let id = event.request_id.inner().to_string();

        let Some(&slot) = self.index.get(&id) else {
            let mut record = CapturedRequest::from_request_event(id.clone(), event);
            if let Some(redirect) = &event.redirect_response {
                record.attach_redirect(RedirectInfo::from_response(redirect));
            }
            self.insert(id, record);
            return;
        };

        if let Some(redirect) = &event.redirect_response {
            // The id is being reused for a redirect hop: extend the chain
            // and keep the latest request fields, which describe the hop
            // actually being fetched now.
            let record = &mut self.entries[slot];
            record.attach_redirect(RedirectInfo::from_response(redirect));
            record.url = Some(event.request.url.clone());
            record.method = Some(event.request.method.clone());
            record.headers = Some(event.request.headers.inner().clone());
            if event.request.post_data.is_some() {
                record.post_data = event.request.post_data.clone();
            }
            return;
        }

        if !self.entries[slot].has_request_fields() {
            // The response arrived first under this id; fill in the real
            // request fields instead of creating a duplicate.
            trace!(target: "warcforge::monitor", "Backfilling late request event for {id}");
            let record = &mut self.entries[slot];
            record.url = Some(event.request.url.clone());
            record.method = Some(event.request.method.clone());
            record.headers = Some(event.request.headers.inner().clone());
            record.post_data = event.request.post_data.clone();
            return;
        }

        // A genuinely new logical request reusing a completed id; store it
        // under a disambiguated key so neither record is lost.
        let disambiguated = format!("{id}#{}", uuid::Uuid::new_v4().simple());
        debug!(
            target: "warcforge::monitor",
            "Duplicate request id {id}, storing as {disambiguated}"
        );
        let record = CapturedRequest::from_request_event(disambiguated.clone(), event);
        self.insert(disambiguated, record);
    }

    pub(crate) fn on_response_received(&mut self, event: &EventResponseReceived) {
        if !self.capturing {
            return;
        }
        let id = event.request_id.inner().to_string();
        let response = CapturedResponse::from_response(&event.response);

        match self.index.get(&id) {
            Some(&slot) => {
                let record = &mut self.entries[slot];
                record.attach_response(response);
                if !record.has_request_fields() {
                    record.backfill_from_response(&event.response);
                }
            }
            None => {
                let mut record = CapturedRequest::response_only(id.clone(), response);
                record.backfill_from_response(&event.response);
                self.insert(id, record);
            }
        }
    }

    fn insert(&mut self, key: String, record: CapturedRequest) {
        self.index.insert(key, self.entries.len());
        self.entries.push(record);
    }
}

/// Convenience for pulling a single header value out of a CDP headers
/// object regardless of key casing.
#[must_use]
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    let map = headers.inner().as_object()?;
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_event(id: &str, url: &str, redirect_from: Option<&str>) -> EventRequestWillBeSent {
        let mut value = json!({
            "requestId": id,
            "loaderId": "loader-1",
            "documentURL": url,
            "request": {
                "url": url,
                "method": "GET",
                "headers": { "Accept": "text/html" },
                "initialPriority": "VeryHigh",
                "referrerPolicy": "strict-origin-when-cross-origin"
            },
            "timestamp": 1000.0,
            "wallTime": 1_700_000_000.0,
            "initiator": { "type": "other" },
            "redirectHasExtraInfo": false
        });
        if let Some(from) = redirect_from {
            value["redirectResponse"] = response_json(from, 301);
        }
        serde_json::from_value(value).expect("valid requestWillBeSent event")
    }

    fn response_json(url: &str, status: i64) -> serde_json::Value {
        json!({
            "url": url,
            "status": status,
            "statusText": if status == 301 { "Moved Permanently" } else { "OK" },
            "headers": { "Content-Type": "text/html" },
            "mimeType": "text/html",
            "connectionReused": false,
            "connectionId": 7,
            "encodedDataLength": 1234,
            "securityState": "secure",
            "protocol": "h2",
            "charset": "utf-8"
        })
    }

    fn response_event(id: &str, url: &str, status: i64) -> EventResponseReceived {
        let value = json!({
            "requestId": id,
            "loaderId": "loader-1",
            "timestamp": 1001.0,
            "type": "Document",
            "response": response_json(url, status),
            "hasExtraInfo": false
        });
        serde_json::from_value(value).expect("valid responseReceived event")
    }

    fn capturing_monitor() -> RequestMonitor {
        let mut monitor = RequestMonitor::new();
        monitor.start_capturing(true);
        monitor
    }

    #[test]
    fn events_outside_capture_window_are_ignored() {
        let mut monitor = RequestMonitor::new();
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/", None));
        assert!(monitor.is_empty());

        monitor.start_capturing(true);
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/", None));
        monitor.stop_capturing();
        monitor.on_request_will_be_sent(&request_event("2", "https://example.com/b", None));
        assert_eq!(monitor.len(), 1);
    }

    #[test]
    fn start_capturing_with_clear_discards_previous_navigation() {
        let mut monitor = capturing_monitor();
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/", None));
        monitor.stop_capturing();

        monitor.start_capturing(true);
        assert!(monitor.is_empty());
    }

    #[test]
    fn request_then_response_forms_one_transaction() {
        let mut monitor = capturing_monitor();
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/", None));
        monitor.on_response_received(&response_event("1", "https://example.com/", 200));

        assert_eq!(monitor.len(), 1);
        let record = monitor.iter().next().expect("one record");
        assert_eq!(record.url.as_deref(), Some("https://example.com/"));
        assert_eq!(record.method.as_deref(), Some("GET"));
        let response = record.latest_response().expect("response attached");
        assert_eq!(response.status, 200);
        assert_eq!(response.protocol.as_deref(), Some("h2"));
    }

    #[test]
    fn redirect_reuse_extends_chain_instead_of_duplicating() {
        let mut monitor = capturing_monitor();
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/old", None));
        monitor.on_request_will_be_sent(&request_event(
            "1",
            "https://example.com/new",
            Some("https://example.com/old"),
        ));

        assert_eq!(monitor.len(), 1);
        let record = monitor.iter().next().expect("one record");
        assert_eq!(record.url.as_deref(), Some("https://example.com/new"));
        let chain = record.redirects.as_ref().expect("redirect chain");
        assert_eq!(chain.len(), 1);
        assert_eq!(
            chain.latest().expect("hop").url,
            "https://example.com/old"
        );
    }

    #[test]
    fn second_redirect_hop_promotes_chain_to_many() {
        let mut monitor = capturing_monitor();
        monitor.on_request_will_be_sent(&request_event("1", "https://a.example/", None));
        monitor.on_request_will_be_sent(&request_event(
            "1",
            "https://b.example/",
            Some("https://a.example/"),
        ));
        monitor.on_request_will_be_sent(&request_event(
            "1",
            "https://c.example/",
            Some("https://b.example/"),
        ));

        let record = monitor.iter().next().expect("one record");
        let chain = record.redirects.as_ref().expect("redirect chain");
        assert_eq!(chain.len(), 2);
        let hops: Vec<&str> = chain.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(hops, ["https://a.example/", "https://b.example/"]);
    }

    #[test]
    fn response_before_request_backfills_from_pseudo_headers() {
        let mut monitor = capturing_monitor();
        let mut value = json!({
            "requestId": "9",
            "loaderId": "loader-1",
            "timestamp": 1001.0,
            "type": "Document",
            "response": response_json("https://example.com/push", 200),
            "hasExtraInfo": false
        });
        value["response"]["requestHeaders"] = json!({
            ":method": "GET",
            ":path": "/push",
            ":authority": "example.com"
        });
        let event: EventResponseReceived =
            serde_json::from_value(value).expect("valid responseReceived event");
        monitor.on_response_received(&event);

        assert_eq!(monitor.len(), 1);
        let record = monitor.iter().next().expect("one record");
        assert_eq!(record.url.as_deref(), Some("https://example.com/push"));
        assert_eq!(record.method.as_deref(), Some("GET"));
        assert!(record.has_request_fields());
    }

    #[test]
    fn late_request_fills_synthesized_record_without_duplicate() {
        let mut monitor = capturing_monitor();
        monitor.on_response_received(&response_event("9", "https://example.com/", 200));
        monitor.on_request_will_be_sent(&request_event("9", "https://example.com/", None));

        assert_eq!(monitor.len(), 1);
        let record = monitor.iter().next().expect("one record");
        assert!(record.has_request_fields());
        assert!(record.latest_response().is_some());
    }

    #[test]
    fn duplicate_id_without_redirect_gets_disambiguated() {
        let mut monitor = capturing_monitor();
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/a", None));
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/b", None));

        assert_eq!(monitor.len(), 2);
        let ids: Vec<&str> = monitor.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids[0], "1");
        assert!(ids[1].starts_with("1#"));
    }

    #[test]
    fn multiple_responses_promote_to_many() {
        let mut monitor = capturing_monitor();
        monitor.on_request_will_be_sent(&request_event("1", "https://example.com/", None));
        monitor.on_response_received(&response_event("1", "https://example.com/", 304));
        monitor.on_response_received(&response_event("1", "https://example.com/", 200));

        let record = monitor.iter().next().expect("one record");
        let responses = record.responses.as_ref().expect("responses");
        assert_eq!(responses.len(), 2);
        assert_eq!(record.latest_response().expect("latest").status, 200);
    }

    #[test]
    fn header_value_lookup_is_case_insensitive() {
        let event = request_event("1", "https://example.com/", None);
        let headers = &event.request.headers;
        assert_eq!(header_value(headers, "accept"), Some("text/html"));
        assert_eq!(header_value(headers, "ACCEPT"), Some("text/html"));
        assert_eq!(header_value(headers, "cookie"), None);
    }

    #[test]
    fn one_or_many_push_preserves_order() {
        let mut value = OneOrMany::One(1);
        assert_eq!(value.len(), 1);
        value.push(2);
        value.push(3);
        assert_eq!(value.len(), 3);
        let items: Vec<i32> = value.iter().copied().collect();
        assert_eq!(items, [1, 2, 3]);
        assert_eq!(value.latest(), Some(&3));
    }
}
