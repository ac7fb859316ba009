//! WARC 1.0 record header construction.
//!
//! A record on disk is a CRLF-terminated header block, a blank line, the
//! content block, and a double CRLF separator. `Content-Length` must equal
//! the exact byte length of the content block; a mismatch corrupts the
//! archive for any compliant reader.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

pub const WARC_VERSION_LINE: &str = "WARC/1.0";
pub const WARC_CONFORMS_TO: &str =
    "http://bibnum.bnf.fr/WARC/WARC_ISO_28500_version1_latestdraft.pdf";
pub const WARC_FORMAT: &str = "WARC File Format 1.0";

pub const CONTENT_TYPE_WARC_FIELDS: &str = "application/warc-fields";
pub const CONTENT_TYPE_HTTP_REQUEST: &str = "application/http; msgtype=request";
pub const CONTENT_TYPE_HTTP_RESPONSE: &str = "application/http; msgtype=response";

/// The record types this writer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarcRecordType {
    Warcinfo,
    Metadata,
    Request,
    Response,
}

impl WarcRecordType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warcinfo => "warcinfo",
            Self::Metadata => "metadata",
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// A fresh `WARC-Record-ID` value in `<urn:uuid:...>` form.
#[must_use]
pub fn new_record_id() -> String {
    format!("<urn:uuid:{}>", Uuid::new_v4())
}

/// A `WARC-Date` value: UTC ISO-8601 with second precision.
#[must_use]
pub fn warc_date(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Field values for one record's header block.
#[derive(Debug)]
pub struct RecordHeader<'a> {
    pub record_type: WarcRecordType,
    pub record_id: &'a str,
    pub date: &'a str,
    /// `WARC-Target-URI`; omitted for warcinfo.
    pub target_uri: Option<&'a str>,
    /// `WARC-Concurrent-To` back-reference to the session's warcinfo
    /// record id; omitted for the warcinfo record itself.
    pub concurrent_to: Option<&'a str>,
    /// `WARC-Filename`; set on warcinfo only.
    pub filename: Option<&'a str>,
    pub content_type: &'a str,
    pub content_length: usize,
}

impl RecordHeader<'_> {
    /// Serialize the header block, including the blank line that
    /// terminates it.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(256);
        let _ = writeln_crlf(&mut out, WARC_VERSION_LINE);
        let _ = write!(out, "WARC-Type: {}\r\n", self.record_type.as_str());
        if let Some(uri) = self.target_uri {
            let _ = write!(out, "WARC-Target-URI: {uri}\r\n");
        }
        let _ = write!(out, "WARC-Date: {}\r\n", self.date);
        if let Some(concurrent) = self.concurrent_to {
            let _ = write!(out, "WARC-Concurrent-To: {concurrent}\r\n");
        }
        if let Some(filename) = self.filename {
            let _ = write!(out, "WARC-Filename: {filename}\r\n");
        }
        let _ = write!(out, "WARC-Record-ID: {}\r\n", self.record_id);
        let _ = write!(out, "Content-Type: {}\r\n", self.content_type);
        let _ = write!(out, "Content-Length: {}\r\n", self.content_length);
        out.push_str("\r\n");
        out.into_bytes()
    }
}

fn writeln_crlf(out: &mut String, line: &str) -> std::fmt::Result {
    write!(out, "{line}\r\n")
}

/// Build the `application/warc-fields` body of a warcinfo record.
#[must_use]
pub fn warcinfo_body(
    version: &str,
    is_part_of: &str,
    description: &str,
    user_agent: &str,
) -> Vec<u8> {
    let mut body = String::with_capacity(256);
    let _ = write!(body, "software: warcforge/{version}\r\n");
    let _ = write!(body, "format: {WARC_FORMAT}\r\n");
    let _ = write!(body, "conformsTo: {WARC_CONFORMS_TO}\r\n");
    let _ = write!(body, "isPartOf: {is_part_of}\r\n");
    let _ = write!(body, "description: {description}\r\n");
    body.push_str("robots: ignore\r\n");
    let _ = write!(body, "http-header-user-agent: {user_agent}\r\n");
    body.into_bytes()
}
