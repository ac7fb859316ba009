//! Streaming WARC serializer.
//!
//! One `WarcWriter` owns one output file exclusively. Records are written
//! strictly in call order; the `&mut self` methods and the single buffered
//! stream guarantee that a second record never interleaves bytes with an
//! in-progress one. Every `init`/`end` cycle produces a fresh session: a
//! new warcinfo record id that all subsequent records in the file
//! back-reference via `WARC-Concurrent-To`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use super::records::{
    new_record_id, warc_date, warcinfo_body, RecordHeader, WarcRecordType,
    CONTENT_TYPE_HTTP_REQUEST, CONTENT_TYPE_HTTP_RESPONSE, CONTENT_TYPE_WARC_FIELDS,
};

/// Streaming writer for one `.warc` file.
#[derive(Debug)]
pub struct WarcWriter {
    out: BufWriter<File>,
    path: PathBuf,
    session_id: String,
    session_date: String,
    records_written: usize,
}

impl WarcWriter {
    /// Open the output file (append or truncate-create) and start a fresh
    /// session. Append mode reuses the byte stream but still gets its own
    /// warcinfo/session; sessions appended to one file are never merged.
    pub async fn init(path: &Path, appending: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create archive directory {}", parent.display()))?;
        }
        let file = if appending {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .await
        }
        .with_context(|| format!("Failed to open WARC file {}", path.display()))?;

        let session_id = new_record_id();
        let session_date = warc_date(Utc::now());
        debug!(
            target: "warcforge::warc",
            "WARC session {} opened on {} (append={})",
            session_id,
            path.display(),
            appending
        );

        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
            session_id,
            session_date,
            records_written: 0,
        })
    }

    /// The warcinfo record id every other record in this file points at.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Write the session's warcinfo record. Must be the first record
    /// written after `init`.
    pub async fn write_warcinfo(
        &mut self,
        version: &str,
        is_part_of: &str,
        description: &str,
        user_agent: &str,
    ) -> Result<()> {
        let body = warcinfo_body(version, is_part_of, description, user_agent);
        let filename = self
            .path
            .file_name()
            .and_then(|f| f.to_str())
            .map(String::from);
        let session_id = self.session_id.clone();
        let date = self.session_date.clone();
        let header = RecordHeader {
            record_type: WarcRecordType::Warcinfo,
            record_id: &session_id,
            date: &date,
            target_uri: None,
            concurrent_to: None,
            filename: filename.as_deref(),
            content_type: CONTENT_TYPE_WARC_FIELDS,
            content_length: body.len(),
        };
        self.write_record(&header.to_bytes(), &body).await
    }

    /// Write a metadata record carrying the page's pre-formatted outlinks
    /// text (one annotated line per discovered link).
    pub async fn write_metadata_outlinks(
        &mut self,
        target_uri: &str,
        outlinks_text: &str,
    ) -> Result<()> {
        let body = outlinks_text.as_bytes().to_vec();
        let record_id = new_record_id();
        let date = warc_date(Utc::now());
        let session_id = self.session_id.clone();
        let header = RecordHeader {
            record_type: WarcRecordType::Metadata,
            record_id: &record_id,
            date: &date,
            target_uri: Some(target_uri),
            concurrent_to: Some(&session_id),
            filename: None,
            content_type: CONTENT_TYPE_WARC_FIELDS,
            content_length: body.len(),
        };
        self.write_record(&header.to_bytes(), &body).await
    }

    /// Write a request record. The content block is the serialized HTTP
    /// head plus the optional body; `Content-Length` is measured on the
    /// final bytes, never estimated.
    pub async fn write_request_record(
        &mut self,
        target_uri: &str,
        http_header_text: &str,
        body: Option<&[u8]>,
    ) -> Result<()> {
        self.write_http_record(WarcRecordType::Request, target_uri, http_header_text, body)
            .await
    }

    /// Write a response record; framing as for request records.
    pub async fn write_response_record(
        &mut self,
        target_uri: &str,
        http_header_text: &str,
        body: Option<&[u8]>,
    ) -> Result<()> {
        self.write_http_record(WarcRecordType::Response, target_uri, http_header_text, body)
            .await
    }

    async fn write_http_record(
        &mut self,
        record_type: WarcRecordType,
        target_uri: &str,
        http_header_text: &str,
        body: Option<&[u8]>,
    ) -> Result<()> {
        let mut content = Vec::with_capacity(
            http_header_text.len() + body.map_or(0, <[u8]>::len),
        );
        content.extend_from_slice(http_header_text.as_bytes());
        if let Some(body) = body {
            content.extend_from_slice(body);
        }
        let content_type = match record_type {
            WarcRecordType::Request => CONTENT_TYPE_HTTP_REQUEST,
            _ => CONTENT_TYPE_HTTP_RESPONSE,
        };
        let record_id = new_record_id();
        let date = warc_date(Utc::now());
        let session_id = self.session_id.clone();
        let header = RecordHeader {
            record_type,
            record_id: &record_id,
            date: &date,
            target_uri: Some(target_uri),
            concurrent_to: Some(&session_id),
            filename: None,
            content_type,
            content_length: content.len(),
        };
        self.write_record(&header.to_bytes(), &content).await
    }

    async fn write_record(&mut self, header: &[u8], content: &[u8]) -> Result<()> {
        self.out
            .write_all(header)
            .await
            .context("Failed to write WARC record header")?;
        self.out
            .write_all(content)
            .await
            .context("Failed to write WARC record content")?;
        self.out
            .write_all(b"\r\n\r\n")
            .await
            .context("Failed to write WARC record separator")?;
        self.records_written += 1;
        Ok(())
    }

    /// Flush and close the stream. Consumes the writer; exactly one
    /// completion or error per `init`/`end` cycle.
    pub async fn end(mut self) -> Result<()> {
        self.out
            .flush()
            .await
            .context("Failed to flush WARC output stream")?;
        self.out
            .get_ref()
            .sync_all()
            .await
            .context("Failed to sync WARC file to disk")?;
        info!(
            target: "warcforge::warc",
            "Closed {} with {} record(s)",
            self.path.display(),
            self.records_written
        );
        Ok(())
    }
}
