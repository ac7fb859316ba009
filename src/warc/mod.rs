//! WARC 1.0 serialization: record framing, HTTP head reconstruction, file
//! naming, and the streaming writer.

pub mod http_headers;
pub mod naming;
pub mod records;
pub mod writer;

pub use http_headers::{request_head, response_head};
pub use naming::{warc_path_fixed, warc_path_for_url};
pub use records::{WarcRecordType, WARC_VERSION_LINE};
pub use writer::WarcWriter;
