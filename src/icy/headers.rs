//! ICY header negotiation
//!
//! A client opts in with `Icy-MetaData: 1`; the server answers with
//! `icy-metaint` so the client knows where frames are placed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::constants::ICY_METAINT;

/// Request header a client sends to ask for in-band metadata
pub static ICY_METADATA: HeaderName = HeaderName::from_static("icy-metadata");

/// Response header advertising the metadata interval
pub static ICY_METAINT_HEADER: HeaderName = HeaderName::from_static("icy-metaint");

/// Whether the request asks for metadata interleaving
pub fn wants_metadata(headers: &HeaderMap) -> bool {
    headers
        .get(&ICY_METADATA)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "1")
}

/// Value for the `icy-metaint` response header
pub fn metaint_value() -> HeaderValue {
    HeaderValue::from(ICY_METAINT)
}
