//! Signed request descriptions

use paygate_canonical::StringParams;
use std::collections::BTreeMap;

/// A fully-specified HTTP request, produced once per call and consumed
/// exactly once by a [`Transport`](crate::Transport).
///
/// `url` is the endpoint path relative to the gateway base URI, without a
/// query string; `query`, when present, is attached by the transport. The
/// signature was computed over the sorted rendering of the same query map,
/// so the two representations must not diverge.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub query: Option<StringParams>,
    pub body: Option<String>,
}

impl SignedRequest {
    /// True for read-only methods whose sign chain carries an empty body.
    #[must_use]
    pub fn is_read_only(method: &str) -> bool {
        method.eq_ignore_ascii_case("get")
    }
}
