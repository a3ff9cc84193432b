//! Response decoding error types
//!
//! Decode failures are distinct from transport errors so callers can tell
//! "request failed" apart from "request succeeded but response unparseable".

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("malformed JSON response: {message}")]
    Json { message: String },

    #[error("malformed XML response: {message}")]
    Xml { message: String },

    #[error("gateway returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}
