#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Payment-gateway client for paygate
//!
//! This crate turns endpoint calls into fully-specified, signed HTTP
//! request descriptions, executes them through a pluggable transport, and
//! decodes the JSON or XML responses. Each request is a self-contained
//! unit of work: builders may be invoked concurrently and never share
//! mutable state beyond the read-only credential material.

mod builder;
mod client;
mod credentials;
mod decode;
mod download;
mod request;
mod transport;

pub use builder::{RequestBuilder, SERIAL_HEADER};
pub use client::GatewayClient;
pub use credentials::{ConfigCredentials, CredentialProvider};
pub use decode::{decode_json, decode_xml};
pub use download::{DownloadDescriptor, Downloader};
pub use request::SignedRequest;
pub use transport::{HttpTransport, Transport, TransportResponse};
