//! Shared-secret MD5 signing (legacy scheme)

use md5::{Digest, Md5};
use paygate_canonical::StringParams;

/// Compute the legacy signature over sorted `k=v` pairs.
///
/// The digest covers `k1=v1&k2=v2&...&key=SECRET` with keys in ascending
/// order; empty values and any existing `sign` field are excluded. The
/// result is uppercase hex, as the gateway expects. Pure function: same
/// `(params, secret_key)` always yields the same signature.
#[must_use]
pub fn sign_md5(params: &StringParams, secret_key: &str) -> String {
    let joined = params
        .iter()
        .filter(|(key, value)| !value.is_empty() && *key != "sign")
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Md5::new();
    hasher.update(format!("{joined}&key={secret_key}").as_bytes());
    hex::encode(hasher.finalize()).to_uppercase()
}
