//! Response decoding
//!
//! Current-scheme endpoints answer JSON, legacy endpoints answer flat XML.
//! A malformed body is a [`DecodeError`], never a transport error, so
//! callers can tell "request failed" from "response unparseable".

use crate::transport::TransportResponse;
use paygate_canonical::{from_xml, StringParams};
use paygate_errors::{DecodeError, Error};
use serde::de::DeserializeOwned;

/// Decode a JSON response body into a typed shape.
///
/// # Errors
///
/// Returns [`DecodeError::UnexpectedStatus`] for non-2xx responses and
/// [`DecodeError::Json`] when the body does not parse.
pub fn decode_json<T: DeserializeOwned>(response: &TransportResponse) -> Result<T, Error> {
    check_status(response)?;
    serde_json::from_slice(&response.body).map_err(|e| {
        DecodeError::Json {
            message: e.to_string(),
        }
        .into()
    })
}

/// Decode a flat XML response body into a parameter map.
///
/// # Errors
///
/// Returns [`DecodeError::UnexpectedStatus`] for non-2xx responses and
/// [`DecodeError::Xml`] when the body does not parse.
pub fn decode_xml(response: &TransportResponse) -> Result<StringParams, Error> {
    check_status(response)?;
    let body = std::str::from_utf8(&response.body).map_err(|e| DecodeError::Xml {
        message: e.to_string(),
    })?;
    from_xml(body)
}

fn check_status(response: &TransportResponse) -> Result<(), Error> {
    if response.is_success() {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedStatus {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize)]
    struct OrderStatus {
        trade_state: String,
    }

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            headers: BTreeMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn test_decode_json_typed() {
        let decoded: OrderStatus =
            decode_json(&response(200, r#"{"trade_state":"SUCCESS"}"#)).unwrap();
        assert_eq!(decoded.trade_state, "SUCCESS");
    }

    #[test]
    fn test_decode_json_malformed_is_decode_error() {
        let result: Result<OrderStatus, _> = decode_json(&response(200, "{not json"));
        assert!(matches!(
            result,
            Err(Error::Decode(DecodeError::Json { .. }))
        ));
    }

    #[test]
    fn test_decode_xml_flat_body() {
        let params = decode_xml(&response(
            200,
            "<xml><return_code><![CDATA[SUCCESS]]></return_code></xml>",
        ))
        .unwrap();
        assert_eq!(params["return_code"], "SUCCESS");
    }

    #[test]
    fn test_non_success_status_surfaces_body() {
        let result: Result<OrderStatus, _> =
            decode_json(&response(500, r#"{"code":"SYSTEM_ERROR"}"#));
        match result {
            Err(Error::Decode(DecodeError::UnexpectedStatus { status, body })) => {
                assert_eq!(status, 500);
                assert!(body.contains("SYSTEM_ERROR"));
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }
}
