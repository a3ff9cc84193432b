//! Flat key-value XML bodies for the legacy signing scheme
//!
//! The legacy wire format is a single `<xml>` element with one child per
//! parameter. Values are emitted inside CDATA sections; the parser accepts
//! both CDATA and plain text content.

use crate::StringParams;
use paygate_errors::{DecodeError, Error, Result};

/// Serialize parameters to a flat XML body.
#[must_use]
pub fn to_xml(params: &StringParams) -> String {
    let mut out = String::from("<xml>");
    for (key, value) in params {
        out.push('<');
        out.push_str(key);
        out.push_str("><![CDATA[");
        out.push_str(value);
        out.push_str("]]></");
        out.push_str(key);
        out.push('>');
    }
    out.push_str("</xml>");
    out
}

/// Parse a flat XML body back into parameters.
///
/// # Errors
///
/// Returns a [`DecodeError::Xml`] if the document is not a flat
/// one-element-per-key `<xml>` body.
pub fn from_xml(body: &str) -> Result<StringParams> {
    let trimmed = body.trim();
    let inner = trimmed
        .strip_prefix("<xml>")
        .and_then(|rest| rest.strip_suffix("</xml>"))
        .ok_or_else(|| xml_error("missing <xml> root element"))?;

    let mut params = StringParams::new();
    let mut rest = inner.trim();

    while !rest.is_empty() {
        let open_end = rest.find('>').ok_or_else(|| xml_error("unclosed tag"))?;
        if !rest.starts_with('<') {
            return Err(xml_error("unexpected text outside element"));
        }
        let key = &rest[1..open_end];
        if key.is_empty() || key.starts_with('/') {
            return Err(xml_error("malformed element name"));
        }

        let close_tag = format!("</{key}>");
        let after_open = &rest[open_end + 1..];
        let close_pos = after_open
            .find(&close_tag)
            .ok_or_else(|| xml_error(format!("missing closing tag for {key}")))?;

        let raw_value = &after_open[..close_pos];
        let value = raw_value
            .strip_prefix("<![CDATA[")
            .and_then(|v| v.strip_suffix("]]>"))
            .unwrap_or(raw_value);

        params.insert(key.to_string(), value.to_string());
        rest = after_open[close_pos + close_tag.len()..].trim_start();
    }

    Ok(params)
}

fn xml_error(message: impl Into<String>) -> Error {
    DecodeError::Xml {
        message: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_xml_flat_body() {
        let mut params = StringParams::new();
        params.insert("mch_id".to_string(), "10000100".to_string());
        params.insert("return_code".to_string(), "SUCCESS".to_string());

        assert_eq!(
            to_xml(&params),
            "<xml><mch_id><![CDATA[10000100]]></mch_id>\
             <return_code><![CDATA[SUCCESS]]></return_code></xml>"
        );
    }

    #[test]
    fn test_from_xml_mixed_content() {
        let body = "<xml>\
            <return_code><![CDATA[SUCCESS]]></return_code>\
            <return_msg>OK</return_msg>\
            <total_fee>888</total_fee>\
        </xml>";

        let params = from_xml(body).unwrap();
        assert_eq!(params["return_code"], "SUCCESS");
        assert_eq!(params["return_msg"], "OK");
        assert_eq!(params["total_fee"], "888");
    }

    #[test]
    fn test_from_xml_rejects_garbage() {
        assert!(from_xml("not xml at all").is_err());
        assert!(from_xml("<xml><open>no close</xml>").is_err());
    }
}
