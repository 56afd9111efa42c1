//! Response decoding.
//!
//! Decoding happens in two steps: a structural `serde_json` decode into a
//! wire type, then the wire type's [`Normalize`] conversion into the
//! canonical model. The steps never interleave, so every conversion can be
//! tested on its own against plain JSON.

use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// Conversion from a decoded wire shape into its canonical form.
///
/// Implementations must not fail: missing or mistyped fields become zero
/// values or empty collections.
pub trait Normalize: DeserializeOwned {
    /// The canonical type.
    type Output;

    /// Runs the conversion pass.
    fn normalize(self) -> Self::Output;
}

/// A missing top-level value (`null` or an empty body) stays absent.
impl<T: Normalize> Normalize for Option<T> {
    type Output = Option<T::Output>;

    fn normalize(self) -> Self::Output {
        self.map(Normalize::normalize)
    }
}

/// Structurally decodes `payload` into `T`. Unknown fields are ignored.
///
/// An empty or whitespace-only payload is read as `null`.
///
/// # Errors
///
/// Returns [`Error::DeserializationFailed`] with the serde message and the
/// leading part of the payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    let payload_or_null: &[u8] = if payload.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        payload
    };

    serde_json::from_slice(payload_or_null).map_err(|e| {
        let err = Error::deserialization(&e, payload);
        tracing::error!(
            error = %e,
            raw_response = ?err.raw_response(),
            "Failed to deserialize response"
        );
        err
    })
}

/// [`decode`] followed by [`Normalize::normalize`].
pub fn decode_normalized<W: Normalize>(payload: &[u8]) -> Result<W::Output> {
    decode::<W>(payload).map(Normalize::normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MAX_SNIPPET_CHARS;
    use crate::wire::{BuildWire, BuildsWire, ChangesWire, PropertiesWire, TestOccurrencesWire};

    #[test]
    fn test_unknown_fields_are_ignored() {
        let build =
            decode_normalized::<BuildWire>(br#"{"id": 5, "somethingNew": {"a": 1}}"#).unwrap();
        assert_eq!(build.id, 5);
    }

    #[test]
    fn test_null_and_empty_body_decode_to_none() {
        assert!(decode_normalized::<Option<BuildWire>>(b"null")
            .unwrap()
            .is_none());
        assert!(decode_normalized::<Option<BuildWire>>(b"")
            .unwrap()
            .is_none());
        assert!(decode_normalized::<Option<BuildWire>>(b" \n")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_envelopes_are_absent_not_errors() {
        assert!(decode_normalized::<ChangesWire>(b"{}").unwrap().is_none());
        assert!(decode_normalized::<TestOccurrencesWire>(br#"{"count": 0}"#)
            .unwrap()
            .is_none());
        assert!(decode_normalized::<PropertiesWire>(br#"{"property": null}"#)
            .unwrap()
            .is_none());
        assert!(decode_normalized::<BuildsWire>(br#"{"count": 0, "build": null}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_present_but_empty_envelope_is_some() {
        let changes = decode_normalized::<ChangesWire>(br#"{"change": []}"#).unwrap();
        assert_eq!(changes.map(|c| c.len()), Some(0));
    }

    #[test]
    fn test_type_mismatch_reports_payload_snippet() {
        let payload = format!(r#"{{"build": "oops", "pad": "{}"}}"#, "x".repeat(3000));
        let err = decode::<BuildsWire>(payload.as_bytes()).unwrap_err();

        match err {
            Error::DeserializationFailed {
                serde_error,
                raw_response,
            } => {
                assert!(serde_error.contains("invalid type"));
                assert_eq!(raw_response.chars().count(), MAX_SNIPPET_CHARS);
                assert!(raw_response.starts_with(r#"{"build": "oops""#));
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_html_error_page_is_a_decode_error() {
        let err = decode::<BuildWire>(b"<html>Login</html>").unwrap_err();
        assert_eq!(err.raw_response(), Some("<html>Login</html>"));
    }
}
