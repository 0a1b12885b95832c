//! Single-object retrieval result.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::types::{ObjectMetadata, ObjectRef};

/// How the payload of a [`RetrievalResult`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Classification {
    /// Decoded UTF-8 text.
    Text,
    /// Opaque bytes.
    Binary,
    /// Text extracted from a PDF document.
    ExtractedText,
}

/// Delivered content of a retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum Payload {
    /// Inline text.
    Text { text: String },
    /// Inline bytes, serialized as base64.
    Binary {
        #[serde(rename = "data_base64", serialize_with = "serialize_base64")]
        data: Bytes,
    },
    /// The content was written to a local file.
    Saved { saved_to: PathBuf, bytes_written: u64 },
}

impl Payload {
    /// Returns the inline text, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Returns the inline bytes, if any.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary { data } => Some(data),
            _ => None,
        }
    }
}

fn serialize_base64<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

/// Outcome of a successful retrieval.
///
/// Only produced after the size guard admitted the object; never carries a
/// truncated body.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    #[serde(flatten)]
    object: ObjectRef,
    #[serde(flatten)]
    metadata: ObjectMetadata,
    classification: Classification,
    #[serde(flatten)]
    payload: Payload,
}

impl RetrievalResult {
    pub(crate) fn new(
        object: ObjectRef,
        metadata: ObjectMetadata,
        classification: Classification,
        payload: Payload,
    ) -> Self {
        Self {
            object,
            metadata,
            classification,
            payload,
        }
    }

    #[inline]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    #[inline]
    pub fn metadata(&self) -> &ObjectMetadata {
        &self.metadata
    }

    #[inline]
    pub fn classification(&self) -> Classification {
        self.classification
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Consumes the result, returning the payload.
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ObjectMetadata {
        ObjectMetadata {
            content_type: "image/png".into(),
            size_bytes: 3,
            last_modified: None,
            e_tag: None,
        }
    }

    #[test]
    fn binary_payload_serializes_flat_with_base64() {
        let result = RetrievalResult::new(
            ObjectRef::new("b", "img/x.png").unwrap(),
            metadata(),
            Classification::Binary,
            Payload::Binary {
                data: Bytes::from_static(&[1, 2, 3]),
            },
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["uri"], "s3://b/img/x.png");
        assert_eq!(value["content_type"], "image/png");
        assert_eq!(value["size_bytes"], 3);
        assert_eq!(value["classification"], "binary");
        assert_eq!(value["delivery"], "binary");
        assert_eq!(value["data_base64"], "AQID");
    }

    #[test]
    fn saved_payload_reports_path() {
        let result = RetrievalResult::new(
            ObjectRef::new("b", "x.png").unwrap(),
            metadata(),
            Classification::Binary,
            Payload::Saved {
                saved_to: PathBuf::from("/tmp/x.png"),
                bytes_written: 3,
            },
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["delivery"], "saved");
        assert_eq!(value["saved_to"], "/tmp/x.png");
        assert_eq!(value["bytes_written"], 3);
    }
}
