//! Versioned, self-describing container for artifacts handed between stages.
//!
//! A blob is JSON text:
//!
//! ```json
//! {"format": "churn-pipeline/blob", "version": 1, "kind": "preprocessed_data", "payload": {...}}
//! ```
//!
//! Matrices inside the payload carry their shape next to the flat data, so a
//! blob can be decoded by any process or language that reads JSON.

use crate::data::LabeledDataset;
use crate::error::{PipelineError, Result};
use crate::preprocessing::PreprocessedData;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format tag written into every blob
pub const BLOB_FORMAT: &str = "churn-pipeline/blob";
/// Current blob layout version
pub const BLOB_VERSION: u32 = 1;

/// What a blob carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    LabeledDataset,
    PreprocessedData,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::LabeledDataset => write!(f, "labeled_dataset"),
            PayloadKind::PreprocessedData => write!(f, "preprocessed_data"),
        }
    }
}

/// Types that can travel inside a blob
pub trait BlobPayload: Serialize + DeserializeOwned {
    const KIND: PayloadKind;
}

impl BlobPayload for LabeledDataset {
    const KIND: PayloadKind = PayloadKind::LabeledDataset;
}

impl BlobPayload for PreprocessedData {
    const KIND: PayloadKind = PayloadKind::PreprocessedData;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format: &'a str,
    version: u32,
    kind: PayloadKind,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    kind: PayloadKind,
    payload: serde_json::Value,
}

impl Envelope {
    fn parse(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        if envelope.format != BLOB_FORMAT {
            return Err(PipelineError::SerializationError(format!(
                "unknown blob format {:?}",
                envelope.format
            )));
        }
        if envelope.version != BLOB_VERSION {
            return Err(PipelineError::SerializationError(format!(
                "unsupported blob version {} (expected {})",
                envelope.version, BLOB_VERSION
            )));
        }
        Ok(envelope)
    }
}

/// Opaque stage output, safe to pass across process boundaries as text or bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(String);

impl Blob {
    /// Wrap `payload` in a versioned envelope
    pub fn encode<T: BlobPayload>(payload: &T) -> Result<Self> {
        let envelope = EnvelopeRef {
            format: BLOB_FORMAT,
            version: BLOB_VERSION,
            kind: T::KIND,
            payload,
        };
        Ok(Self(serde_json::to_string(&envelope)?))
    }

    /// Unwrap a payload of type `T`, rejecting blobs of another kind, format or version
    pub fn decode<T: BlobPayload>(&self) -> Result<T> {
        let envelope = Envelope::parse(&self.0)?;
        if envelope.kind != T::KIND {
            return Err(PipelineError::SerializationError(format!(
                "expected a {} blob, got {}",
                T::KIND,
                envelope.kind
            )));
        }
        Ok(serde_json::from_value(envelope.payload)?)
    }

    /// Payload kind recorded in the envelope
    pub fn kind(&self) -> Result<PayloadKind> {
        Ok(Envelope::parse(&self.0)?.kind)
    }

    /// Rebuild a blob from bytes previously obtained with [`Blob::as_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PipelineError::SerializationError(format!("blob is not UTF-8: {}", e)))?;
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Blob {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
