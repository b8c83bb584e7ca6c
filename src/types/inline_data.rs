use base64::Engine;
use serde::{Deserialize, Serialize};

/// Base64-encoded binary data embedded directly in a part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// The IANA media type of the data, e.g. `image/png`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// The base64-encoded bytes.
    pub data: String,
}

impl InlineData {
    /// Create inline data from an already-encoded base64 string.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            data: data.into(),
        }
    }

    /// Encode raw bytes as inline data.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(
            base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type,
        )
    }

    /// Decode the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.data.trim())
    }
}
