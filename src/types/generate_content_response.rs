use serde::{Deserialize, Serialize};

use crate::types::Content;

/// Token accounting attached to (usually the last) response chunk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, history included.
    #[serde(default)]
    pub prompt_token_count: Option<u32>,

    /// Tokens across all candidates.
    #[serde(default)]
    pub candidates_token_count: Option<u32>,

    /// Prompt plus candidate tokens.
    #[serde(default)]
    pub total_token_count: Option<u32>,
}

/// One alternative response within a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of this candidate.  Absent on safety-blocked chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Why generation stopped, on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Index of this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// One chunk of a streamed `streamGenerateContent` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate responses.  Missing or `null` reads as empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,

    /// Token accounting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// The model version that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Create a chunk holding one candidate with the given content.
    pub fn from_content(content: Content) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(content),
                finish_reason: None,
                index: Some(0),
            }]),
            usage_metadata: None,
            model_version: None,
        }
    }

    /// The candidates of this chunk; absent candidates read as empty.
    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.as_deref().unwrap_or(&[])
    }
}
