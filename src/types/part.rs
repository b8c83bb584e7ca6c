use serde::{Deserialize, Serialize};

use crate::types::InlineData;

/// The smallest unit of model output.
///
/// A part carries either a text fragment or inline binary data.  The API also
/// sends parts that carry neither (thought signatures, for example); those
/// deserialize with both fields empty and are ignored downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// A text fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Inline binary data, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Create an inline data part.
    pub fn inline_data(inline_data: InlineData) -> Self {
        Self {
            text: None,
            inline_data: Some(inline_data),
        }
    }

    /// The text of this part, if it carries any non-empty text.
    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_data_part_deserialization() {
        let json = r#"{"inlineData": {"mimeType": "image/png", "data": "AAEC"}}"#;
        let part: Part = serde_json::from_str(json).unwrap();
        assert!(part.text.is_none());
        let inline = part.inline_data.unwrap();
        assert_eq!(inline.mime_type.as_deref(), Some("image/png"));
        assert_eq!(inline.data, "AAEC");
    }

    #[test]
    fn empty_text_is_not_text() {
        assert_eq!(Part::text("").as_text(), None);
        assert_eq!(Part::text("hi").as_text(), Some("hi"));
    }

    #[test]
    fn unknown_part_fields_are_ignored() {
        let json = r#"{"thoughtSignature": "abc"}"#;
        let part: Part = serde_json::from_str(json).unwrap();
        assert_eq!(part, Part::default());
    }
}
