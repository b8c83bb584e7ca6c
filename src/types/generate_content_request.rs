use serde::{Deserialize, Serialize};

use crate::types::Content;

/// An output modality the model may respond with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    /// Text output.
    Text,
    /// Image output.
    Image,
}

/// Generation settings sent with every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// The modalities the response may interleave.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<Modality>,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    /// A configuration that asks for interleaved text and images.
    pub fn text_and_image() -> Self {
        Self {
            response_modalities: vec![Modality::Text, Modality::Image],
            temperature: None,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Body of a `streamGenerateContent` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Prior turns followed by the new user turn.
    pub contents: Vec<Content>,

    /// Generation settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Create a request from the full list of turns.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            generation_config: None,
        }
    }

    /// Attach generation settings.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_serialization() {
        let request = GenerateContentRequest::new(vec![Content::user("Explain rainbows")])
            .with_generation_config(GenerationConfig::text_and_image());

        let json = to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Explain rainbows"}]}
                ],
                "generationConfig": {
                    "responseModalities": ["TEXT", "IMAGE"]
                }
            })
        );
    }

    #[test]
    fn temperature_is_sent_when_set() {
        let config = GenerationConfig::text_and_image().with_temperature(Some(0.5));
        let json = to_value(&config).unwrap();
        assert_eq!(json["temperature"], json!(0.5));
    }
}
