use base64::Engine;

use crate::Result;
use crate::types::InlineData;

/// Media type assumed when a response part does not name one.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

/// A decoded image ready to be placed on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideImage {
    /// The media type of the image.
    pub mime_type: String,
    /// The decoded image bytes.
    pub bytes: Vec<u8>,
}

impl SlideImage {
    /// Create an image from decoded bytes.
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Decode an inline data part into an image.
    pub fn from_inline_data(inline_data: &InlineData) -> Result<Self> {
        let bytes = inline_data.decode()?;
        let mime_type = inline_data
            .mime_type
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME_TYPE.to_string());
        Ok(Self { mime_type, bytes })
    }

    /// A `data:` URI suitable for an `<img src>` attribute.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// One caption paired with one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// Markdown caption text.
    pub caption: String,
    /// The illustration for the caption.
    pub image: SlideImage,
}

impl Slide {
    /// Pair a caption with an image.
    pub fn new(caption: impl Into<String>, image: SlideImage) -> Self {
        Self {
            caption: caption.into(),
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_uses_mime_type() {
        let image = SlideImage::new("image/jpeg", b"Hello World".to_vec());
        assert_eq!(image.data_uri(), "data:image/jpeg;base64,SGVsbG8gV29ybGQ=");
    }

    #[test]
    fn missing_mime_type_defaults_to_png() {
        let inline = InlineData {
            mime_type: None,
            data: "SGVsbG8gV29ybGQ=".to_string(),
        };
        let image = SlideImage::from_inline_data(&inline).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"Hello World");
    }

    #[test]
    fn malformed_payload_is_an_encoding_error() {
        let inline = InlineData::new("%%%", "image/png");
        let err = SlideImage::from_inline_data(&inline).unwrap_err();
        assert!(err.is_encoding());
    }
}
