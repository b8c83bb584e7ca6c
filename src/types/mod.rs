// Public modules
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod inline_data;
pub mod part;
pub mod slide;

// Re-exports
pub use content::{Content, Role};
pub use generate_content_request::{GenerateContentRequest, GenerationConfig, Modality};
pub use generate_content_response::{Candidate, GenerateContentResponse, UsageMetadata};
pub use inline_data::InlineData;
pub use part::Part;
pub use slide::{DEFAULT_IMAGE_MIME_TYPE, Slide, SlideImage};
