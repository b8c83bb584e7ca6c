use serde::{Deserialize, Serialize};

use crate::types::Part;

/// The producer of a conversational turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A turn written by the person using the application.
    User,
    /// A turn produced by the model.
    Model,
}

/// One turn of a conversation: a role and the ordered parts it carries.
///
/// Responses from the API sometimes omit `parts` entirely (or send `null`);
/// both deserialize as an empty part list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Who produced this turn.  Omitted by the API on some response chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The parts of this turn, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
}

impl Content {
    /// Create a user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: Some(vec![Part::text(text)]),
        }
    }

    /// Create a model turn from the given parts.
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Some(Role::Model),
            parts: Some(parts),
        }
    }

    /// The parts of this turn; absent parts read as empty.
    pub fn parts(&self) -> &[Part] {
        self.parts.as_deref().unwrap_or(&[])
    }
}
