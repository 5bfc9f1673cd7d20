//! Content blocks returned by tool calls and carried in prompt messages.
//!
//! Blocks are passed through untouched: fields beyond the modelled ones land
//! in `extra`, and block types this crate does not know decode as
//! [`Content::Other`] with the original value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Audio {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Resource {
        resource: Value,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Any block not matching a variant above, kept verbatim
    #[serde(untagged)]
    Other(Value),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The block's `type` discriminator
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => Some("text"),
            Self::Image { .. } => Some("image"),
            Self::Audio { .. } => Some("audio"),
            Self::Resource { .. } => Some("resource"),
            Self::Other(value) => value.get("type").and_then(Value::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_image_block() {
        let content: Content = serde_json::from_value(json!({
            "type": "image",
            "data": "aGVsbG8=",
            "mimeType": "image/png"
        }))
        .unwrap();

        assert!(matches!(content, Content::Image { ref mime_type, .. } if mime_type == "image/png"));
        assert!(content.as_text().is_none());
        assert_eq!(content.kind(), Some("image"));
    }

    #[test]
    fn keeps_unmodelled_fields() {
        let wire = json!({"type": "text", "text": "hi", "annotations": {"priority": 1.0}});
        let content: Content = serde_json::from_value(wire.clone()).unwrap();

        assert_eq!(content.as_text(), Some("hi"));
        assert!(matches!(
            content,
            Content::Text { ref extra, .. } if extra["annotations"]["priority"] == 1.0
        ));
        assert_eq!(serde_json::to_value(&content).unwrap(), wire);
    }

    #[test]
    fn unknown_block_types_pass_through() {
        let wire = json!({
            "type": "resource_link",
            "uri": "file:///tmp/report.md",
            "name": "report"
        });
        let content: Content = serde_json::from_value(wire.clone()).unwrap();

        assert_eq!(content, Content::Other(wire.clone()));
        assert_eq!(content.kind(), Some("resource_link"));
        assert!(content.as_text().is_none());
        assert_eq!(serde_json::to_value(&content).unwrap(), wire);
    }

    #[test]
    fn text_constructor_serializes_without_extras() {
        assert_eq!(
            serde_json::to_value(Content::text("done")).unwrap(),
            json!({"type": "text", "text": "done"})
        );
    }
}
