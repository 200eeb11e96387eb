//! Interaction response payloads
//!
//! - **Version**: 1.0.1
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.1: Message limit counts characters
//! - 1.0.0: Message, deferred and autocomplete responses with Discord limits

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Maximum autocomplete choices Discord accepts
pub const MAX_CHOICES: usize = 25;

const EPHEMERAL_FLAG: u64 = 1 << 6;

/// A single autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: Value,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Message body used for initial responses, edits and followups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub ephemeral: bool,
}

impl ResponseMessage {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(truncate_for_message(&content.into())),
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({});
        if let Some(content) = &self.content {
            body["content"] = json!(content);
        }
        if self.ephemeral {
            body["flags"] = json!(EPHEMERAL_FLAG);
        }
        body
    }
}

/// Initial response to an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionResponse {
    Message(ResponseMessage),
    Deferred { ephemeral: bool },
    Autocomplete(Vec<AutocompleteChoice>),
}

impl InteractionResponse {
    /// Build an autocomplete response, keeping at most [`MAX_CHOICES`] entries
    pub fn autocomplete(mut choices: Vec<AutocompleteChoice>) -> Self {
        choices.truncate(MAX_CHOICES);
        InteractionResponse::Autocomplete(choices)
    }

    pub fn to_json(&self) -> Value {
        match self {
            InteractionResponse::Message(message) => json!({"type": 4, "data": message.to_json()}),
            InteractionResponse::Deferred { ephemeral } => {
                let data = if *ephemeral {
                    json!({"flags": EPHEMERAL_FLAG})
                } else {
                    json!({})
                };
                json!({"type": 5, "data": data})
            }
            InteractionResponse::Autocomplete(choices) => {
                json!({"type": 8, "data": {"choices": choices}})
            }
        }
    }
}

/// Truncate text to fit the message limit, adding ellipsis if needed.
/// The limit counts characters, not bytes.
pub fn truncate_for_message(text: &str) -> String {
    if text.chars().count() <= MESSAGE_LIMIT {
        return text.to_string();
    }
    let kept: String = text.chars().take(MESSAGE_LIMIT - 3).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json() {
        let response = InteractionResponse::Message(ResponseMessage::content("hi").ephemeral(true));
        assert_eq!(
            response.to_json(),
            json!({"type": 4, "data": {"content": "hi", "flags": 64}})
        );
    }

    #[test]
    fn test_deferred_json() {
        let response = InteractionResponse::Deferred { ephemeral: false };
        assert_eq!(response.to_json(), json!({"type": 5, "data": {}}));
    }

    #[test]
    fn test_autocomplete_caps_choices() {
        let choices = (0..40)
            .map(|i| AutocompleteChoice::new(format!("c{i}"), i))
            .collect();
        let InteractionResponse::Autocomplete(kept) = InteractionResponse::autocomplete(choices) else {
            panic!("expected autocomplete response");
        };
        assert_eq!(kept.len(), MAX_CHOICES);
        assert_eq!(kept[0], AutocompleteChoice::new("c0", 0));
    }

    #[test]
    fn test_autocomplete_json() {
        let response = InteractionResponse::autocomplete(vec![AutocompleteChoice::new("Ada", "ada")]);
        assert_eq!(
            response.to_json(),
            json!({"type": 8, "data": {"choices": [{"name": "Ada", "value": "ada"}]}})
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        let exact = "世界".repeat(1000);
        assert_eq!(truncate_for_message(&exact), exact);

        let over = "世界".repeat(1001);
        let truncated = truncate_for_message(&over);
        assert_eq!(truncated.chars().count(), MESSAGE_LIMIT);
        assert!(truncated.starts_with("世界世"));
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_for_message("hello"), "hello");
    }
}
