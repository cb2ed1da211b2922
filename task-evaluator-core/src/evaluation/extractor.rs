//! Locating the text in a model completion whose shape varies by API version.

use serde_json::Value;

/// Returned when no text can be found anywhere in a completion.
pub const EMPTY_COMPLETION_TEXT: &str = "{}";

/// The shapes a completion can take, in decoding priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionShape {
    /// Convenience `output_text` field: a string, or an array of strings
    /// joined with newlines. Stored trimmed.
    OutputText(String),
    /// First non-blank `output[i].content[j].text`, outer to inner, left to right.
    OutputChunks(String),
    /// Chat-completions style `choices[i].message.content`.
    ChatChoices(String),
}

type Decoder = fn(&Value) -> Option<CompletionShape>;

impl CompletionShape {
    const DECODERS: [Decoder; 3] = [
        Self::decode_output_text,
        Self::decode_output_chunks,
        Self::decode_chat_choices,
    ];

    /// Tries every known shape in priority order; first match wins.
    pub fn decode(completion: &Value) -> Option<Self> {
        Self::DECODERS.iter().find_map(|decode| decode(completion))
    }

    pub fn text(&self) -> &str {
        match self {
            CompletionShape::OutputText(text)
            | CompletionShape::OutputChunks(text)
            | CompletionShape::ChatChoices(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            CompletionShape::OutputText(text)
            | CompletionShape::OutputChunks(text)
            | CompletionShape::ChatChoices(text) => text,
        }
    }

    fn decode_output_text(completion: &Value) -> Option<Self> {
        let text = match completion.get("output_text")? {
            Value::String(text) => text.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string(),
            _ => return None,
        };

        (!text.is_empty()).then_some(CompletionShape::OutputText(text))
    }

    fn decode_output_chunks(completion: &Value) -> Option<Self> {
        completion
            .get("output")?
            .as_array()?
            .iter()
            .filter_map(|chunk| chunk.get("content").and_then(Value::as_array))
            .flatten()
            .find_map(|content| {
                content
                    .get("text")
                    .and_then(Value::as_str)
                    .filter(|text| !text.trim().is_empty())
            })
            .map(|text| CompletionShape::OutputChunks(text.to_string()))
    }

    fn decode_chat_choices(completion: &Value) -> Option<Self> {
        completion
            .get("choices")?
            .as_array()?
            .iter()
            .find_map(|choice| {
                choice
                    .get("message")
                    .and_then(|message| message.get("content"))
                    .and_then(Value::as_str)
                    .filter(|text| !text.trim().is_empty())
            })
            .map(|text| CompletionShape::ChatChoices(text.to_string()))
    }
}

/// Best-effort text of a completion, or `"{}"` if there is none.
pub fn extract_response_text(completion: &Value) -> String {
    CompletionShape::decode(completion)
        .map(CompletionShape::into_text)
        .unwrap_or_else(|| EMPTY_COMPLETION_TEXT.to_string())
}
