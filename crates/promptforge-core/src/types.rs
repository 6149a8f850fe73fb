use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    pub input: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PromptResult {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
}

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatCompletionRequest {
    pub fn single_user_message(model: impl Into<String>, content: String) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, or an empty string when there are no choices.
    pub fn into_first_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.into_text())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: MessageContent,
}

/// OpenRouter returns either a plain string, a list of typed parts, or `null`
/// (reasoning models that only produced reasoning tokens).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    #[default]
    Empty,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    pub fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join(""),
            MessageContent::Empty => String::new(),
        }
    }
}
