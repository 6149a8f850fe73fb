use std::str::FromStr;

use thiserror::Error;

pub const PLACEHOLDER: &str = "{input}";

static DEFAULT_TEMPLATE: &str = r#"You are a professional prompt engineer and an expert in working with large language models.

Goal: rewrite the unstructured user prompt below into an improved, clear and highly effective prompt that is ready to be given to an AI model. Use the AUTOMAT framework or a similar structure when it fits.

Follow these rules:
- State the role the model should take (Act as...).
- Name the target audience (User persona).
- Describe the concrete task (Targeted action).
- Specify the expected output format (Output definition).
- Describe the tone and style (Mode / tonality / style).
- List edge cases and constraints (Atypical cases, Topic whitelisting).
- Keep the original intent and language of the user. Do not answer the prompt yourself.

Return only the improved prompt, without explanations or preamble.

Now improve this prompt:
"{input}""#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template has no {{input}} placeholder")]
    MissingPlaceholder,
    #[error("template has {0} {{input}} placeholders, expected exactly one")]
    TooManyPlaceholders(usize),
}

/// Instruction text with exactly one `{input}` slot.
///
/// The template is split around the slot when parsed, so rendering never
/// rescans the caller's input for placeholder tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    prefix: String,
    suffix: String,
}

impl PromptTemplate {
    pub fn render(&self, input: &str) -> String {
        let mut rendered =
            String::with_capacity(self.prefix.len() + input.len() + self.suffix.len());
        rendered.push_str(&self.prefix);
        rendered.push_str(input);
        rendered.push_str(&self.suffix);
        rendered
    }
}

impl FromStr for PromptTemplate {
    type Err = TemplateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.matches(PLACEHOLDER).count() {
            0 => Err(TemplateError::MissingPlaceholder),
            1 => {
                let (prefix, suffix) = raw
                    .split_once(PLACEHOLDER)
                    .ok_or(TemplateError::MissingPlaceholder)?;
                Ok(Self {
                    prefix: prefix.to_owned(),
                    suffix: suffix.to_owned(),
                })
            }
            count => Err(TemplateError::TooManyPlaceholders(count)),
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        let (prefix, suffix) = DEFAULT_TEMPLATE
            .split_once(PLACEHOLDER)
            .unwrap_or((DEFAULT_TEMPLATE, ""));
        Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
        }
    }
}
