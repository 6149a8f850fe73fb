use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use crate::template::PromptTemplate;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-r1-0528-qwen3-8b:free";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_bind: SocketAddr,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub openrouter_base_url: String,
    pub openrouter_referer: Option<String>,
    pub openrouter_title: Option<String>,
    pub prompt_template_file: Option<PathBuf>,
    pub upstream_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let port = var("PORT").unwrap_or_else(|| "8080".to_owned());
        let http_bind = var("HTTP_BIND").unwrap_or_else(|| format!("0.0.0.0:{port}"));
        let http_bind = http_bind.parse()?;

        let upstream_timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self {
            http_bind,
            openrouter_api_key: var("OPENROUTER_API_KEY"),
            openrouter_model: var("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_owned()),
            openrouter_base_url: var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_owned()),
            openrouter_referer: var("OPENROUTER_REFERER"),
            openrouter_title: var("OPENROUTER_TITLE"),
            prompt_template_file: var("PROMPT_TEMPLATE_FILE").map(PathBuf::from),
            upstream_timeout,
        })
    }

    /// Loads the configured template file, or the built-in template when none is set.
    pub fn load_template(&self) -> anyhow::Result<PromptTemplate> {
        let Some(path) = &self.prompt_template_file else {
            return Ok(PromptTemplate::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|error| {
            anyhow::anyhow!("failed to read prompt template {}: {error}", path.display())
        })?;
        let template = raw.parse::<PromptTemplate>().map_err(|error| {
            anyhow::anyhow!("invalid prompt template {}: {error}", path.display())
        })?;
        Ok(template)
    }

    pub fn relay_config(&self, template: PromptTemplate) -> Arc<RelayConfig> {
        Arc::new(RelayConfig {
            api_key: self.openrouter_api_key.clone(),
            model: self.openrouter_model.clone(),
            template,
        })
    }
}

/// Per-request inputs of the relay, built once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub template: PromptTemplate,
}

impl RelayConfig {
    pub fn new(api_key: Option<String>, model: impl Into<String>, template: PromptTemplate) -> Self {
        Self {
            api_key,
            model: model.into(),
            template,
        }
    }
}

fn parse_timeout(raw: &str) -> anyhow::Result<Duration> {
    let seconds = raw.parse::<u64>().map_err(|error| {
        anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds: {error}")
    })?;
    if seconds == 0 {
        anyhow::bail!(
            "UPSTREAM_TIMEOUT_SECS must be greater than zero; unset it to disable the timeout"
        );
    }
    Ok(Duration::from_secs(seconds))
}
