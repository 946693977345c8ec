use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::normalize::{App, RideOption};
use crate::config::{ArbiterConfig, LLMProviderType};
use crate::providers::openai_compatible::{
    OpenAICompatibleProvider, GEMINI_BASE_URL, LOCAL_BASE_URL, OPENAI_BASE_URL,
};
use crate::providers::reply_parser::strip_reasoning;
use crate::providers::{CompletionRequest, LLMProvider, Message, ProviderConfig};

/// Which path produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub app: App,
    pub source: VerdictSource,
}

/// Outcome of a comparison. `NoServiceFound` means nothing matched the vehicle
/// class and no booking must be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Winner(Verdict),
    NoServiceFound,
}

impl Choice {
    pub fn winner(&self) -> Option<App> {
        match self {
            Choice::Winner(verdict) => Some(verdict.app),
            Choice::NoServiceFound => None,
        }
    }
}

/// Picks one app from the normalized options: a language model first, then a
/// deterministic price/ETA ordering.
pub struct Arbiter {
    provider: Option<Arc<dyn LLMProvider>>,
    model_name: String,
    temperature: f32,
}

impl Arbiter {
    pub fn new(provider: Option<Arc<dyn LLMProvider>>, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            temperature: 0.0,
        }
    }

    /// Arbiter that never consults a model.
    pub fn fallback_only() -> Self {
        Self::new(None, String::new())
    }

    pub fn from_config(config: &ArbiterConfig) -> Result<Self> {
        if !config.enabled {
            info!("Model arbitration disabled, using price/ETA ordering");
            return Ok(Self::fallback_only());
        }

        let api_key = config.credential_source.resolve(config.provider_type);
        let (name, default_url, requires_key) = match config.provider_type {
            LLMProviderType::Gemini => ("gemini", GEMINI_BASE_URL, true),
            LLMProviderType::OpenAI => ("openai", OPENAI_BASE_URL, true),
            LLMProviderType::OpenAICompatible => ("openai-compatible", LOCAL_BASE_URL, false),
        };

        if requires_key && api_key.is_none() {
            warn!("No API key for {}, using price/ETA ordering", name);
            return Ok(Self::fallback_only());
        }

        let provider = OpenAICompatibleProvider::new(
            name,
            ProviderConfig {
                api_key,
                base_url: Some(config.base_url.clone().unwrap_or_else(|| default_url.to_string())),
                timeout_secs: Some(config.timeout_secs),
            },
            requires_key,
        )?;

        let mut arbiter = Self::new(Some(Arc::new(provider)), config.model_name.clone());
        arbiter.temperature = config.temperature;
        Ok(arbiter)
    }

    pub fn uses_model(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn choose(&self, options: &[RideOption]) -> Choice {
        if options.is_empty() {
            return Choice::NoServiceFound;
        }

        if let Some(provider) = &self.provider {
            match self.ask_model(provider.as_ref(), options).await {
                Ok(Some(app)) => {
                    info!("{} chose {}", provider.name(), app);
                    return Choice::Winner(Verdict {
                        app,
                        source: VerdictSource::Model,
                    });
                }
                Ok(None) => warn!("Model reply named no known app, using price/ETA ordering"),
                Err(e) => warn!("Model unavailable ({:#}), using price/ETA ordering", e),
            }
        }

        match fallback_choice(options) {
            Some(app) => Choice::Winner(Verdict {
                app,
                source: VerdictSource::Fallback,
            }),
            None => Choice::NoServiceFound,
        }
    }

    async fn ask_model(&self, provider: &dyn LLMProvider, options: &[RideOption]) -> Result<Option<App>> {
        let request = CompletionRequest {
            messages: vec![Message::user(build_prompt(options)?)],
            model: self.model_name.clone(),
            temperature: Some(self.temperature),
            max_tokens: None,
        };

        let response = provider
            .complete(request)
            .await
            .with_context(|| format!("{} completion failed", provider.name()))?;
        debug!("Model reply: {:?}", response.content);

        Ok(parse_app_reply(&response.content))
    }
}

pub fn build_prompt(options: &[RideOption]) -> Result<String> {
    let data = serde_json::to_string_pretty(options)?;
    Ok(format!(
        r#"You are given ride options from multiple cab apps.

Data:
{data}

Rules:
- Prefer lowest price
- If prices are close, prefer lower ETA

Respond with ONLY ONE WORD:
Uber OR Ola OR Rapido

No explanation."#
    ))
}

/// First app whose name appears in the reply (case-insensitive), checked in the
/// order Uber, Ola, Rapido.
pub fn parse_app_reply(reply: &str) -> Option<App> {
    let answer = strip_reasoning(reply).to_lowercase();
    App::ALL
        .into_iter()
        .find(|app| answer.contains(&app.name().to_lowercase()))
}

/// Cheapest option, ties broken by ETA, then by input order.
pub fn fallback_choice(options: &[RideOption]) -> Option<App> {
    options
        .iter()
        .min_by(|a, b| a.price.total_cmp(&b.price).then(a.eta.cmp(&b.eta)))
        .map(|option| option.app)
}
