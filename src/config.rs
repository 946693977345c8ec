use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compare::KeywordTable;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartCabConfig {
    pub arbiter: ArbiterConfig,
    pub automation: AutomationConfig,
    pub vehicles: KeywordTable,
    pub ui: UIConfig,
    pub logging: LoggingConfig,
}

/// Settings handed to the arbiter when it is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// When false, the winner is always chosen by price then ETA.
    pub enabled: bool,
    pub provider_type: LLMProviderType,
    pub base_url: Option<String>,
    pub model_name: String,
    pub credential_source: CredentialSource,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LLMProviderType {
    Gemini,
    OpenAI,
    OpenAICompatible,
}

impl LLMProviderType {
    /// Environment variables read by `CredentialSource::Auto`.
    pub fn key_vars(&self) -> &'static [&'static str] {
        match self {
            LLMProviderType::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            LLMProviderType::OpenAI => &["OPENAI_API_KEY"],
            LLMProviderType::OpenAICompatible => &[],
        }
    }
}

/// Where the language model API key comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// The provider type's own variables.
    #[default]
    Auto,
    /// First non-empty variable wins.
    Env(Vec<String>),
    Key(String),
    None,
}

impl CredentialSource {
    pub fn resolve(&self, provider: LLMProviderType) -> Option<String> {
        match self {
            CredentialSource::Auto => first_set(provider.key_vars().iter().copied()),
            CredentialSource::Env(vars) => first_set(vars.iter().map(String::as_str)),
            CredentialSource::Key(key) if !key.trim().is_empty() => Some(key.clone()),
            CredentialSource::Key(_) | CredentialSource::None => None,
        }
    }
}

fn first_set<'a>(vars: impl Iterator<Item = &'a str>) -> Option<String> {
    vars.filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

/// How the external device automation agent is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub command: String,
    /// `{goal}` is replaced with the goal text; without it the goal goes to stdin.
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// Use canned replies when `command` cannot be found on `PATH`.
    pub demo_when_missing: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    pub interface: Interface,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    Prompt,
    Form,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider_type: LLMProviderType::Gemini,
            base_url: None,
            model_name: "gemini-2.0-flash".to_string(),
            credential_source: CredentialSource::Auto,
            timeout_secs: 30,
            temperature: 0.0,
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            command: "droidrun".to_string(),
            args: vec!["run".to_string(), "{goal}".to_string()],
            env: HashMap::new(),
            demo_when_missing: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl SmartCabConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config file
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            Ok(default_config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".config").join("smartcab"))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
