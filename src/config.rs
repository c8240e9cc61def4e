//! Configuration management for AgentRepair.
//!
//! Configuration can be set via environment variables (a `.env` file is
//! honoured if present):
//! - `AGENT_BACKEND` - Optional. `openai` or `foundry`. Defaults to `foundry`
//!   when `AZURE_AI_ENDPOINT` is set, otherwise `openai`.
//! - `OPENAI_API_KEY` - OpenAI API key (required for the `openai` backend).
//! - `OPENAI_MODEL` - Optional. Chat model identifier. Defaults to `gpt-4o-mini`.
//! - `AZURE_AI_ENDPOINT` - Azure AI Foundry project endpoint URL.
//! - `AZURE_AI_API_KEY` - Azure AI Foundry API key.
//! - `AZURE_AGENT_ID` - Identifier of the Foundry agent to converse with.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `5001`.
//! - `SESSION_TTL_MINUTES` - Optional. Idle session expiry. Defaults to `120`.
//!
//! The server starts even when the selected backend is missing credentials so
//! the chat UI and `/api/status` remain reachable; the missing variables are
//! reported there instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Which upstream agent service relays the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenAI chat completions API
    OpenAi,
    /// Azure AI Foundry agent/thread API
    Foundry,
}

impl BackendKind {
    pub fn id(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Foundry => "foundry",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// OpenAI backend settings.
#[derive(Debug, Clone, Default)]
pub struct OpenAiConfig {
    /// API key; `None` until configured
    pub api_key: Option<String>,

    /// Chat model identifier
    pub model: String,
}

/// Azure AI Foundry backend settings.
#[derive(Debug, Clone, Default)]
pub struct FoundryConfig {
    /// Project endpoint URL, e.g. `https://myproject.services.ai.azure.com/api/projects/myproject`
    pub endpoint: Option<String>,

    /// API key; `None` until configured
    pub api_key: Option<String>,

    /// Agent to run for each conversation turn
    pub agent_id: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected upstream backend
    pub backend: BackendKind,

    /// OpenAI settings (used when `backend` is `OpenAi`)
    pub openai: OpenAiConfig,

    /// Azure AI Foundry settings (used when `backend` is `Foundry`)
    pub foundry: FoundryConfig,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Minutes of inactivity after which a session is swept
    pub session_ttl_minutes: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparseable numeric variables
    /// or an unrecognised `AGENT_BACKEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai = OpenAiConfig {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        };

        let foundry = FoundryConfig {
            endpoint: std::env::var("AZURE_AI_ENDPOINT").ok(),
            api_key: std::env::var("AZURE_AI_API_KEY").ok(),
            agent_id: std::env::var("AZURE_AGENT_ID").ok(),
        };

        let backend = match std::env::var("AGENT_BACKEND") {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "openai" => BackendKind::OpenAi,
                "foundry" | "azure" => BackendKind::Foundry,
                other => {
                    return Err(ConfigError::InvalidValue(
                        "AGENT_BACKEND".to_string(),
                        format!("unknown backend `{}`", other),
                    ))
                }
            },
            // Unset: infer from which credentials are present.
            Err(_) => {
                if foundry.endpoint.is_some() {
                    BackendKind::Foundry
                } else {
                    BackendKind::OpenAi
                }
            }
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("SESSION_TTL_MINUTES".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            backend,
            openai,
            foundry,
            host,
            port,
            session_ttl_minutes,
        })
    }

    /// Environment variables required by the selected backend that are unset.
    ///
    /// Empty when the backend is fully configured. Used by `/api/status` and
    /// the startup banner.
    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self.backend {
            BackendKind::OpenAi => {
                if self.openai.api_key.is_none() {
                    missing.push("OPENAI_API_KEY");
                }
            }
            BackendKind::Foundry => {
                if self.foundry.endpoint.is_none() {
                    missing.push("AZURE_AI_ENDPOINT");
                }
                if self.foundry.api_key.is_none() {
                    missing.push("AZURE_AI_API_KEY");
                }
                if self.foundry.agent_id.is_none() {
                    missing.push("AZURE_AGENT_ID");
                }
            }
        }
        missing
    }

    /// Model or agent identifier reported by `/api/status`.
    pub fn model_label(&self) -> String {
        match self.backend {
            BackendKind::OpenAi => self.openai.model.clone(),
            BackendKind::Foundry => self
                .foundry
                .agent_id
                .clone()
                .unwrap_or_else(|| "(unconfigured agent)".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            backend: BackendKind::OpenAi,
            openai: OpenAiConfig {
                api_key: Some("sk-test".to_string()),
                model: "gpt-4o-mini".to_string(),
            },
            foundry: FoundryConfig::default(),
            host: "127.0.0.1".to_string(),
            port: 5001,
            session_ttl_minutes: 120,
        }
    }

    #[test]
    fn missing_vars_empty_when_openai_configured() {
        let config = base_config();
        assert!(config.missing_vars().is_empty());
    }

    #[test]
    fn missing_vars_reports_absent_openai_key() {
        let mut config = base_config();
        config.openai.api_key = None;
        assert_eq!(config.missing_vars(), vec!["OPENAI_API_KEY"]);
    }

    #[test]
    fn missing_vars_reports_all_absent_foundry_settings() {
        let mut config = base_config();
        config.backend = BackendKind::Foundry;
        assert_eq!(
            config.missing_vars(),
            vec!["AZURE_AI_ENDPOINT", "AZURE_AI_API_KEY", "AZURE_AGENT_ID"]
        );
    }

    #[test]
    fn model_label_uses_agent_id_for_foundry() {
        let mut config = base_config();
        config.backend = BackendKind::Foundry;
        config.foundry.agent_id = Some("asst_123".to_string());
        assert_eq!(config.model_label(), "asst_123");
    }
}
