//! Configuration management
//!
//! All settings come from environment variables (a `.env` file is loaded by
//! the binary before this runs). Configuration is read once at startup and
//! immutable afterwards. Validation collects every blank required variable
//! so a failed start names all of them at once, not just the first.

use crate::safety::SafetyThreshold;
use crate::{Error, Result};

/// Azure AI Foundry + Azure OpenAI settings
#[derive(Debug, Clone)]
pub struct FoundryConfig {
    /// Azure subscription the AI Foundry project lives in
    pub subscription_id: String,
    /// Resource group of the project
    pub resource_group: String,
    /// AI Foundry project name
    pub project_name: String,
    /// AI Foundry project endpoint (optional, informational)
    pub project_endpoint: String,
    /// AI Foundry hub name (optional, informational)
    pub hub_name: String,

    /// Azure OpenAI endpoint, e.g. `https://myresource.openai.azure.com`
    pub openai_endpoint: String,
    /// Azure OpenAI API key
    pub openai_api_key: String,
    /// Deployment (model) name
    pub openai_deployment: String,
    /// API version query parameter
    pub openai_api_version: String,

    /// Sampling temperature
    pub temperature: f64,
    /// Completion token cap per call
    pub max_tokens: u32,
    /// Timeout for outbound model/safety calls, in seconds
    pub request_timeout_secs: u64,

    /// Whether the content-safety gate is enabled
    pub enable_content_safety: bool,
    /// Severity threshold for the gate
    pub content_safety_threshold: SafetyThreshold,
    /// Content Safety endpoint; absent means the gate degrades to a no-op
    pub content_safety_endpoint: Option<String>,
    /// Content Safety API key
    pub content_safety_key: Option<String>,

    /// Whether AI Search (RAG) integration is enabled
    pub enable_ai_search: bool,
    pub ai_search_endpoint: Option<String>,
    pub ai_search_key: Option<String>,
    pub ai_search_index: Option<String>,
}

/// Bot Framework / Azure Bot Service settings
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Microsoft app (bot) id; blank means unauthenticated emulator mode
    pub app_id: String,
    /// Microsoft app password (client secret)
    pub app_password: String,
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

/// Application-level settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Display title used on cards
    pub title: String,
    /// Base system prompt for the assistant
    pub system_prompt: String,
    /// Deployment environment label (development, production, ...)
    pub environment: String,
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub foundry: FoundryConfig,
    pub bot: BotConfig,
    pub app: AppConfig,
}

fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}

fn default_system_prompt() -> String {
    "You are an intelligent Microsoft Teams assistant powered by Azure AI Foundry.".to_string()
}

fn env_string(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

fn env_or(key: &str, default: impl Into<String>) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.into(),
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v.trim().to_lowercase() == "true",
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables and validate it.
    pub fn from_env() -> Result<Self> {
        let config = Self::read_env();
        config.validate()?;
        Ok(config)
    }

    /// Read all sections without validating (validation is separate so
    /// tests can inspect partially-configured states).
    fn read_env() -> Self {
        let foundry = FoundryConfig {
            subscription_id: env_string("AZURE_SUBSCRIPTION_ID"),
            resource_group: env_string("AZURE_RESOURCE_GROUP"),
            project_name: env_string("AZURE_AI_PROJECT_NAME"),
            project_endpoint: env_string("AZURE_AI_PROJECT_ENDPOINT"),
            hub_name: env_string("AZURE_AI_HUB_NAME"),
            openai_endpoint: env_string("AZURE_OPENAI_ENDPOINT"),
            openai_api_key: env_string("AZURE_OPENAI_API_KEY"),
            openai_deployment: env_string("AZURE_OPENAI_DEPLOYMENT_NAME"),
            openai_api_version: env_or("AZURE_OPENAI_API_VERSION", default_api_version()),
            temperature: env_parse("APP_TEMPERATURE", 0.7),
            max_tokens: env_parse("APP_MAX_TOKENS", 2000),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT", 30),
            enable_content_safety: env_bool("ENABLE_CONTENT_SAFETY", true),
            content_safety_threshold: SafetyThreshold::parse(&env_or(
                "CONTENT_SAFETY_THRESHOLD",
                "medium",
            )),
            content_safety_endpoint: env_opt("CONTENT_SAFETY_ENDPOINT"),
            content_safety_key: env_opt("CONTENT_SAFETY_KEY"),
            enable_ai_search: env_bool("ENABLE_AI_SEARCH", false),
            ai_search_endpoint: env_opt("AI_SEARCH_ENDPOINT"),
            ai_search_key: env_opt("AI_SEARCH_KEY"),
            ai_search_index: env_opt("AI_SEARCH_INDEX_NAME"),
        };

        let bot = BotConfig {
            app_id: env_string("MICROSOFT_APP_ID"),
            app_password: env_string("MICROSOFT_APP_PASSWORD"),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("BOT_PORT", 3978),
        };

        let app = AppConfig {
            title: env_or("APP_TITLE", "Teams AI Foundry Assistant"),
            system_prompt: env_or("SYSTEM_PROMPT", default_system_prompt()),
            environment: env_or("ENVIRONMENT", "development"),
        };

        Config { foundry, bot, app }
    }

    /// Check every required field, reporting all blanks in one error.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("AZURE_SUBSCRIPTION_ID", &self.foundry.subscription_id),
            ("AZURE_RESOURCE_GROUP", &self.foundry.resource_group),
            ("AZURE_AI_PROJECT_NAME", &self.foundry.project_name),
            ("AZURE_OPENAI_ENDPOINT", &self.foundry.openai_endpoint),
            ("AZURE_OPENAI_API_KEY", &self.foundry.openai_api_key),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", &self.foundry.openai_deployment),
            ("MICROSOFT_APP_ID", &self.bot.app_id),
            ("MICROSOFT_APP_PASSWORD", &self.bot.app_password),
        ];

        let mut missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if self.foundry.enable_ai_search {
            if self.foundry.ai_search_endpoint.is_none() {
                missing.push("AI_SEARCH_ENDPOINT");
            }
            if self.foundry.ai_search_key.is_none() {
                missing.push("AI_SEARCH_KEY");
            }
        }

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const REQUIRED_VARS: &[(&str, &str)] = &[
        ("AZURE_SUBSCRIPTION_ID", "test-sub-id"),
        ("AZURE_RESOURCE_GROUP", "test-rg"),
        ("AZURE_AI_PROJECT_NAME", "test-project"),
        ("AZURE_OPENAI_ENDPOINT", "https://test.openai.azure.com"),
        ("AZURE_OPENAI_API_KEY", "test-key"),
        ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4"),
        ("MICROSOFT_APP_ID", "test-app-id"),
        ("MICROSOFT_APP_PASSWORD", "test-password"),
    ];

    fn set_required_vars() {
        for (key, value) in REQUIRED_VARS {
            unsafe { std::env::set_var(key, value) };
        }
    }

    fn clear_vars() {
        for (key, _) in REQUIRED_VARS {
            unsafe { std::env::remove_var(key) };
        }
        for key in [
            "AZURE_OPENAI_API_VERSION",
            "APP_TEMPERATURE",
            "APP_MAX_TOKENS",
            "REQUEST_TIMEOUT",
            "ENABLE_CONTENT_SAFETY",
            "CONTENT_SAFETY_THRESHOLD",
            "ENABLE_AI_SEARCH",
            "AI_SEARCH_ENDPOINT",
            "AI_SEARCH_KEY",
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn test_from_env_success_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        set_required_vars();

        let config = Config::from_env().unwrap();
        assert_eq!(config.foundry.project_name, "test-project");
        assert_eq!(config.foundry.openai_api_version, "2024-02-15-preview");
        assert_eq!(config.foundry.temperature, 0.7);
        assert_eq!(config.foundry.max_tokens, 2000);
        assert_eq!(config.foundry.request_timeout_secs, 30);
        assert!(config.foundry.enable_content_safety);
        assert_eq!(config.foundry.content_safety_threshold, SafetyThreshold::Medium);
        assert!(!config.foundry.enable_ai_search);
        assert_eq!(config.bot.port, 3978);
        assert_eq!(config.app.environment, "development");

        clear_vars();
    }

    #[test]
    fn test_validate_names_every_missing_field() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe { std::env::set_var("AZURE_SUBSCRIPTION_ID", "only-this-one") };

        let err = Config::from_env().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AZURE_RESOURCE_GROUP"));
        assert!(message.contains("AZURE_OPENAI_ENDPOINT"));
        assert!(message.contains("AZURE_OPENAI_API_KEY"));
        assert!(message.contains("MICROSOFT_APP_PASSWORD"));
        assert!(!message.contains("AZURE_SUBSCRIPTION_ID"));

        clear_vars();
    }

    #[test]
    fn test_ai_search_enabled_requires_credentials() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        set_required_vars();
        unsafe { std::env::set_var("ENABLE_AI_SEARCH", "true") };

        let err = Config::from_env().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AI_SEARCH_ENDPOINT"));
        assert!(message.contains("AI_SEARCH_KEY"));

        unsafe {
            std::env::set_var("AI_SEARCH_ENDPOINT", "https://search.example.net");
            std::env::set_var("AI_SEARCH_KEY", "search-key");
        }
        assert!(Config::from_env().is_ok());

        clear_vars();
    }

    #[test]
    fn test_invalid_numeric_values_fall_back_to_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        set_required_vars();
        unsafe {
            std::env::set_var("APP_MAX_TOKENS", "not-a-number");
            std::env::set_var("APP_TEMPERATURE", "");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.foundry.max_tokens, 2000);
        assert_eq!(config.foundry.temperature, 0.7);

        clear_vars();
    }

    #[test]
    fn test_threshold_parsing_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        set_required_vars();
        unsafe { std::env::set_var("CONTENT_SAFETY_THRESHOLD", "HIGH") };

        let config = Config::from_env().unwrap();
        assert_eq!(config.foundry.content_safety_threshold, SafetyThreshold::High);

        unsafe { std::env::set_var("CONTENT_SAFETY_THRESHOLD", "bogus") };
        let config = Config::from_env().unwrap();
        assert_eq!(config.foundry.content_safety_threshold, SafetyThreshold::Medium);

        clear_vars();
    }
}
