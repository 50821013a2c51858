use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub completion: CompletionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            completion: CompletionConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which text-completion backend the scorer and assistant talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionProviderKind {
    Ollama,
    OpenAi,
    Disabled,
}

impl CompletionProviderKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Disabled => "disabled",
        }
    }
}

/// Connection settings for the completion provider.
///
/// Built once at startup and handed to the provider constructors, so tests can
/// assemble one directly without touching the process environment.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub provider: CompletionProviderKind,
    pub ollama_url: String,
    pub ollama_model: String,
    pub openai_url: String,
    pub openai_model: String,
    pub openai_api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: CompletionProviderKind::Ollama,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen2.5:0.5b".to_string(),
            openai_url: "https://api.openai.com".to_string(),
            openai_model: "gpt-4o".to_string(),
            openai_api_key: None,
            timeout: Duration::from_secs(30),
            temperature: 0.3,
        }
    }
}

impl CompletionConfig {
    /// Offline configuration: every classification takes the fallback path.
    pub fn disabled() -> Self {
        Self {
            provider: CompletionProviderKind::Disabled,
            ..Self::default()
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let provider = match env::var("LLM_PROVIDER") {
            Ok(value) => CompletionProviderKind::parse(&value)?,
            Err(_) => defaults.provider,
        };

        let timeout = match env::var("LLM_TIMEOUT_SECS") {
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout),
            },
            Err(_) => defaults.timeout,
        };

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        if provider == CompletionProviderKind::OpenAi && openai_api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            provider,
            ollama_url: env::var("OLLAMA_API_URL").unwrap_or(defaults.ollama_url),
            ollama_model: model_from_env("OLLAMA_MODEL", defaults.ollama_model)?,
            openai_url: env::var("OPENAI_API_URL").unwrap_or(defaults.openai_url),
            openai_model: model_from_env("OPENAI_MODEL", defaults.openai_model)?,
            openai_api_key,
            timeout,
            temperature: defaults.temperature,
        })
    }
}

fn model_from_env(key: &'static str, default: String) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyModel(key)),
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownProvider(String),
    MissingApiKey,
    InvalidTimeout,
    EmptyModel(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownProvider(value) => write!(
                f,
                "LLM_PROVIDER '{}' is not one of ollama, openai, disabled",
                value
            ),
            ConfigError::MissingApiKey => {
                write!(f, "OPENAI_API_KEY must be set when LLM_PROVIDER=openai")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "LLM_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::EmptyModel(key) => write!(f, "{} must not be empty", key),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::UnknownProvider(_)
            | ConfigError::MissingApiKey
            | ConfigError::InvalidTimeout
            | ConfigError::EmptyModel(_) => None,
        }
    }
}
