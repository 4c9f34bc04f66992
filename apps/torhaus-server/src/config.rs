//! Server configuration module.
//!
//! Everything is driven by environment variables:
//!
//! ```bash
//! # Core settings
//! TORHAUS_TOKEN_SECRET=...            # required, keys the invite token digests
//! TORHAUS_ADMIN_TOKEN=...             # required for `serve`, bearer token for staff endpoints
//! TORHAUS_BASE_URL=https://torhaus.example
//! TORHAUS_INVITE_EXPIRY_DAYS=7
//! TORHAUS_RATE_LIMIT_WINDOW_MS=60000
//! TORHAUS_RATE_LIMIT_MAX=10
//!
//! # Provider: Resend
//! TORHAUS_EMAIL_PROVIDER=resend
//! RESEND_API_KEY=re_...
//!
//! # Provider: SMTP
//! TORHAUS_EMAIL_PROVIDER=smtp
//! SMTP_HOST=smtp.example.com
//! SMTP_PORT=587
//! SMTP_USERNAME=user@example.com
//! SMTP_PASSWORD=app_password
//! SMTP_USE_TLS=true
//!
//! # Sender config
//! TORHAUS_EMAIL_FROM=noreply@torhaus.example
//! TORHAUS_EMAIL_FROM_NAME="Torhaus"
//! ```
//!
//! Rotating `TORHAUS_TOKEN_SECRET` invalidates every outstanding invite
//! token; the digest store cannot be migrated to a new secret.

use std::env;
use thiserror::Error;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret keying the invite token digests. Checked non-empty at startup.
    pub token_secret: String,
    /// Bearer token for the staff endpoints; only `serve` requires it.
    pub admin_token: Option<String>,
    /// Public base URL invite links are built against.
    pub base_url: String,
    /// Default invite lifetime when issuance does not say otherwise.
    pub default_expiry_days: i64,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max: u32,
    /// Email delivery; None disables outbound mail entirely.
    pub email: Option<EmailConfig>,
}

/// Email configuration for invite delivery
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProviderConfig,
    /// From email address
    pub from_address: String,
    /// Optional from name
    pub from_name: Option<String>,
}

/// Email provider configuration
#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    /// Resend email provider
    Resend {
        #[allow(dead_code)] // Used when email-resend feature is enabled
        api_key: String,
    },
    /// SMTP email provider
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TORHAUS_TOKEN_SECRET is missing or empty; refusing to hash invite tokens without it")]
    MissingTokenSecret,

    #[error("TORHAUS_ADMIN_TOKEN is required to serve staff endpoints")]
    MissingAdminToken,

    #[error("Invalid email provider: {0}. Expected 'resend' or 'smtp'")]
    InvalidProvider(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid number in {0}")]
    InvalidNumber(String),

    #[error("Missing from address: TORHAUS_EMAIL_FROM is required when email is configured")]
    MissingFromAddress,

    #[error("SMTP provider requires SMTP_HOST")]
    SmtpMissingHost,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret = env::var("TORHAUS_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingTokenSecret)?;

        let admin_token = env::var("TORHAUS_ADMIN_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let base_url =
            env::var("TORHAUS_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let default_expiry_days = parse_env("TORHAUS_INVITE_EXPIRY_DAYS", 7)?;
        let rate_limit_window_ms = parse_env("TORHAUS_RATE_LIMIT_WINDOW_MS", 60_000)?;
        let rate_limit_max = parse_env("TORHAUS_RATE_LIMIT_MAX", 10)?;

        Ok(Self {
            token_secret,
            admin_token,
            base_url,
            default_expiry_days,
            rate_limit_window_ms,
            rate_limit_max,
            email: load_email_config()?,
        })
    }

    /// The admin bearer token, required before serving staff endpoints.
    pub fn require_admin_token(&self) -> Result<&str, ConfigError> {
        self.admin_token
            .as_deref()
            .ok_or(ConfigError::MissingAdminToken)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string())),
        Err(_) => Ok(default),
    }
}

fn load_email_config() -> Result<Option<EmailConfig>, ConfigError> {
    let Some(provider_type) = env::var("TORHAUS_EMAIL_PROVIDER").ok() else {
        return Ok(None);
    };

    let provider = match provider_type.to_lowercase().as_str() {
        "resend" => {
            let api_key = env::var("RESEND_API_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("RESEND_API_KEY".to_string()))?;
            EmailProviderConfig::Resend { api_key }
        }
        "smtp" => {
            let host = env::var("SMTP_HOST").map_err(|_| ConfigError::SmtpMissingHost)?;
            let port = env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber("SMTP_PORT".to_string()))?;
            let username = env::var("SMTP_USERNAME").ok();
            let password = env::var("SMTP_PASSWORD").ok();
            let use_tls = env::var("SMTP_USE_TLS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(true); // TLS by default

            EmailProviderConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            }
        }
        other => return Err(ConfigError::InvalidProvider(other.to_string())),
    };

    let from_address =
        env::var("TORHAUS_EMAIL_FROM").map_err(|_| ConfigError::MissingFromAddress)?;
    let from_name = env::var("TORHAUS_EMAIL_FROM_NAME").ok();

    Ok(Some(EmailConfig {
        provider,
        from_address,
        from_name,
    }))
}
