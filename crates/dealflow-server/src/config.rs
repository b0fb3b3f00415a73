//! Configuration management

use dealflow_common::{env, warehouse::WarehouseConfig};
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Product name shown in outgoing emails.
pub const DEFAULT_API_NAME: &str = "Dealflow API";

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// Authentication Constants
// ============================================================================

pub const DEFAULT_JWT_ALGORITHM: &str = "HS256";

/// Session token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Magic-link lifetime in minutes.
pub const DEFAULT_CREDENTIAL_TTL_MINUTES: i64 = 15;

/// Longest accepted session token lifetime (30 days).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Longest accepted magic-link lifetime (1 day).
pub const MAX_CREDENTIAL_TTL_MINUTES: i64 = 24 * 60;

/// Interval between sweeps of expired magic links, in seconds.
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 300;

/// argon2 memory cost in KiB (19 MiB).
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;

/// argon2 iteration count.
pub const DEFAULT_HASH_ITERATIONS: u32 = 2;

/// argon2 lanes.
pub const DEFAULT_HASH_PARALLELISM: u32 = 1;

// ============================================================================
// Mail Constants
// ============================================================================

pub const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub warehouse: WarehouseConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,

    /// Product name used in emails
    pub api_name: String,

    /// Public origin magic links point at
    pub base_url: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub token_ttl_minutes: i64,
    pub credential_ttl_minutes: i64,
    pub purge_interval_secs: u64,
    pub hash: HashCost,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("credential_ttl_minutes", &self.credential_ttl_minutes)
            .field("purge_interval_secs", &self.purge_interval_secs)
            .field("hash", &self.hash)
            .finish()
    }
}

/// argon2id cost parameters for magic-link hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_HASH_MEMORY_KIB,
            iterations: DEFAULT_HASH_ITERATIONS,
            parallelism: DEFAULT_HASH_PARALLELISM,
        }
    }
}

/// Outbound email settings.
///
/// When `api_url`, `api_key` or `sender_email` is missing the server logs
/// links instead of sending them.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub timeout_secs: u64,

    /// Fail `/log-in` with 500 when the email cannot be sent
    pub strict_delivery: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            sender_email: None,
            sender_name: None,
            timeout_secs: DEFAULT_MAIL_TIMEOUT_SECS,
            strict_delivery: false,
        }
    }
}

impl MailConfig {
    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some() && self.sender_email.is_some()
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("strict_delivery", &self.strict_delivery)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env::string_or("DEALFLOW_HOST", DEFAULT_SERVER_HOST),
                port: env::parse_or("DEALFLOW_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env::parse_or(
                    "DEALFLOW_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
                api_name: env::string_or("API_NAME", DEFAULT_API_NAME),
                base_url: env::non_empty("BASE_API_DOMAIN").unwrap_or_default(),
            },
            auth: AuthConfig {
                jwt_secret: env::non_empty("JWT_SECRET_KEY").unwrap_or_default(),
                jwt_algorithm: env::string_or("JWT_ALGORITHM", DEFAULT_JWT_ALGORITHM),
                token_ttl_minutes: env::parse_or(
                    "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
                    DEFAULT_TOKEN_TTL_MINUTES,
                ),
                credential_ttl_minutes: env::parse_or(
                    "MAGIC_LINK_EXPIRE_MINUTES",
                    DEFAULT_CREDENTIAL_TTL_MINUTES,
                ),
                purge_interval_secs: env::parse_or(
                    "MAGIC_LINK_PURGE_INTERVAL_SECS",
                    DEFAULT_PURGE_INTERVAL_SECS,
                ),
                hash: HashCost {
                    memory_kib: env::parse_or("MAGIC_LINK_HASH_MEMORY_KIB", DEFAULT_HASH_MEMORY_KIB),
                    iterations: env::parse_or("MAGIC_LINK_HASH_ITERATIONS", DEFAULT_HASH_ITERATIONS),
                    parallelism: DEFAULT_HASH_PARALLELISM,
                },
            },
            mail: MailConfig {
                api_url: env::non_empty("MAIL_API_URL"),
                api_key: env::non_empty("MAIL_API_KEY"),
                sender_email: env::non_empty("MAIL_SENDER_EMAIL"),
                sender_name: env::non_empty("MAIL_SENDER_NAME"),
                timeout_secs: env::parse_or("MAIL_TIMEOUT_SECS", DEFAULT_MAIL_TIMEOUT_SECS),
                strict_delivery: env::parse_or("MAIL_STRICT_DELIVERY", false),
            },
            warehouse: WarehouseConfig::from_env()?,
            cors: CorsConfig {
                allowed_origins: env::string_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env::parse_or("CORS_ALLOW_CREDENTIALS", true),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.server.base_url.is_empty() {
            anyhow::bail!("BASE_API_DOMAIN must be set to the public URL of this server");
        }
        let base = Url::parse(&self.server.base_url)
            .map_err(|e| anyhow::anyhow!("BASE_API_DOMAIN is not a valid URL: {}", e))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("BASE_API_DOMAIN must be an absolute http(s) URL");
        }

        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET_KEY must be set");
        }
        if !matches!(self.auth.jwt_algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            anyhow::bail!(
                "Unsupported JWT_ALGORITHM '{}': only HS256, HS384 and HS512 are supported",
                self.auth.jwt_algorithm
            );
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.auth.token_ttl_minutes) {
            anyhow::bail!(
                "JWT_ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            );
        }
        if !(1..=MAX_CREDENTIAL_TTL_MINUTES).contains(&self.auth.credential_ttl_minutes) {
            anyhow::bail!(
                "MAGIC_LINK_EXPIRE_MINUTES must be between 1 and {}",
                MAX_CREDENTIAL_TTL_MINUTES
            );
        }
        if self.auth.purge_interval_secs == 0 {
            anyhow::bail!("MAGIC_LINK_PURGE_INTERVAL_SECS must be greater than 0");
        }

        if self.mail.strict_delivery && !self.mail.is_configured() {
            tracing::warn!("MAIL_STRICT_DELIVERY is set but no mail transport is configured");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        self.warehouse.validate()?;

        Ok(())
    }
}
