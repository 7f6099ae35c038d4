use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Port the HTTP API listens on (default: 3000)
    pub api_port: u16,

    /// Telegram bot token. When absent, messages are only logged.
    pub telegram_bot_token: Option<String>,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Per-request timeout for Telegram calls in seconds (default: 10)
    pub telegram_timeout_secs: u64,

    /// Maximum number of in-flight sends per notification (default: 8)
    pub dispatch_concurrency: usize,

    /// Optional deadline for one whole dispatch, in seconds
    pub dispatch_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            api_port: lookup("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.is_empty()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string()),
            telegram_timeout_secs: lookup("TELEGRAM_TIMEOUT_SECS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("TELEGRAM_TIMEOUT_SECS must be a valid u64"))?,
            dispatch_concurrency: lookup("DISPATCH_CONCURRENCY")
                .unwrap_or_else(|| "8".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_CONCURRENCY must be a valid usize"))?,
            dispatch_timeout_secs: lookup("DISPATCH_TIMEOUT_SECS")
                .map(|v| {
                    v.parse()
                        .map_err(|_| anyhow::anyhow!("DISPATCH_TIMEOUT_SECS must be a valid u64"))
                })
                .transpose()?,
        };

        if config.dispatch_concurrency == 0 {
            anyhow::bail!("DISPATCH_CONCURRENCY must be at least 1");
        }

        Ok(config)
    }
}
