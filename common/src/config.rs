// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for the role gate server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub web_server_addr: String,
    /// Externally visible base URL, used to build the OAuth redirect URI
    pub public_url: String,

    pub session: SessionConfig,
    pub discord: DiscordConfig,
    pub wallet: WalletConfig,
    pub static_files: StaticFilesConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for the Discord session token
    pub secret: String,
    /// Discord session lifetime in seconds
    pub max_age: i64,
    /// Idle lifetime of an anonymous browser session in seconds
    pub browser_ttl: i64,
    pub cleanup_interval: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub bot_token: String,
    pub guild_id: String,
    pub role_id: String,
    pub api_base: String,
    pub authorize_url: String,
    pub scopes: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Wallet SDK client id, forwarded to the RPC provider
    pub client_id: String,
    /// Domain a login payload must be issued for
    pub auth_domain: String,
    pub statement: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub edition_drop_address: String,
    pub token_id: u64,
    /// Validity window of an issued login payload in seconds
    pub login_ttl: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub path: String,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_age: u32,
    pub immutable: bool,
    pub must_revalidate: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_seconds: u64,
    pub paths: Vec<String>,
    /// Key clients by `X-Forwarded-For`. Only safe behind a proxy that sets it.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

// Shipped placeholder; the server refuses to start with it
pub const DEFAULT_SESSION_SECRET: &str = "dev_session_secret";

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            max_age: 30 * 24 * 60 * 60,
            browser_ttl: 86400,
            cleanup_interval: 3600,
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            bot_token: String::new(),
            guild_id: String::new(),
            role_id: String::new(),
            api_base: "https://discord.com/api/v10".to_string(),
            authorize_url: "https://discord.com/oauth2/authorize".to_string(),
            scopes: "identify email".to_string(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            auth_domain: "example.com".to_string(),
            statement: "Please ensure that the domain above matches the URL of the current website.".to_string(),
            chain_id: 80001,
            rpc_url: "https://rpc-mumbai.maticvigil.com".to_string(),
            edition_drop_address: String::new(),
            token_id: 0,
            login_ttl: 600,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
            cache: CacheConfig {
                max_age: 3600,
                immutable: false,
                must_revalidate: true,
            },
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_seconds: 60,
            paths: vec![
                "/api/grant-role".to_string(),
                "/api/wallet/connect".to_string(),
                "/api/wallet/login".to_string(),
            ],
            trust_forwarded_for: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_server_addr: "127.0.0.1:8081".to_string(),
            public_url: "http://localhost:8081".to_string(),
            session: SessionConfig::default(),
            discord: DiscordConfig::default(),
            wallet: WalletConfig::default(),
            static_files: StaticFilesConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        // Serialized defaults go in first so every file layer may be partial
        let defaults = ConfigFile::try_from(&Config::default())?;

        let config = ConfigFile::builder()
            .add_source(defaults)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Local overrides, never committed
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // e.g. APP__DISCORD__BOT_TOKEN
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rate_limit.paths")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to flat environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_flat_env()
            }
        }
    }

    fn from_flat_env() -> Self {
        let defaults = Self::default();

        let session = SessionConfig {
            secret: env::var("SESSION_SECRET")
                .or_else(|_| env::var("NEXTAUTH_SECRET"))
                .unwrap_or(defaults.session.secret),
            max_age: parse_env("SESSION_MAX_AGE", defaults.session.max_age),
            browser_ttl: parse_env("BROWSER_SESSION_TTL", defaults.session.browser_ttl),
            cleanup_interval: parse_env("SESSION_CLEANUP_INTERVAL", defaults.session.cleanup_interval),
        };

        let discord = DiscordConfig {
            client_id: env_or("CLIENT_ID", defaults.discord.client_id),
            client_secret: env_or("CLIENT_SECRET", defaults.discord.client_secret),
            bot_token: env_or("BOT_TOKEN", defaults.discord.bot_token),
            guild_id: env_or("DISCORD_GUILD_ID", defaults.discord.guild_id),
            role_id: env_or("DISCORD_ROLE_ID", defaults.discord.role_id),
            api_base: env_or("DISCORD_API_BASE", defaults.discord.api_base),
            authorize_url: env_or("DISCORD_AUTHORIZE_URL", defaults.discord.authorize_url),
            scopes: defaults.discord.scopes,
        };

        let wallet = WalletConfig {
            client_id: env_or("THIRDWEB_CLIENT_ID", defaults.wallet.client_id),
            auth_domain: env_or("THIRDWEB_AUTH_DOMAIN", defaults.wallet.auth_domain),
            statement: defaults.wallet.statement,
            chain_id: parse_env("CHAIN_ID", defaults.wallet.chain_id),
            rpc_url: env_or("CHAIN_RPC_URL", defaults.wallet.rpc_url),
            edition_drop_address: env_or("EDITION_DROP_ADDRESS", defaults.wallet.edition_drop_address),
            token_id: parse_env("EDITION_DROP_TOKEN_ID", defaults.wallet.token_id),
            login_ttl: parse_env("LOGIN_PAYLOAD_TTL", defaults.wallet.login_ttl),
        };

        let static_files = StaticFilesConfig {
            path: env_or("STATIC_FILES_PATH", defaults.static_files.path),
            cache: CacheConfig {
                max_age: parse_env("CACHE_MAX_AGE", defaults.static_files.cache.max_age),
                immutable: env::var("CACHE_IMMUTABLE")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(defaults.static_files.cache.immutable),
                must_revalidate: env::var("CACHE_MUST_REVALIDATE")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(defaults.static_files.cache.must_revalidate),
            },
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit.max_requests),
            window_seconds: parse_env("RATE_LIMIT_WINDOW_SECONDS", defaults.rate_limit.window_seconds),
            paths: defaults.rate_limit.paths,
            trust_forwarded_for: env::var("RATE_LIMIT_TRUST_FORWARDED_FOR")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(defaults.rate_limit.trust_forwarded_for),
        };

        Self {
            web_server_addr: env_or("WEB_SERVER_ADDR", defaults.web_server_addr),
            public_url: env_or("PUBLIC_URL", defaults.public_url),
            session,
            discord,
            wallet,
            static_files,
            rate_limit,
        }
    }

    /// An empty or placeholder secret lets anyone mint Discord session cookies
    pub fn has_insecure_session_secret(&self) -> bool {
        self.session.secret.is_empty() || self.session.secret == DEFAULT_SESSION_SECRET
    }

    /// Names of credentials that are still empty or left at their shipped
    /// placeholder.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.has_insecure_session_secret() {
            missing.push("session.secret");
        }
        if self.discord.client_id.is_empty() {
            missing.push("discord.client_id");
        }
        if self.discord.client_secret.is_empty() {
            missing.push("discord.client_secret");
        }
        if self.discord.bot_token.is_empty() {
            missing.push("discord.bot_token");
        }
        if self.discord.guild_id.is_empty() {
            missing.push("discord.guild_id");
        }
        if self.discord.role_id.is_empty() {
            missing.push("discord.role_id");
        }
        if self.wallet.edition_drop_address.is_empty() {
            missing.push("wallet.edition_drop_address");
        }
        missing
    }

    /// Redirect URI registered with the Discord application
    pub fn discord_redirect_uri(&self) -> String {
        format!("{}/api/auth/callback/discord", self.public_url.trim_end_matches('/'))
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
