//! Configuration file management.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use cambiatus_claims::{Credentials, FeedConfig};
use cambiatus_dashboard::{Context, DashboardConfig, Session};
use cambiatus_types::{Account, Symbol};

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API endpoints.
    #[serde(default)]
    pub api: ApiConfig,
    /// Blockchain settings.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Page sizes.
    #[serde(default)]
    pub feed: FeedSettings,
    /// The signed-in member.
    #[serde(default)]
    pub session: SessionConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    /// Balance endpoint; the account is appended as a path segment.
    #[serde(default = "default_balance_url")]
    pub balance_url: String,
    /// Public web app URL, used to build invite links.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

/// Blockchain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Unix socket of the signer. Empty = $data_dir/signer.sock.
    #[serde(default)]
    pub signer_socket: String,
    /// Contract that receives verification votes.
    #[serde(default = "default_contract")]
    pub contract: String,
}

/// Page sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_first_page_size")]
    pub first_page_size: u32,
    /// Claims requested per top-up or "load more".
    #[serde(default = "default_next_page_size")]
    pub next_page_size: u32,
    #[serde(default = "default_transfers_page_size")]
    pub transfers_page_size: u32,
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Account name of the member.
    #[serde(default)]
    pub account: String,
    /// Community symbol, e.g. "4,BES".
    #[serde(default)]
    pub community: String,
    /// Environment variable holding the API bearer token.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Notices kept before the oldest is dropped.
    #[serde(default = "default_max_notices")]
    pub max_notices: usize,
    /// Event bus buffer per subscriber.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

// Default value functions

fn default_graphql_url() -> String {
    "https://api.cambiatus.io/api/graph".to_string()
}

fn default_balance_url() -> String {
    "https://api.cambiatus.io/api/balances".to_string()
}

fn default_app_url() -> String {
    "https://app.cambiatus.io".to_string()
}

fn default_contract() -> String {
    "cambiatus.cm".to_string()
}

fn default_first_page_size() -> u32 {
    cambiatus_claims::feed::DEFAULT_FIRST_PAGE_SIZE
}

fn default_next_page_size() -> u32 {
    cambiatus_claims::feed::DEFAULT_NEXT_PAGE_SIZE
}

fn default_transfers_page_size() -> u32 {
    cambiatus_dashboard::context::DEFAULT_TRANSFERS_PAGE_SIZE
}

fn default_auth_token_env() -> String {
    "CAMBIATUS_AUTH_TOKEN".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_notices() -> usize {
    cambiatus_dashboard::context::DEFAULT_MAX_NOTICES
}

fn default_event_buffer() -> usize {
    256
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            graphql_url: default_graphql_url(),
            balance_url: default_balance_url(),
            app_url: default_app_url(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            signer_socket: String::new(),
            contract: default_contract(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            first_page_size: default_first_page_size(),
            next_page_size: default_next_page_size(),
            transfers_page_size: default_transfers_page_size(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            community: String::new(),
            auth_token_env: default_auth_token_env(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_notices: default_max_notices(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse a TOML document.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the signer socket path.
    pub fn signer_socket(&self) -> PathBuf {
        if self.chain.signer_socket.is_empty() {
            Self::data_dir().join("signer.sock")
        } else {
            PathBuf::from(&self.chain.signer_socket)
        }
    }

    /// Build the dashboard context. The bearer token is read from the
    /// environment variable named in `[session]`.
    pub fn context(&self) -> anyhow::Result<Context> {
        let auth_token = std::env::var(&self.session.auth_token_env)
            .ok()
            .filter(|token| !token.is_empty());
        self.context_with_token(auth_token)
    }

    fn context_with_token(&self, auth_token: Option<String>) -> anyhow::Result<Context> {
        let account: Account = self
            .session
            .account
            .parse()
            .with_context(|| format!("invalid session account '{}'", self.session.account))?;
        let community: Symbol = self
            .session
            .community
            .parse()
            .with_context(|| format!("invalid community symbol '{}'", self.session.community))?;
        let contract: Account = self
            .chain
            .contract
            .parse()
            .with_context(|| format!("invalid contract '{}'", self.chain.contract))?;

        let mut config = DashboardConfig::new(contract);
        config.feed = FeedConfig {
            first_page_size: self.feed.first_page_size,
            next_page_size: self.feed.next_page_size,
        };
        config.transfers_page_size = self.feed.transfers_page_size;
        config.app_url = self.api.app_url.clone();
        config.max_notices = self.advanced.max_notices;

        // The signer decides whether a key is unlocked; until it says so
        // every vote goes through authentication first.
        let session = Session {
            account,
            community,
            auth_token,
            credentials: Credentials::Missing,
        };
        Ok(Context::new(session, config))
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        // Check env var override first
        if let Ok(path) = std::env::var("CAMBIATUS_CONFIG") {
            return PathBuf::from(path);
        }
        Self::data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CAMBIATUS_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Cambiatus")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".cambiatus")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/cambiatus"))
}
