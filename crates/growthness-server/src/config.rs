//! Configuration file management for growthness.
//!
//! Provides a TOML-based config file at `~/.config/growthness/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use growthness_core::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, LlmConfig};
use growthness_core::token::{DEFAULT_TOKEN_TTL_SECS, TokenConfig};
use growthness_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes).
    pub token_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the growthness config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/growthness` or
/// `~/.config/growthness`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("growthness");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("growthness")
}

/// Return the path to the growthness config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file holds the token secret and possibly an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Token secret generation
// -----------------------------------------------------------------------

/// Generate a random token secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct GrowthConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
    pub llm_config: LlmConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_secs(name: &str) -> Result<Option<u64>> {
    env_var(name)
        .map(|v| {
            v.parse::<u64>()
                .with_context(|| format!("{name} must be a number of seconds, got {v:?}"))
        })
        .transpose()
}

impl GrowthConfig {
    /// Resolve only the database settings. Commands that never touch tokens
    /// or the model (`db-init`) use this so they work without a secret.
    ///
    /// `cli_db_url` > `GROWTH_DATABASE_URL` > `[database].url` > default.
    pub fn resolve_db(cli_db_url: Option<&str>) -> DbConfig {
        let file_config = load_config().ok();
        Self::db_from(cli_db_url, file_config.as_ref())
    }

    fn db_from(cli_db_url: Option<&str>, file_config: Option<&ConfigFile>) -> DbConfig {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Some(url) = env_var("GROWTH_DATABASE_URL") {
            url
        } else if let Some(cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        DbConfig::new(db_url)
    }

    /// Resolve everything the HTTP server needs.
    ///
    /// - Token secret: `GROWTH_TOKEN_SECRET` env > `[auth].token_secret` > error
    /// - Token lifetime: `GROWTH_TOKEN_TTL_SECS` > `[auth].token_ttl_secs` > one day
    /// - LLM: `OPENAI_API_KEY`, `GROWTH_LLM_BASE_URL`, `GROWTH_LLM_MODEL`,
    ///   `GROWTH_LLM_TIMEOUT_SECS`, each over its `[llm]` key, over the
    ///   built-in defaults
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();
        Self::resolve_with(cli_db_url, file_config.as_ref())
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<&ConfigFile>) -> Result<Self> {
        let db_config = Self::db_from(cli_db_url, file_config);

        let ttl_secs = match env_secs("GROWTH_TOKEN_TTL_SECS")? {
            Some(secs) => secs,
            None => file_config
                .and_then(|cfg| cfg.auth.token_ttl_secs)
                .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        };
        let ttl = chrono::Duration::seconds(
            i64::try_from(ttl_secs).context("token lifetime is out of range")?,
        );

        let token_config = if let Some(secret_hex) = env_var("GROWTH_TOKEN_SECRET") {
            TokenConfig::from_hex(&secret_hex, ttl)
                .context("GROWTH_TOKEN_SECRET env var is not valid hex")?
        } else if let Some(cfg) = file_config {
            TokenConfig::from_hex(&cfg.auth.token_secret, ttl)
                .context("invalid hex in config file token_secret")?
        } else {
            bail!(
                "token secret not found; set GROWTH_TOKEN_SECRET or run `growthness init` to create a config file"
            );
        };

        let llm = file_config.map(|cfg| &cfg.llm);
        let timeout_secs = match env_secs("GROWTH_LLM_TIMEOUT_SECS")? {
            Some(secs) => secs,
            None => llm
                .and_then(|l| l.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let llm_config = LlmConfig {
            api_key: env_var("OPENAI_API_KEY").or_else(|| llm.and_then(|l| l.api_key.clone())),
            base_url: env_var("GROWTH_LLM_BASE_URL")
                .or_else(|| llm.and_then(|l| l.base_url.clone()))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: env_var("GROWTH_LLM_MODEL")
                .or_else(|| llm.and_then(|l| l.model.clone()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            db_config,
            token_config,
            llm_config,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
