//! Application configuration for chatblog.
//!
//! User config lives at `~/.chatblog/chatblog.toml`.
//! CLI flags override config file values, which override defaults.
//! The file names environment variables; secrets themselves are resolved
//! once into [`DiscordCredentials`] / [`PolishCredentials`] and passed down.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChatBlogError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "chatblog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".chatblog";

// ---------------------------------------------------------------------------
// Config structs (matching chatblog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where posts and the post index are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Discord channel source settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Azure OpenAI polishing settings.
    #[serde(default)]
    pub polish: PolishConfig,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving generated `.md` posts.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// File name of the post index, written inside `content_dir`.
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Site path prefix for index entries.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            index_file: default_index_file(),
            path_prefix: default_path_prefix(),
        }
    }
}

fn default_content_dir() -> String {
    "content/blog".into()
}
fn default_index_file() -> String {
    "query-index.json".into()
}
fn default_path_prefix() -> String {
    "/blog".into()
}

/// `[discord]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Name of the env var holding the bot token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Name of the env var holding the channel id.
    #[serde(default = "default_channel_id_env")]
    pub channel_id_env: String,

    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Messages fetched per run (the platform caps a page at 100).
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            channel_id_env: default_channel_id_env(),
            api_base: default_api_base(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_token_env() -> String {
    "DISCORD_TOKEN".into()
}
fn default_channel_id_env() -> String {
    "DISCORD_CHANNEL_ID".into()
}
fn default_api_base() -> String {
    "https://discord.com/api/v10".into()
}
fn default_fetch_limit() -> u32 {
    100
}

/// `[polish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolishConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,

    #[serde(default = "default_deployment_env")]
    pub deployment_env: String,

    /// Azure OpenAI REST API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sampling temperature sent with every completion request.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout. Expiry counts as a polish failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint_env: default_endpoint_env(),
            deployment_env: default_deployment_env(),
            api_version: default_api_version(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "AZURE_OPENAI_API_KEY".into()
}
fn default_endpoint_env() -> String {
    "AZURE_OPENAI_ENDPOINT".into()
}
fn default_deployment_env() -> String {
    "AZURE_OPENAI_DEPLOYMENT".into()
}
fn default_api_version() -> String {
    "2023-05-15".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// Resolved credentials (runtime, explicit values)
// ---------------------------------------------------------------------------

/// Discord access resolved from the environment.
#[derive(Clone)]
pub struct DiscordCredentials {
    pub token: String,
    pub channel_id: String,
}

impl std::fmt::Debug for DiscordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordCredentials")
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// Azure OpenAI access resolved from the environment.
#[derive(Clone)]
pub struct PolishCredentials {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
}

impl std::fmt::Debug for PolishCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolishCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .finish()
    }
}

/// Resolve the Discord token and channel id. Missing or empty values are fatal.
///
/// `lookup` maps an env var name to its value; the CLI passes
/// `|name| std::env::var(name).ok()`.
pub fn resolve_discord_credentials(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DiscordCredentials> {
    let token = non_empty(&lookup, &config.discord.token_env);
    let channel_id = non_empty(&lookup, &config.discord.channel_id_env);

    match (token, channel_id) {
        (Some(token), Some(channel_id)) => Ok(DiscordCredentials { token, channel_id }),
        _ => Err(ChatBlogError::config(format!(
            "environment variables {} and {} must be set",
            config.discord.token_env, config.discord.channel_id_env
        ))),
    }
}

/// Resolve Azure OpenAI credentials. Returns `None` unless all three are set.
pub fn resolve_polish_credentials(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<PolishCredentials> {
    Some(PolishCredentials {
        api_key: non_empty(&lookup, &config.polish.api_key_env)?,
        endpoint: non_empty(&lookup, &config.polish.endpoint_env)?,
        deployment: non_empty(&lookup, &config.polish.deployment_env)?,
    })
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.chatblog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ChatBlogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.chatblog/chatblog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ChatBlogError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ChatBlogError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ChatBlogError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ChatBlogError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ChatBlogError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
