//! Shared types, error model, and configuration for chatblog.
//!
//! This crate is the foundation depended on by all other chatblog crates.
//! It provides:
//! - [`ChatBlogError`] : the unified error type
//! - Domain types ([`Message`], [`Conversation`], [`Post`], [`PostIndexEntry`], [`RunId`])
//! - Configuration ([`AppConfig`], credential resolution, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DiscordConfig, DiscordCredentials, OutputConfig, PolishConfig, PolishCredentials,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_discord_credentials, resolve_polish_credentials,
};
pub use error::{ChatBlogError, Result};
pub use types::{
    Conversation, INACTIVITY_GAP_MS, MIN_CONVERSATION_LEN, Message, Post, PostIndex,
    PostIndexEntry, RunId,
};
