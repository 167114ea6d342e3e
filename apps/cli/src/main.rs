//! chatblog CLI: turns Discord channel conversations into Markdown blog posts.
//!
//! Fetches recent messages, groups them by inactivity gap, and writes one
//! post per conversation with optional Azure OpenAI polishing.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
