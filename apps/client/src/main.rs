mod auth;
mod backend;
mod cli;
mod config;
mod dashboard;
mod editor;
mod errors;
mod messages;
mod models;
mod routes;
mod session;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::SupabaseClient;
use crate::cli::Cli;
use crate::config::Config;
use crate::session::SessionClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume client v{}", env!("CARGO_PKG_VERSION"));

    let backend = SupabaseClient::new(
        &config.supabase_url,
        &config.supabase_anon_key,
        config.http_timeout(),
    )?;
    info!("Backend client initialized ({})", config.supabase_url);

    let client = SessionClient::new(Arc::new(backend));
    cli::run(cli, client, config.editor_settings()).await
}
