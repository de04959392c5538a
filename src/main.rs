// Entry point of the comment moderation service.
//
// **Architecture Overview:**
// - `core/` = Moderation policy (no transport dependencies)
// - `infra/` = Implementations of core traits (data API, KV stores)
//
// This file's job is to:
// 1. Load configuration from the environment
// 2. Initialize services (dependency injection)
// 3. Run one command against stdin/stdout
//
// Commands:
//   moderate     read a Submission as JSON, print the resulting status
//   set-config   read ModerationSettings as JSON, validate and store them
//   show-config  print the stored ModerationSettings

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{
    ModerationError, ModerationService, ModerationSettings, Submission,
};
use crate::infra::kv::SqliteKvStore;
use crate::infra::moderation::{HttpHistoryFetcher, KvCacheInvalidator, KvConfigStore};
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_KV_DATABASE_URL: &str = "data/kv.db";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings read from the environment (and `.env`, if present).
struct AppConfig {
    data_api_url: String,
    data_api_token: Option<String>,
    data_api_timeout: Duration,
    kv_database_url: String,
}

impl AppConfig {
    fn from_env() -> Result<Self> {
        let data_api_url = std::env::var("DATA_API_URL").context("DATA_API_URL not set")?;
        let data_api_token = std::env::var("DATA_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        let timeout_secs = match std::env::var("DATA_API_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .with_context(|| format!("DATA_API_TIMEOUT_SECS is not a number: {}", v))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let kv_database_url = std::env::var("KV_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_KV_DATABASE_URL.to_string());

        Ok(Self {
            data_api_url,
            data_api_token,
            data_api_timeout: Duration::from_secs(timeout_secs),
            kv_database_url,
        })
    }
}

fn read_stdin_json<T: serde::de::DeserializeOwned>() -> Result<T> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    serde_json::from_str(&input).context("stdin is not valid JSON for this command")
}

fn print_error(err: &ModerationError) {
    let body = serde_json::json!({
        "error": err.code(),
        "message": err.to_string(),
    });
    println!("{}", body);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("comment_moderation=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "moderate".to_string());
    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One KV store backs both the settings and the comment listing cache.

    let kv = Arc::new(
        SqliteKvStore::new(&config.kv_database_url)
            .await
            .context("Failed to initialize KV store")?,
    );
    let history = HttpHistoryFetcher::new(
        config.data_api_url,
        config.data_api_token,
        config.data_api_timeout,
    )?;
    let service = ModerationService::new(
        history,
        KvCacheInvalidator::new(Arc::clone(&kv)),
        KvConfigStore::new(Arc::clone(&kv)),
    );

    match command.as_str() {
        "moderate" => {
            let submission: Submission = read_stdin_json()?;
            match service.moderate(&submission).await {
                Ok(status) => {
                    let body = serde_json::json!({
                        "status": status.code(),
                        "label": status.to_string(),
                    });
                    println!("{}", body);
                }
                Err(err) => {
                    print_error(&err);
                    if !err.is_user_facing() {
                        tracing::error!("Moderation failed: {}", err);
                        std::process::exit(2);
                    }
                    std::process::exit(1);
                }
            }
        }
        "set-config" => {
            let settings: ModerationSettings = read_stdin_json()?;
            if let Err(err) = service.update_settings(settings).await {
                print_error(&err);
                std::process::exit(1);
            }
            println!("{}", serde_json::json!({ "ok": true }));
        }
        "show-config" => {
            let settings = service.get_settings().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        other => bail!(
            "Unknown command '{}'. Expected moderate, set-config or show-config",
            other
        ),
    }

    Ok(())
}
