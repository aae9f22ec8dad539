//! grapeiq-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `GRAPEIQ_*` environment variables, opens the SQLite store, and serves the
//! GrapeIQ API over HTTP.
//!
//! # Secret hash generation
//!
//! To generate the argon2 PHC string for `forecast_secret_hash`:
//!
//! ```text
//! cargo run -p grapeiq-api --bin grapeiq-server -- --hash-secret
//! ```
//!
//! # One-off runs
//!
//! `--run-tenant <UUID> [--horizon <DAYS>]` runs a single forecast job in the
//! foreground and exits non-zero if it fails.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use grapeiq_api::{AppState, JobRunner, ServerConfig, auth::hash_secret};
use grapeiq_forecast::{DEFAULT_HORIZON, JobOutcome, JobRequest};
use grapeiq_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "GrapeIQ demand forecasting server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a secret entered on stdin and exit.
  #[arg(long)]
  hash_secret: bool,

  /// Run one forecast job for this tenant in the foreground and exit.
  #[arg(long, value_name = "UUID")]
  run_tenant: Option<Uuid>,

  /// Forecast horizon in days for `--run-tenant`.
  #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_HORIZON)]
  horizon: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_secret {
    let secret = read_secret()?;
    let hash = hash_secret(&secret).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("GRAPEIQ")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  if let Some(tenant_id) = cli.run_tenant {
    return run_once(store, &server_cfg, tenant_id, cli.horizon).await;
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = grapeiq_api::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn run_once(
  store: Arc<SqliteStore>,
  cfg: &ServerConfig,
  tenant_id: Uuid,
  horizon: usize,
) -> anyhow::Result<()> {
  let runner = JobRunner::new(store, cfg.forecast);
  let request = JobRequest::new(tenant_id).with_horizon(horizon);

  match runner.run(request).await? {
    JobOutcome::Completed(report) => {
      println!("wrote {} forecast rows for {} SKUs", report.rows_written, report.skus_processed);
      Ok(())
    }
    JobOutcome::NoHistory => {
      println!("tenant {tenant_id} has no sales history; nothing written");
      Ok(())
    }
    JobOutcome::Failed(e) => Err(anyhow::Error::new(e).context("forecast job failed")),
  }
}

/// Read a secret from stdin.
fn read_secret() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Secret: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
