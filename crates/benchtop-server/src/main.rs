//! benchtop server binary.
//!
//! Reads `benchtop.toml` (or the path given with `--config`) plus
//! `BENCHTOP_*` environment variables, opens the configured backend, and
//! serves the admin API over HTTP.
//!
//! # Token hash generation
//!
//! To generate the argon2 PHC string for `admin_token_hash`:
//!
//! ```text
//! cargo run -p benchtop-server -- --hash-token
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use benchtop_api::AuthConfig;
use benchtop_core::store::ConfigStore;
use benchtop_server::{Backend, ServerConfig, expand_tilde};
use benchtop_store_csv::CsvStore;
use benchtop_store_sqlite::SqliteStore;
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "benchtop configuration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "benchtop.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a token entered on stdin and exit.
  #[arg(long)]
  hash_token: bool,
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

  if cli.hash_token {
    let token = read_token()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(token.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;
  let auth = Arc::new(cfg.auth());
  if auth.token_hash.is_none() && !auth.allow_unauthenticated {
    tracing::warn!("no admin_token_hash configured; writes will be rejected");
  }

  match cfg.backend {
    Backend::Csv => {
      let path = expand_tilde(&cfg.csv_path);
      tracing::info!(?path, "using CSV backend");
      serve(CsvStore::open(path), auth, &cfg).await
    }
    Backend::Sqlite => {
      let path = expand_tilde(&cfg.sqlite_path);
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {parent:?}"))?;
      }
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(?path, "using SQLite backend");
      serve(store, auth, &cfg).await
    }
  }
}

async fn serve<S>(store: S, auth: Arc<AuthConfig>, cfg: &ServerConfig) -> anyhow::Result<()>
where
  S: ConfigStore + Clone + 'static,
{
  let app = benchtop_server::router(Arc::new(store), auth);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .await
  .context("server error")?;

  Ok(())
}

/// Read a token from stdin.
fn read_token() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Token: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let token = line.trim_end_matches(['\n', '\r']).to_owned();
  anyhow::ensure!(!token.is_empty(), "token must not be empty");
  Ok(token)
}
