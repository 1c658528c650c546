//! `benchtop`: command-line access to the benchtop configuration store and
//! the quiz validation harness.
//!
//! # Usage
//!
//! ```text
//! benchtop config set seo.title "Lab Essentials" --by alice
//! benchtop remote --url http://localhost:3000 --token … get seo.title
//! benchtop quiz validate --cases quiz_test_cases.csv --products products.json
//! ```

mod client;
mod local;
mod quiz;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use benchtop_core::record::KeyValue;
use benchtop_store_csv::CsvStore;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, Listing};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "benchtop", about = "Manage benchtop configuration and validate the quiz")]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Read and write the configuration CSV file directly.
  Config {
    /// Path to the configuration file.
    #[arg(long, env = "BENCHTOP_CSV", default_value = "data/config_store/config.csv")]
    file: PathBuf,

    #[command(subcommand)]
    action: ConfigAction,
  },

  /// Talk to a running benchtop server.
  Remote {
    /// Path to a TOML config file (url, token).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the server (default: http://localhost:3000).
    #[arg(long, env = "BENCHTOP_URL")]
    url: Option<String>,

    /// Admin token for write operations.
    #[arg(long, env = "BENCHTOP_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    action: RemoteAction,
  },

  /// Quiz scoring tools.
  Quiz {
    #[command(subcommand)]
    action: QuizAction,
  },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ConfigAction {
  /// Print the value for a key.
  Get {
    key:      String,
    /// Printed instead of failing when the key is absent.
    #[arg(long)]
    fallback: Option<String>,
  },
  /// List keys and values.
  List {
    #[arg(long, conflicts_with = "search")]
    prefix: Option<String>,
    /// Case-insensitive regular expression over keys.
    #[arg(long)]
    search: Option<String>,
  },
  /// Insert or update a key.
  Set {
    key:            String,
    value:          String,
    #[arg(long, default_value = "cli")]
    by:             String,
    /// Fail unless the key is currently at this version.
    #[arg(long)]
    expect_version: Option<u64>,
  },
  /// Apply several `key=value` updates in one write.
  SetBatch {
    #[arg(required = true, value_parser = local::parse_pair)]
    pairs: Vec<KeyValue>,
    #[arg(long, default_value = "cli")]
    by:    String,
  },
  /// Remove a key.
  Delete { key: String },
  /// Show a key's history, from git or from backup snapshots.
  History {
    key:     String,
    #[arg(long)]
    backups: bool,
  },
  /// Write a past value back as a new version.
  Revert {
    key:   String,
    value: String,
    #[arg(long, default_value = "cli")]
    by:    String,
  },
  /// Copy the current file into the backups directory.
  Snapshot,
}

#[derive(Subcommand, Debug)]
enum RemoteAction {
  Get { key: String },
  List {
    #[arg(long, conflicts_with = "search")]
    prefix: Option<String>,
    #[arg(long)]
    search: Option<String>,
  },
  Set {
    key:            String,
    value:          String,
    #[arg(long)]
    by:             Option<String>,
    #[arg(long)]
    expect_version: Option<u64>,
  },
  Delete { key: String },
  History { key: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum QuizAction {
  /// Score every test case, report, and optimise weights if needed.
  Validate {
    #[arg(long)]
    cases:            PathBuf,
    #[arg(long)]
    products:         PathBuf,
    #[arg(long, default_value = "initial_validation_report.txt")]
    report:           PathBuf,
    #[arg(long, default_value = "optimized_validation_report.txt")]
    optimized_report: PathBuf,
    /// Run the weight search when type accuracy is below this percentage.
    #[arg(long, default_value_t = 90.0)]
    optimize_below:   f64,
    #[arg(long, default_value = "optimized_weights.json")]
    weights_out:      PathBuf,
    #[arg(long, default_value_t = benchtop_quiz::validator::DEFAULT_MAX_ITERATIONS)]
    max_iterations:   usize,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

fn api_config(
  config: Option<PathBuf>,
  url: Option<String>,
  token: Option<String>,
) -> Result<ApiConfig> {
  let file_cfg: ConfigFile = if let Some(path) = &config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  Ok(ApiConfig {
    base_url: url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:3000".to_string()),
    token:    token
      .or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone()))
      .unwrap_or_default(),
  })
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  match Args::parse().command {
    Command::Config { file, action } => local::run(&CsvStore::open(file), action).await,
    Command::Remote { config, url, token, action } => {
      let client = ApiClient::new(api_config(config, url, token)?)?;
      remote(&client, action).await
    }
    Command::Quiz { action } => quiz::run(action),
  }
}

async fn remote(client: &ApiClient, action: RemoteAction) -> Result<()> {
  match action {
    RemoteAction::Get { key } => match client.get(&key).await? {
      Some(kv) => println!("{}", kv.value),
      None => bail!("Configuration key not found: {key}"),
    },
    RemoteAction::List { prefix, search } => {
      let listing = match (prefix, search) {
        (Some(p), _) => Listing::Prefix(p),
        (None, Some(s)) => Listing::Search(s),
        (None, None) => Listing::All,
      };
      for kv in client.list(&listing).await? {
        println!("{}\t{}", kv.key, kv.value);
      }
    }
    RemoteAction::Set { key, value, by, expect_version } => {
      let resp = client.set(&key, &value, by.as_deref(), expect_version).await?;
      println!("{}", serde_json::to_string_pretty(&resp)?);
    }
    RemoteAction::Delete { key } => {
      let resp = client.delete(&key).await?;
      println!("{}", serde_json::to_string_pretty(&resp)?);
    }
    RemoteAction::History { key } => {
      let Some(history) = client.history(&key).await? else {
        bail!("Configuration key not found: {key}");
      };
      println!("current: {}", local::describe(&history.current));
      for entry in &history.history {
        println!("{}", local::describe_entry(entry));
      }
    }
  }
  Ok(())
}
