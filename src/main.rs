use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

use cuedeck::app::{App, AppEvent};
use cuedeck::config::Config;
use cuedeck::export::{export_to, ExportScope};
use cuedeck::storage::{Database, StoreError, UrlPatch};
use cuedeck::title::{fallback_title, http_client, resolve_title};
use cuedeck::ui;

/// Get the config directory path (~/.config/cuedeck/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("cuedeck");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "cuedeck",
    version,
    about = "Snippets and an ordered URL deck in the terminal"
)]
struct Args {
    /// Use this database file instead of the one in the config directory
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Use this config file instead of ~/.config/cuedeck/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Export snippets and URLs as JSON to FILE and exit
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Append URL to the deck and exit (repeatable)
    #[arg(long = "add-url", value_name = "URL")]
    add_urls: Vec<String>,
}

/// Log to a file in the data directory; the terminal belongs to the TUI.
fn init_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("cuedeck.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cuedeck=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", dir.display());
    }

    // User-only access on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(dir, perms) {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

/// Add URLs without starting the TUI. Titles are looked up inline.
async fn add_urls_headless(db: &Database, config: &Config, urls: &[String]) -> Result<()> {
    let client = http_client(&config.user_agent).context("Failed to build HTTP client")?;

    for url in urls {
        let fallback = fallback_title(url.trim());
        let id = match db.add_url(url, Some(&fallback)).await {
            Ok(id) => id,
            Err(e) if e.is_validation() => {
                eprintln!("Skipping '{}': {}", url, e);
                continue;
            }
            Err(e) => return Err(e).context("Failed to add URL"),
        };

        let mut label = fallback.clone();
        if config.fetch_titles {
            match resolve_title(&client, url.trim()).await {
                Ok(title) if title != fallback => {
                    db.update_url(id, &UrlPatch::title(title.clone())).await?;
                    label = title;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(url = %url, error = %e, "Title lookup failed"),
            }
        }
        println!("Added #{}: {}", id, label);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_private_dir(&config_dir)?;
    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;

    let db_path = args.db.clone().unwrap_or_else(|| config_dir.join("cuedeck.db"));

    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(StoreError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of cuedeck appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    // Headless modes
    if !args.add_urls.is_empty() || args.export.is_some() {
        if !args.add_urls.is_empty() {
            add_urls_headless(&db, &config, &args.add_urls).await?;
        }
        if let Some(path) = &args.export {
            let written = export_to(&db, ExportScope::All, path)
                .await
                .context("Export failed")?;
            println!("Exported to {}", written.display());
        }
        return Ok(());
    }

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    let mut app = App::new(db, config, config_dir, event_tx)
        .context("Failed to create application")?;
    app.load().await.context("Failed to load data")?;

    ui::run(&mut app, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
