use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use murmur::api::{self, ApiClient, Backoff, LiveEvent, PageQuery, Resource};
use murmur::config::Config;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

mod app;
mod ui;

use app::{App, AppEvent, LiveStatus};

/// Capacity of the live-event channel. The stream task waits when the UI
/// falls behind.
const LIVE_CHANNEL_CAPACITY: usize = 64;

/// Get the config directory path (~/.config/murmur/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("murmur");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "murmur", about = "Terminal client for a social network")]
struct Args {
    /// Config file (default: ~/.config/murmur/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API base URL, overriding the config file
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Items per page, overriding the config file
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Do not subscribe to live updates
    #[arg(long)]
    no_live: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Which list to open.
#[derive(Subcommand, Debug)]
enum Command {
    /// Home timeline (default)
    Timeline,
    /// Your notifications
    Notifications,
    /// Comments on a post, oldest first
    Comments { post_id: String },
    /// Browse or search users
    Users {
        #[arg(long)]
        search: Option<String>,
    },
    /// Users following someone
    Followers { username: String },
    /// Users someone follows
    Followees { username: String },
}

/// The list screen a subcommand opens. No subcommand means the timeline.
fn resource_for(command: Option<Command>) -> Resource {
    match command {
        None | Some(Command::Timeline) => Resource::Timeline,
        Some(Command::Notifications) => Resource::Notifications,
        Some(Command::Comments { post_id }) => Resource::Comments { post_id },
        Some(Command::Users { search }) => Resource::Users { search },
        Some(Command::Followers { username }) => Resource::Followers { username },
        Some(Command::Followees { username }) => Resource::Followees { username },
    }
}

/// Create the config directory with user-only permissions.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

/// Log to a file in the config directory; stderr belongs to the TUI.
fn init_tracing(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("murmur.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_tracing(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;

    if let Some(url) = args.api_url.clone() {
        config.api_url = url;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if args.no_live {
        config.live_updates = false;
    }
    config.validate().context("Invalid configuration")?;

    let resource = resource_for(args.command);
    let client = ApiClient::new(&config.api_url, config.resolve_token())
        .context("Failed to create API client")?;

    tracing::info!(resource = ?resource, api = %client.base_url(), "Starting");
    println!("Loading {}...", resource.title());

    let first_page = client
        .fetch_page(&resource, PageQuery::older(None, config.page_size))
        .await
        .with_context(|| format!("Failed to load {}", resource.title()))?;

    let mut app = App::new(&client, resource, first_page, &config)
        .context("Failed to create application")?;

    // Create event channels for background tasks and the live stream
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let (live_tx, live_rx) = mpsc::channel::<LiveEvent>(LIVE_CHANNEL_CAPACITY);

    if config.live_updates {
        if let Some(subscription) =
            api::subscribe(&client, &app.resource, Backoff::default(), live_tx)
        {
            app.feed.attach(subscription);
            app.live = LiveStatus::Connecting;
        }
    }

    // A short first page can leave the sentinel in view before any key press
    if app.feed.sentinel_visible() {
        ui::spawn_load(&mut app, &event_tx);
    }

    ui::run(&mut app, event_tx, event_rx, live_rx).await?;

    Ok(())
}
