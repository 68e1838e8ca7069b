use super::config::{default_config_path, default_store_path, TetherConfig};
use std::path::{Path, PathBuf};
use tether::gateway::{Bootstrap, DeviceStore, SocketGatewayClient};
use tether::shutdown;
use tracing_subscriber::EnvFilter;

/// Run the companion client
///
/// Pairs with the account on a first run (QR handshake), or resumes the
/// stored device identity, then samples recent chats from the live message
/// stream until interrupted.
///
/// ## Configuration loading
///
/// Configuration is loaded from one of these sources (in order of
/// precedence):
/// 1. `--config` flag if provided
/// 2. Config file adjacent to `--store-path` if provided
/// 3. Default config at `~/.local/share/tether/config.toml`
///
/// If the config file doesn't exist, a default one is generated. The store
/// path itself resolves flag > config > platform default, and
/// `--gateway-url` overrides the configured gateway.
pub async fn execute(
    config_path: Option<String>,
    store_path: Option<String>,
    gateway_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting tether...");
    println!();

    let cli_store = store_path.map(PathBuf::from);
    let store_hint = cli_store.clone().unwrap_or_else(default_store_path);
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(|| default_config_path(&store_hint));

    println!("Config: {}", config_path.display());

    let config = load_or_create(&config_path, &store_hint)?;

    init_logging(&config.logging.level);

    let store_path = cli_store.unwrap_or_else(|| config.gateway.store_path.clone());
    println!("Store: {}", store_path.display());
    println!();

    let store = DeviceStore::open(&store_path).await?;

    let mut settings = config.gateway_settings();
    if let Some(url) = gateway_url {
        settings.url = url;
    }

    let client = SocketGatewayClient::new(settings, store.clone());
    let bootstrap = Bootstrap::new(client, store);

    let (trigger, handle) = shutdown::channel();
    shutdown::spawn_interrupt_listener(trigger);

    bootstrap.ensure_connected().await?;

    println!();
    println!("Fetching recent chats...");
    let (chats, _collector) = bootstrap.collect_recent_chats(config.chats.max_recent);

    println!();
    println!("Most recent chats (waiting for messages):");
    println!("------------------");
    println!("Note: this list fills in as new messages arrive");
    println!("Press Ctrl+C to exit");

    bootstrap.wait_for_shutdown(handle).await;

    if let Ok(record) = chats.lock() {
        if !record.is_empty() {
            println!();
            println!("Conversations observed this session:");
            for (chat, timestamp_ms) in record.snapshot() {
                println!("  {}  (first message at {} ms)", chat, timestamp_ms);
            }
        }
    }

    Ok(())
}

/// Load the config file, generating a commented default on first run
fn load_or_create(
    config_path: &Path,
    store_hint: &Path,
) -> Result<TetherConfig, Box<dyn std::error::Error>> {
    if config_path.exists() {
        TetherConfig::load(config_path)
    } else {
        println!();
        println!("No config file found. Creating default configuration...");
        TetherConfig::create_default(config_path, store_hint)?;
        println!("   Created: {}", config_path.display());
        TetherConfig::load(config_path)
    }
}

fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    // Repeated calls (tests) keep the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
