use clap::{Parser, Subcommand};

pub mod config;
pub mod run;
pub mod status;
pub mod unlink;
pub mod version;

#[derive(Parser)]
#[command(name = "tether")]
#[command(author = "Tether Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Companion-device client for the Tether messaging network", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pair with your account (first run) or resume, then watch recent chats
    Run {
        /// Path to config file (default: adjacent to the device store)
        #[arg(long)]
        config: Option<String>,

        /// Path to the device store (optional, uses default if not specified)
        #[arg(long)]
        store_path: Option<String>,

        /// Gateway URL (overrides the configured value)
        #[arg(long)]
        gateway_url: Option<String>,
    },

    /// Show whether this client holds a device identity
    Status {
        /// Path to the device store (optional, uses default if not specified)
        #[arg(long)]
        store_path: Option<String>,
    },

    /// Remove the local device identity
    Unlink {
        /// Path to the device store (optional, uses default if not specified)
        #[arg(long)]
        store_path: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            config,
            store_path,
            gateway_url,
        } => run::execute(config, store_path, gateway_url).await,
        Commands::Status { store_path } => status::execute(store_path).await,
        Commands::Unlink { store_path, yes } => unlink::execute(store_path, yes).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["tether", "run"]);

        match cli.command {
            Commands::Run {
                config,
                store_path,
                gateway_url,
            } => {
                assert_eq!(config, None);
                assert_eq!(store_path, None);
                assert_eq!(gateway_url, None);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_all_options() {
        let cli = Cli::parse_from([
            "tether",
            "run",
            "--config",
            "/etc/tether/config.toml",
            "--store-path",
            "/tmp/device.db",
            "--gateway-url",
            "https://gw.example.net",
        ]);

        match cli.command {
            Commands::Run {
                config,
                store_path,
                gateway_url,
            } => {
                assert_eq!(config, Some("/etc/tether/config.toml".to_string()));
                assert_eq!(store_path, Some("/tmp/device.db".to_string()));
                assert_eq!(gateway_url, Some("https://gw.example.net".to_string()));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["tether", "status"]);

        match cli.command {
            Commands::Status { store_path } => assert_eq!(store_path, None),
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_parse_status_with_store_path() {
        let cli = Cli::parse_from(["tether", "status", "--store-path", "/tmp/device.db"]);

        match cli.command {
            Commands::Status { store_path } => {
                assert_eq!(store_path, Some("/tmp/device.db".to_string()));
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_parse_unlink() {
        let cli = Cli::parse_from(["tether", "unlink"]);

        match cli.command {
            Commands::Unlink { store_path, yes } => {
                assert_eq!(store_path, None);
                assert!(!yes);
            }
            _ => panic!("Expected Unlink command"),
        }
    }

    #[test]
    fn test_cli_parse_unlink_with_yes() {
        let cli = Cli::parse_from(["tether", "unlink", "--yes"]);

        match cli.command {
            Commands::Unlink { yes, .. } => assert!(yes),
            _ => panic!("Expected Unlink command"),
        }
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["tether", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }
}
