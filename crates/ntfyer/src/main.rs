// # ntfyer - settings manager and notification sender
//
// This binary is a thin integration layer: it reads configuration from the
// environment, sets up logging, bootstraps the settings store and runs
// exactly one command against it. All settings logic lives in ntfyer-core.
//
// ## Commands
//
// ```bash
// ntfyer config url https://ntfy.example.com
// ntfyer config topic deploys
// ntfyer config fmt md
// ntfyer config get
// ntfyer config defaults
// ntfyer config show
// ntfyer config history [PROPERTY]
// ntfyer send "v1.2.3 is live"
// ```
//
// ## Configuration
//
// - `NTFYER_ENVIRON`: `dev` (default) logs storage operations, anything else is quiet
// - `NTFYER_STORE_PATH`: settings store location (default: `settings.db` next to the binary;
//   a `.json` path selects the JSON file store)
// - `NTFYER_LOG_LEVEL`: trace, debug, info, warn or error

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ntfyer_core::{AppConfig, Settings, bootstrap, keys};
use ntfyer_notifier_http::HttpNotifier;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit codes
#[derive(Debug, Clone, Copy)]
enum NtfyerExitCode {
    /// Command completed
    Success = 0,
    /// Any error, at any stage
    Failure = 1,
}

impl From<NtfyerExitCode> for ExitCode {
    fn from(code: NtfyerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Manage notifier settings and send notifications
#[derive(Parser, Debug)]
#[command(name = "ntfyer", version)]
#[command(about = "Send notifications to an ntfy endpoint built from stored settings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read or change the stored settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Send a notification to the configured endpoint
    Send {
        /// Notification text, sent verbatim as the request body
        text: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Set the notification server URL
    Url {
        /// Base URL, e.g. https://ntfy.sh
        url: String,
    },

    /// Set the notification topic
    Topic {
        /// Topic name
        topic: String,
    },

    /// Set the message format
    Fmt {
        /// Format name, e.g. md
        fmt: String,
    },

    /// Print the notifier URL
    Get,

    /// Reset all settings to their defaults
    Defaults,

    /// Print every stored setting
    Show,

    /// Print the change history
    History {
        /// Only show changes to this property
        property: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::from_env(default_store_dir());
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return NtfyerExitCode::Failure.into();
    }

    let filter = match EnvFilter::try_new(config.log_directives()) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Error: invalid log filter: {}", e);
            return NtfyerExitCode::Failure.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NtfyerExitCode::Failure.into();
    }

    debug!(
        "Configuration loaded: store={}, environ={:?}",
        config.store_path.display(),
        config.environ
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            return NtfyerExitCode::Failure.into();
        }
    };

    let result = rt.block_on(run(config, cli.command));

    match result {
        Ok(()) => NtfyerExitCode::Success.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            NtfyerExitCode::Failure.into()
        }
    }
}

/// Directory holding the executable, falling back to the working directory
fn default_store_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Bootstrap the store and run one command
async fn run(config: AppConfig, command: Command) -> Result<()> {
    let store_config = config.store_config();
    let boot = bootstrap(&store_config)
        .await
        .with_context(|| format!("failed to open settings store {}", config.store_path.display()))?;

    if boot.outcome.is_first_run() {
        info!(
            "Created {} settings store at {}",
            boot.settings.backend_name(),
            config.store_path.display()
        );
    }

    let mut settings = boot.settings;

    match command {
        Command::Config(cmd) => run_config(&mut settings, cmd).await,
        Command::Send { text } => {
            let notifier = HttpNotifier::default();
            settings.send_notification(&notifier, &text).await?;
            println!("Notification sent to {}", settings.require_notifier_url()?);
            Ok(())
        }
    }
}

async fn run_config(settings: &mut Settings, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Url { url } => {
            settings.write_config_value(keys::URL, &url).await?;
            println!("The new notifier URL is {}", display_url(settings));
        }
        ConfigCommand::Topic { topic } => {
            settings.write_config_value(keys::TOPIC, &topic).await?;
            println!("The new notifier URL is {}", display_url(settings));
        }
        ConfigCommand::Fmt { fmt } => {
            settings.write_config_value(keys::FMT, &fmt).await?;
            println!("Message format set to {}", fmt);
        }
        ConfigCommand::Get => {
            println!("The notifier URL is {}", settings.require_notifier_url()?);
        }
        ConfigCommand::Defaults => {
            settings.initialize_defaults().await?;
            println!("Settings set to default values");
            println!("Current notifier URL is {}", display_url(settings));
        }
        ConfigCommand::Show => {
            for property in settings.properties().await? {
                println!("{}={}", property.name, property.value);
            }
        }
        ConfigCommand::History { property } => {
            for entry in settings.history(property.as_deref()).await? {
                println!(
                    "{} {}={}",
                    entry.updated_at.to_rfc3339(),
                    entry.name,
                    entry.value
                );
            }
        }
    }
    Ok(())
}

fn display_url(settings: &Settings) -> &str {
    settings.notifier_url().unwrap_or("<unset>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_config_commands() {
        let cli = Cli::try_parse_from(["ntfyer", "config", "url", "https://ntfy.example.com"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Url { ref url }) if url == "https://ntfy.example.com"
        ));

        let cli = Cli::try_parse_from(["ntfyer", "config", "history"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::History { property: None })
        ));
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from(["ntfyer", "send", "hello world"]).unwrap();
        assert!(matches!(cli.command, Command::Send { ref text } if text == "hello world"));
    }

    #[test]
    fn test_cli_rejects_missing_argument() {
        assert!(Cli::try_parse_from(["ntfyer", "config", "topic"]).is_err());
        assert!(Cli::try_parse_from(["ntfyer", "send"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_directives_parse_as_filter() {
        for environ in ["dev", "prod"] {
            let config = AppConfig::from_lookup(
                |key| (key == "NTFYER_ENVIRON").then(|| environ.to_string()),
                ".",
            );
            assert!(EnvFilter::try_new(config.log_directives()).is_ok(), "{environ}");
        }
    }

    #[tokio::test]
    async fn test_run_persists_topic_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_lookup(|_| None, dir.path());

        run(config.clone(), Command::Config(ConfigCommand::Topic { topic: "ops".into() }))
            .await
            .unwrap();

        let boot = bootstrap(&config.store_config()).await.unwrap();
        assert_eq!(boot.settings.notifier_url(), Some("https://ntfy.sh/ops"));
    }
}
