use anyhow::bail;
use clap::{Parser, Subcommand};
use postrelay_core::{
    validate_cursor_key, AppConfig, Clock, CoreError, ErrorExt, FixedClock, SequenceId,
    SystemClock,
};
use relay_service::RelayService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use webhook_notifier::DiscordWebhook;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Relays new posts from watched accounts to webhooks, each post exactly once.
#[derive(Parser)]
#[command(name = "postrelay", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "POSTRELAY_CONFIG", default_value = "postrelay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every account once and exit.
    Run,

    /// Check every account on the polling interval until Ctrl-C.
    Watch,

    /// Inspect or repair a stored cursor.
    Cursor {
        #[command(subcommand)]
        action: CursorCommand,
    },
}

#[derive(Subcommand)]
enum CursorCommand {
    /// Print the last relayed id for a cursor key.
    Get { key: String },

    /// Overwrite the last relayed id for a cursor key.
    Set { key: String, id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("postrelay=info,relay_service=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            let e = CoreError::from(e);
            e.log_error();
            let message = e.user_friendly_message();
            return Err(anyhow::Error::new(e)
                .context(format!("loading {}", cli.config.display()))
                .context(message));
        }
    };

    match cli.command {
        Command::Run => run(&config, false).await,
        Command::Watch => run(&config, true).await,
        Command::Cursor { action } => cursor(&config, action).await,
    }
}

async fn run(config: &AppConfig, watch: bool) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = match config.overrides.now {
        Some(now) => {
            tracing::warn!(%now, "Clock pinned by configuration");
            Arc::new(FixedClock(now))
        }
        None => Arc::new(SystemClock),
    };
    if let Some(permalink) = &config.overrides.single_post_url {
        tracing::warn!(permalink = %permalink, "Single post override active");
    }

    let source = post_source::from_config(&config.source).await?;
    let store = cursor_store::from_config(&config.store).await?;
    let notifier = Arc::new(DiscordWebhook::new(DELIVERY_TIMEOUT)?);
    let service = RelayService::new(config, source, store, notifier, clock);

    if watch {
        service.watch().await;
        return Ok(());
    }

    let report = service.run_once().await;
    for (account, outcome) in &report.outcomes {
        tracing::info!(account = %account, outcome = %outcome, "Account finished");
    }
    if let Some(reason) = report.aborted {
        bail!("run aborted: {}", reason);
    }
    tracing::info!("All accounts finished");
    Ok(())
}

async fn cursor(config: &AppConfig, action: CursorCommand) -> anyhow::Result<()> {
    let store = cursor_store::from_config(&config.store).await?;
    match action {
        CursorCommand::Get { key } => {
            validate_cursor_key(&key)?;
            match store.load(&key).await? {
                Some(id) => println!("{}", id),
                None => println!("(none)"),
            }
        }
        CursorCommand::Set { key, id } => {
            validate_cursor_key(&key)?;
            let Some(id) = SequenceId::parse(&id) else {
                bail!("not a post id: {}", id);
            };
            store.save(&key, &id).await?;
            println!("{} = {}", key, id);
        }
    }
    Ok(())
}
