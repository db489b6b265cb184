use anyhow::Result;
use clap::{Parser, Subcommand};
use recallkey::Config;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "recallkey",
    about = "Chat relay service that distills conversations into portable context reports"
)]
struct Cli {
    /// Path to a TOML config file. Defaults plus environment overrides are
    /// used when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway.
    Serve {
        /// Bind host; overrides the config value.
        #[arg(long)]
        host: Option<String>,
        /// Bind port; overrides the config value.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let (host, port) = (config.gateway.host.clone(), config.gateway.port);
            recallkey::gateway::run_gateway(&host, port, config).await
        }
    }
}
