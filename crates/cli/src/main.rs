//! switchboard: run the call dispatcher locally, as a server, or as a client

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;

use switchboard_call_engine::logging::{self, LoggingConfig};
use switchboard_call_engine::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Call center dispatcher", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "SWITCHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive prompt driving an in-process dispatcher
    Local {
        /// Number of operators available
        #[arg(short = 'n', long)]
        num_operators: Option<usize>,
    },
    /// Serve the dispatcher over TCP until Ctrl-C
    Serve {
        /// Number of operators available
        #[arg(short = 'n', long)]
        num_operators: Option<usize>,

        /// Address to listen on
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Interactive prompt forwarding commands to a server
    Connect {
        /// Server address
        #[arg(short, long)]
        server: Option<SocketAddr>,
    },
}

impl Cli {
    /// Config file values with command-line overrides applied
    fn resolve_config(&self) -> Result<CallCenterConfig> {
        let mut config = match &self.config {
            Some(path) => CallCenterConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CallCenterConfig::default(),
        };

        match &self.command {
            Commands::Local { num_operators } => {
                if let Some(n) = num_operators {
                    config.dispatcher.num_operators = *n;
                }
            }
            Commands::Serve { num_operators, bind } => {
                if let Some(n) = num_operators {
                    config.dispatcher.num_operators = *n;
                }
                if let Some(addr) = bind {
                    config.server.bind_addr = *addr;
                }
            }
            Commands::Connect { server } => {
                if let Some(addr) = server {
                    config.server.connect_addr = *addr;
                }
            }
        }

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        } else if self.config.is_none() && !matches!(self.command, Commands::Serve { .. }) {
            // keep interactive sessions quiet unless asked otherwise
            config.logging.level = "warn".to_string();
        }
        if self.json_logs {
            config.logging.json = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    logging::setup_logging(LoggingConfig::from_section(&config.logging)?)?;

    match cli.command {
        Commands::Local { .. } => run_local(&config).await,
        Commands::Serve { .. } => run_server(&config).await,
        Commands::Connect { .. } => run_client(&config).await,
    }
}

async fn run_local(config: &CallCenterConfig) -> Result<()> {
    let mut dispatcher = Dispatcher::new(config.dispatcher.num_operators)?;
    let mut console = ConsoleNotifier::new(tokio::io::stdout());
    let stdin = BufReader::new(tokio::io::stdin());

    Prompt::new().run(stdin, &mut console, &mut dispatcher).await?;
    Ok(())
}

async fn run_server(config: &CallCenterConfig) -> Result<()> {
    let server = CallCenterServer::bind(config)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    info!("Listening on {}", server.local_addr()?);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn run_client(config: &CallCenterConfig) -> Result<()> {
    let addr = config.server.connect_addr;
    let client = CallCenterClient::connect(addr)
        .await
        .with_context(|| format!("connecting to {}", addr))?;
    let (mut requests, responses) = client.into_split();

    // responses and the prompt share one stdout writer
    let mut console = ConsoleNotifier::new(tokio::io::stdout());
    let mut printer_console = console.clone();
    let mut printer = tokio::spawn(async move { responses.forward_to(&mut printer_console).await });

    let stdin = BufReader::new(tokio::io::stdin());
    let prompt = Prompt::new();

    tokio::select! {
        result = prompt.run(stdin, &mut console, &mut requests) => {
            printer.abort();
            result?;
        }
        printed = &mut printer => {
            printed??;
            console.notify("Server closed the connection").await?;
        }
    }
    Ok(())
}
