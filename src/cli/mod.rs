pub mod client;
pub mod commands;
pub mod utils;

use std::io::IsTerminal;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "navctl")]
#[command(about = "navctl - manage role page hierarchies on a navdesk-api server")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, conflicts_with = "text", help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "NAVCTL_URL",
        default_value = "http://localhost:3000",
        help = "Server base URL"
    )]
    pub url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show and edit the page order of a role")]
    Order {
        #[command(subcommand)]
        cmd: commands::order::OrderCommands,
    },

    #[command(about = "Navigation trees and tokens")]
    Nav {
        #[command(subcommand)]
        cmd: commands::nav::NavCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Explicit flags win; otherwise text on a terminal and JSON when piped
    pub fn from_cli(cli: &Cli) -> Self {
        Self::resolve(cli.text, cli.json, std::io::stdout().is_terminal())
    }

    fn resolve(text: bool, json: bool, terminal: bool) -> Self {
        match (text, json) {
            (true, _) => OutputFormat::Text,
            (_, true) => OutputFormat::Json,
            _ if terminal => OutputFormat::Text,
            _ => OutputFormat::Json,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = client::ApiClient::new(&cli.url)?;

    match cli.command {
        Commands::Order { cmd } => commands::order::handle(cmd, &client, output_format).await,
        Commands::Nav { cmd } => commands::nav::handle(cmd, &client, output_format).await,
    }
}
