use clap::Subcommand;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::client::ApiClient;
use crate::cli::utils::output_tree;
use crate::cli::OutputFormat;
use crate::navigation::PageTreeNode;

#[derive(Subcommand)]
pub enum NavCommands {
    #[command(about = "Show the rendered navigation tree of a role")]
    Role {
        #[arg(help = "Role ID")]
        role: Uuid,
    },

    #[command(about = "Show the merged navigation tree of a user")]
    User {
        #[arg(help = "User ID")]
        user: Uuid,
    },

    #[command(about = "Show the navigation tree of the NAVCTL_TOKEN user")]
    Me,

    #[command(about = "Mint a development bearer token with the local JWT_SECRET")]
    Token {
        #[arg(help = "User ID")]
        user: Uuid,
        #[arg(long, default_value = "navctl", help = "Display name carried in the token")]
        name: String,
    },
}

pub async fn handle(cmd: NavCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let tree: Vec<PageTreeNode> = match cmd {
        NavCommands::Role { role } => client.get(&format!("/api/roles/{}/tree", role)).await?,
        NavCommands::User { user } => client.get(&format!("/api/users/{}/navigation", user)).await?,
        NavCommands::Me => client.get("/api/navigation").await?,
        NavCommands::Token { user, name } => {
            let token = generate_jwt(&Claims::new(user, name))?;
            println!("{}", token);
            return Ok(());
        }
    };

    output_tree(output_format, &tree)
}
