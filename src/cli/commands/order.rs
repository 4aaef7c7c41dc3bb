use std::io::Read;

use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_entries, output_json, output_tree};
use crate::cli::OutputFormat;
use crate::navigation::{EditOperation, PageOrderEntry, PageTreeNode};

#[derive(Subcommand)]
pub enum OrderCommands {
    #[command(about = "Show the normalized page order of a role")]
    Show {
        #[arg(help = "Role ID")]
        role: Uuid,
    },

    #[command(about = "Assign a page to a role as the last root or last child")]
    Add {
        #[arg(help = "Role ID")]
        role: Uuid,
        #[arg(help = "Page ID")]
        page: Uuid,
        #[arg(long, help = "Parent page ID (defaults to root level)")]
        parent: Option<Uuid>,
    },

    #[command(about = "Remove a page and its submenu from a role")]
    Remove {
        #[arg(help = "Role ID")]
        role: Uuid,
        #[arg(help = "Page ID")]
        page: Uuid,
    },

    #[command(about = "Move a page one position up among its siblings")]
    Up {
        #[arg(help = "Role ID")]
        role: Uuid,
        #[arg(help = "Page ID")]
        page: Uuid,
    },

    #[command(about = "Move a page one position down among its siblings")]
    Down {
        #[arg(help = "Role ID")]
        role: Uuid,
        #[arg(help = "Page ID")]
        page: Uuid,
    },

    #[command(about = "Nest a page under another assigned page")]
    Parent {
        #[arg(help = "Role ID")]
        role: Uuid,
        #[arg(help = "Page ID")]
        page: Uuid,
        #[arg(help = "New parent page ID")]
        parent: Uuid,
    },

    #[command(about = "Promote a page to the main menu")]
    Root {
        #[arg(help = "Role ID")]
        role: Uuid,
        #[arg(help = "Page ID")]
        page: Uuid,
    },

    #[command(about = "Replace the whole page order from a JSON array on stdin")]
    Replace {
        #[arg(help = "Role ID")]
        role: Uuid,
    },
}

#[derive(Debug, Deserialize)]
struct EditResult {
    tree: Vec<PageTreeNode>,
}

pub async fn handle(cmd: OrderCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let (role, op) = match cmd {
        OrderCommands::Show { role } => {
            let entries: Vec<PageOrderEntry> = client.get(&pages_path(role)).await?;
            return output_entries(output_format, &entries);
        }
        OrderCommands::Replace { role } => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let entries: Vec<PageOrderEntry> = serde_json::from_str(&input)?;
            let saved: Vec<PageOrderEntry> = client.put(&pages_path(role), &entries).await?;
            return output_entries(output_format, &saved);
        }
        OrderCommands::Add { role, page, parent } => (
            role,
            EditOperation::Add {
                page_id: page,
                parent_page_id: parent,
            },
        ),
        OrderCommands::Remove { role, page } => (role, EditOperation::Remove { page_id: page }),
        OrderCommands::Up { role, page } => (role, EditOperation::MoveUp { page_id: page }),
        OrderCommands::Down { role, page } => (role, EditOperation::MoveDown { page_id: page }),
        OrderCommands::Parent { role, page, parent } => (
            role,
            EditOperation::SetParent {
                page_id: page,
                parent_page_id: Some(parent),
            },
        ),
        OrderCommands::Root { role, page } => (role, EditOperation::ToRoot { page_id: page }),
    };

    let body = json!({ "operations": [op] });
    let result: serde_json::Value = client.post(&format!("{}/edit", pages_path(role)), &body).await?;
    match output_format {
        OutputFormat::Json => output_json(&result),
        OutputFormat::Text => {
            let result: EditResult = serde_json::from_value(result)?;
            output_tree(output_format, &result.tree)
        }
    }
}

fn pages_path(role: Uuid) -> String {
    format!("/api/roles/{}/pages", role)
}
