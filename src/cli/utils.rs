use serde::Serialize;

use crate::cli::OutputFormat;
use crate::navigation::{PageOrderEntry, PageTreeNode};

/// Print a value as pretty JSON
pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a navigation tree in the appropriate format
pub fn output_tree(output_format: OutputFormat, tree: &[PageTreeNode]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(&tree),
        OutputFormat::Text => {
            if tree.is_empty() {
                println!("(no pages)");
            } else {
                print!("{}", render_tree(tree));
            }
            Ok(())
        }
    }
}

/// Output a flat page order in the appropriate format
pub fn output_entries(output_format: OutputFormat, entries: &[PageOrderEntry]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(&entries),
        OutputFormat::Text => {
            for entry in entries {
                match entry.parent_page_id {
                    Some(parent) => println!("{}  {} (under {})", entry.display_order, entry.page_id, parent),
                    None => println!("{}  {}", entry.display_order, entry.page_id),
                }
            }
            Ok(())
        }
    }
}

/// Indented text rendering, one line per page
pub fn render_tree(tree: &[PageTreeNode]) -> String {
    let mut out = String::new();
    render_level(tree, 0, &mut out);
    out
}

fn render_level(nodes: &[PageTreeNode], depth: usize, out: &mut String) {
    for node in nodes {
        let marker = if node.page.is_external { " ↗" } else { "" };
        out.push_str(&format!(
            "{}{}. {} {}{}  [{}]\n",
            "  ".repeat(depth),
            node.display_order,
            node.page.name,
            node.page.url,
            marker,
            node.page.id
        ));
        render_level(&node.children, depth + 1, out);
    }
}
