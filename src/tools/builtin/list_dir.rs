//! list_dir tool - list directory contents

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};
use crate::workspace::FileEntry;

/// List files and directories, optionally descending recursively
pub struct ListDirTool;

#[derive(Debug, Deserialize)]
struct ListDirArgs {
    #[serde(default = "default_path", alias = "dir", alias = "directory")]
    path: String,

    #[serde(default)]
    recursive: bool,

    #[serde(default, alias = "maxDepth", alias = "max-depth")]
    max_depth: Option<usize>,

    #[serde(default, alias = "showHidden", alias = "show-hidden", alias = "include_hidden")]
    show_hidden: bool,
}

fn default_path() -> String {
    ".".to_string()
}

struct ListOpts {
    recursive: bool,
    max_depth: usize,
    show_hidden: bool,
}

struct ListedEntry {
    entry: FileEntry,
    depth: usize,
}

/// Depth-first collection so children render directly under their parent.
/// Directories sort before files, then alphabetically.
fn collect_entries<'a>(
    ctx: &'a ToolContext,
    dir: &'a Path,
    depth: usize,
    opts: &'a ListOpts,
    out: &'a mut Vec<ListedEntry>,
) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = ctx.fs.read_dir(dir).await?;

        if !opts.show_hidden {
            entries.retain(|e| !e.name.starts_with('.'));
        }
        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        for entry in entries {
            let is_dir = entry.is_dir;
            let child: PathBuf = entry.path.clone();
            out.push(ListedEntry { entry, depth });
            if opts.recursive && is_dir && depth + 1 < opts.max_depth {
                if let Err(e) = collect_entries(ctx, &child, depth + 1, opts, out).await {
                    // Unreadable subdirectory - keep the listing going
                    debug!(dir = %child.display(), %e, "collect_entries: skipping subdirectory");
                }
            }
        }

        Ok(())
    })
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &'static str {
        "list_dir"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["ls"]
    }

    fn description(&self) -> &'static str {
        "List files and directories in a path, optionally recursively."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path (default: workspace root)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Descend into subdirectories (default: false)"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Depth cap for recursive listing (default: 3)"
                },
                "show_hidden": {
                    "type": "boolean",
                    "description": "Include dotfiles (default: false)"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?args, "ListDirTool::execute: called");
        let args: ListDirArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolResult::failure(format!("Invalid arguments for list_dir: {e}")),
        };

        let root = match ctx.sanitize(&args.path) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        let opts = ListOpts {
            recursive: args.recursive,
            max_depth: args.max_depth.unwrap_or(ctx.defaults.list_max_depth).max(1),
            show_hidden: args.show_hidden,
        };

        let mut listed = Vec::new();
        if let Err(e) = collect_entries(ctx, &root, 0, &opts, &mut listed).await {
            return ToolResult::failure(format!("Failed to read directory: {e}"));
        }

        debug!(entries = %listed.len(), "ListDirTool::execute: listing complete");

        let entries: Vec<Value> = listed
            .iter()
            .map(|le| {
                json!({
                    "name": le.entry.name,
                    "path": ctx.relative(&le.entry.path),
                    "type": if le.entry.is_dir { "dir" } else { "file" },
                    "depth": le.depth,
                })
            })
            .collect();

        let mut lines = vec![format!("{}:", ctx.display(&root))];
        if listed.is_empty() {
            lines.push("(empty directory)".to_string());
        }
        for le in &listed {
            let suffix = if le.entry.is_dir { "/" } else { "" };
            lines.push(format!("{}{}{}", "  ".repeat(le.depth + 1), le.entry.name, suffix));
        }

        let data = json!({
            "path": ctx.relative(&root),
            "entries": entries,
            "count": listed.len(),
        });

        ToolResult::success(data, lines.join("\n"))
    }
}
