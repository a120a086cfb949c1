//! file_info tool - size and name of a file

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Report a file's size and name
pub struct FileInfoTool;

#[derive(Debug, Deserialize)]
struct FileInfoArgs {
    #[serde(alias = "file", alias = "file_path", alias = "filePath")]
    path: String,
}

/// Human-readable size in B/KB/MB/GB
fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.1} GB", b / GB)
    }
}

#[async_trait]
impl Tool for FileInfoTool {
    fn name(&self) -> &'static str {
        "file_info"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["stat"]
    }

    fn description(&self) -> &'static str {
        "Get a file's size and name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?args, "FileInfoTool::execute: called");
        let args: FileInfoArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolResult::failure(format!("Invalid arguments for file_info: {e}")),
        };

        let full_path = match ctx.sanitize(&args.path) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        let size = match ctx.fs.file_size(&full_path).await {
            Ok(s) => s,
            Err(e) => return ToolResult::failure(format!("Failed to stat file: {e}")),
        };

        let name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let rel = ctx.relative(&full_path);
        let human = human_size(size);
        debug!(%rel, %size, "FileInfoTool::execute: stat complete");

        let data = json!({
            "name": name,
            "path": rel,
            "size_bytes": size,
            "size": human,
        });

        let formatted = format!("{name} ({human}) at {rel}");

        ToolResult::success(data, formatted)
    }
}
