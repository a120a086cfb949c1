//! read_file tool - read file contents

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Read a file's contents
pub struct ReadFileTool;

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    #[serde(alias = "file", alias = "file_path", alias = "filePath", alias = "filename")]
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["read"]
    }

    fn description(&self) -> &'static str {
        "Read a file's full contents."
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
        debug!(?args, "ReadFileTool::execute: called");
        let args: ReadFileArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolResult::failure(format!("Invalid arguments for read_file: {e}")),
        };

        let full_path = match ctx.sanitize(&args.path) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        let content = match ctx.fs.read_to_string(&full_path).await {
            Ok(c) => c,
            Err(e) => return ToolResult::failure(format!("Failed to read file: {e}")),
        };

        let line_count = content.lines().count();
        let rel = ctx.relative(&full_path);
        debug!(%rel, %line_count, "ReadFileTool::execute: file read");

        // The relative path is shown, never the absolute one; the next model
        // turn receives this block verbatim
        let formatted = format!("{} ({} lines)\n```\n{}\n```", rel, line_count, content.trim_end());

        let data = json!({
            "path": rel,
            "lines": line_count,
            "content": content,
        });

        ToolResult::success(data, formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2\nline 3").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = ReadFileTool;

        let result = tool.execute(json!({"path": "test.txt"}), &ctx).await;

        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["lines"], 3);
        assert_eq!(data["path"], "test.txt");
        assert!(data["content"].as_str().unwrap().contains("line 2"));
    }

    #[tokio::test]
    async fn test_read_file_formatted_is_fenced_with_relative_path() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/lib.rs"), "pub fn f() {}").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = ReadFileTool;

        let result = tool.execute(json!({"path": "src/lib.rs"}), &ctx).await;

        let formatted = result.formatted.unwrap();
        assert!(formatted.starts_with("src/lib.rs (1 lines)"));
        assert!(formatted.contains("```\npub fn f() {}\n```"));
        assert!(!formatted.contains(&*temp.path().to_string_lossy()));
    }

    #[tokio::test]
    async fn test_read_file_not_found() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = ReadFileTool;

        let result = tool.execute(json!({"path": "nope.txt"}), &ctx).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_read_file_sandbox_denial() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = ReadFileTool;

        let result = tool.execute(json!({"path": "../../etc/passwd"}), &ctx).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Access denied"));
    }

    #[tokio::test]
    async fn test_read_file_alias_keys_accepted() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = ReadFileTool;

        let result = tool.execute(json!({"file_path": "a.txt"}), &ctx).await;

        assert!(result.success);
    }
}
