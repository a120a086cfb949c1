//! find_by_name tool - locate files by glob pattern

use std::collections::VecDeque;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Find files and directories whose name matches a glob pattern
pub struct FindByNameTool;

#[derive(Debug, Deserialize)]
struct FindArgs {
    #[serde(alias = "glob", alias = "name", alias = "query")]
    pattern: String,

    #[serde(default = "default_path", alias = "dir", alias = "directory")]
    path: String,

    #[serde(default, alias = "maxDepth", alias = "max-depth")]
    max_depth: Option<usize>,

    #[serde(default, rename = "type", alias = "kind", alias = "entry_type")]
    entry_type: Option<String>,

    #[serde(default, alias = "maxResults", alias = "max-results")]
    max_results: Option<usize>,
}

fn default_path() -> String {
    ".".to_string()
}

/// Convert a glob to an anchored regex: metachars escaped, `*` -> `.*`,
/// `?` -> `.`
fn glob_to_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if "\\.+()[]{}^$|".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    regex::Regex::new(&out)
}

#[async_trait]
impl Tool for FindByNameTool {
    fn name(&self) -> &'static str {
        "find_by_name"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["find"]
    }

    fn description(&self) -> &'static str {
        "Find files and directories by name using a glob pattern (e.g. '*.rs')."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern matched against entry names"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to start from (default: workspace root)"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum directory depth to walk (default: 10)"
                },
                "type": {
                    "type": "string",
                    "enum": ["file", "dir", "all"],
                    "description": "Entry kind filter (default: all)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Stop after this many matches (default: 100)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?args, "FindByNameTool::execute: called");
        let args: FindArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolResult::failure(format!("Invalid arguments for find_by_name: {e}")),
        };

        let root = match ctx.sanitize(&args.path) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        let matcher = match glob_to_regex(&args.pattern) {
            Ok(m) => m,
            Err(e) => return ToolResult::failure(format!("Invalid glob pattern: {e}")),
        };

        let entry_type = args.entry_type.as_deref().unwrap_or("all");
        if !matches!(entry_type, "file" | "dir" | "all") {
            return ToolResult::failure(format!("Invalid type filter: {entry_type} (expected file, dir or all)"));
        }

        let max_depth = args.max_depth.unwrap_or(ctx.defaults.find_max_depth).max(1);
        let cap = args.max_results.unwrap_or(ctx.defaults.find_max_results).max(1);

        let mut found = Vec::new();
        let mut truncated = false;
        // Breadth-first walk, alphabetical within each directory
        let mut queue: VecDeque<(std::path::PathBuf, usize)> = VecDeque::new();
        queue.push_back((root.clone(), 1));

        'walk: while let Some((dir, depth)) = queue.pop_front() {
            let mut entries = match ctx.fs.read_dir(&dir).await {
                Ok(e) => e,
                Err(e) => {
                    if dir == root {
                        return ToolResult::failure(format!("Failed to read directory: {e}"));
                    }
                    debug!(dir = %dir.display(), %e, "FindByNameTool::execute: skipping unreadable directory");
                    continue;
                }
            };
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            for entry in entries {
                let kind_matches = match entry_type {
                    "file" => !entry.is_dir,
                    "dir" => entry.is_dir,
                    _ => true,
                };
                if kind_matches && matcher.is_match(&entry.name) {
                    if found.len() >= cap {
                        truncated = true;
                        break 'walk;
                    }
                    found.push(json!({
                        "name": entry.name,
                        "path": ctx.relative(&entry.path),
                        "type": if entry.is_dir { "dir" } else { "file" },
                    }));
                }
                if entry.is_dir && depth < max_depth {
                    queue.push_back((entry.path, depth + 1));
                }
            }
        }

        debug!(matches = %found.len(), %truncated, "FindByNameTool::execute: walk complete");

        let formatted = if found.is_empty() {
            format!("No entries matching `{}`", args.pattern)
        } else {
            let mut lines = vec![format!("{} match(es) for `{}`:", found.len(), args.pattern)];
            for entry in &found {
                let suffix = if entry["type"] == "dir" { "/" } else { "" };
                lines.push(format!("{}{}", entry["path"].as_str().unwrap_or(""), suffix));
            }
            if truncated {
                lines.push(format!("... (stopped at {cap} matches)"));
            }
            lines.join("\n")
        };

        let data = json!({
            "pattern": args.pattern,
            "results": found,
            "truncated": truncated,
        });

        ToolResult::success(data, formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_glob_escapes_dot_literally() {
        // "*.ts" must match app.ts but not app.tsx
        let re = glob_to_regex("*.ts").unwrap();

        assert!(re.is_match("app.ts"));
        assert!(!re.is_match("app.tsx"));
        assert!(!re.is_match("appxts"));
    }

    #[test]
    fn test_glob_question_mark_single_char() {
        let re = glob_to_regex("a?.rs").unwrap();

        assert!(re.is_match("ab.rs"));
        assert!(!re.is_match("abc.rs"));
    }

    #[tokio::test]
    async fn test_find_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("app.ts"), "").unwrap();
        fs::write(temp.path().join("app.tsx"), "").unwrap();
        fs::write(temp.path().join("readme.md"), "").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = FindByNameTool;

        let result = tool.execute(json!({"pattern": "*.ts"}), &ctx).await;

        assert!(result.success);
        let data = result.data.unwrap();
        let results = data["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["name"], "app.ts");
    }

    #[tokio::test]
    async fn test_find_recurses_into_subdirectories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        fs::write(temp.path().join("src/nested/deep.rs"), "").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = FindByNameTool;

        let result = tool.execute(json!({"pattern": "*.rs"}), &ctx).await;

        let data = result.data.unwrap();
        assert_eq!(data["results"][0]["path"], "src/nested/deep.rs");
    }

    #[tokio::test]
    async fn test_find_respects_max_depth() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("top.rs"), "").unwrap();
        fs::write(temp.path().join("a/b/deep.rs"), "").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = FindByNameTool;

        let result = tool.execute(json!({"pattern": "*.rs", "max_depth": 1}), &ctx).await;

        let data = result.data.unwrap();
        let results = data["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["name"], "top.rs");
    }

    #[tokio::test]
    async fn test_find_type_filter() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("build")).unwrap();
        fs::write(temp.path().join("build.rs"), "").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = FindByNameTool;

        let result = tool.execute(json!({"pattern": "build*", "type": "dir"}), &ctx).await;

        let data = result.data.unwrap();
        let results = data["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["type"], "dir");
    }

    #[tokio::test]
    async fn test_find_stops_at_max_results() {
        let temp = tempdir().unwrap();
        for i in 0..5 {
            fs::write(temp.path().join(format!("f{i}.rs")), "").unwrap();
        }

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = FindByNameTool;

        let result = tool.execute(json!({"pattern": "*.rs", "max_results": 3}), &ctx).await;

        let data = result.data.unwrap();
        assert_eq!(data["results"].as_array().unwrap().len(), 3);
        assert_eq!(data["truncated"], true);
    }

    #[tokio::test]
    async fn test_find_missing_pattern() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        let tool = FindByNameTool;

        let result = tool.execute(json!({}), &ctx).await;

        assert!(!result.success);
    }
}
