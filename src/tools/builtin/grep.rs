//! grep tool - workspace text search via the search collaborator

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};
use crate::workspace::SearchQuery;

/// Search for text in workspace files
pub struct GrepTool;

#[derive(Debug, Deserialize)]
struct GrepArgs {
    #[serde(alias = "pattern", alias = "search", alias = "text")]
    query: String,

    #[serde(default = "default_path", alias = "dir", alias = "directory")]
    path: String,

    #[serde(default, alias = "case-sensitive", alias = "caseSensitive")]
    case_sensitive: bool,

    #[serde(default, alias = "whole-word", alias = "wholeWord")]
    whole_word: bool,

    #[serde(default, alias = "is-regex", alias = "isRegex")]
    regex: bool,

    #[serde(default, alias = "include", alias = "includePattern")]
    include_pattern: Option<String>,

    #[serde(default, alias = "exclude", alias = "excludePattern")]
    exclude_pattern: Option<String>,

    #[serde(default, alias = "maxResults", alias = "max-results")]
    max_results: Option<usize>,
}

fn default_path() -> String {
    ".".to_string()
}

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["search", "grep_search"]
    }

    fn description(&self) -> &'static str {
        "Search for text in workspace files. Returns matching lines grouped by file."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text or regex to search for"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in (default: workspace root)"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Match case exactly (default: false)"
                },
                "whole_word": {
                    "type": "boolean",
                    "description": "Match whole words only (default: false)"
                },
                "regex": {
                    "type": "boolean",
                    "description": "Treat query as a regex (default: false)"
                },
                "include_pattern": {
                    "type": "string",
                    "description": "Glob filter on file names, e.g. '*.rs'"
                },
                "exclude_pattern": {
                    "type": "string",
                    "description": "Glob of file names to skip"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Global match cap (default: 50)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?args, "GrepTool::execute: called");
        let args: GrepArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolResult::failure(format!("Invalid arguments for grep: {e}")),
        };

        let root = match ctx.sanitize(&args.path) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        let query = SearchQuery {
            query: args.query.clone(),
            case_sensitive: args.case_sensitive,
            whole_word: args.whole_word,
            regex: args.regex,
            include_pattern: args.include_pattern.clone(),
            exclude_pattern: args.exclude_pattern.clone(),
        };

        let found = match ctx.search.search(&root, &query).await {
            Ok(r) => r,
            Err(e) => return ToolResult::failure(e.to_string()),
        };

        // Enforce the global cap, trimming per-file match lists as it nears
        let cap = args.max_results.unwrap_or(ctx.defaults.grep_max_results);
        let mut total = 0usize;
        let mut truncated = false;
        let mut kept = Vec::new();
        for mut file_result in found {
            if total >= cap {
                truncated = true;
                break;
            }
            let remaining = cap - total;
            if file_result.matches.len() > remaining {
                file_result.matches.truncate(remaining);
                truncated = true;
            }
            total += file_result.matches.len();
            kept.push(file_result);
        }

        debug!(%total, %truncated, "GrepTool::execute: search complete");

        let results: Vec<Value> = kept
            .iter()
            .map(|fr| {
                json!({
                    "file": {
                        "name": fr.file.name,
                        "path": ctx.relative(&fr.file.path),
                    },
                    "matches": fr
                        .matches
                        .iter()
                        .map(|m| {
                            json!({
                                "line": m.line,
                                "char_start": m.char_start,
                                "char_end": m.char_end,
                                "line_text": m.line_text,
                            })
                        })
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        let data = json!({
            "query": args.query,
            "results": results,
            "total_matches": total,
            "truncated": truncated,
        });

        let compact = serde_json::to_string(&data).unwrap_or_else(|_| "{}".to_string());
        let formatted = format!("```search-results\n{compact}\n```");

        ToolResult::success(data, formatted)
    }
}
