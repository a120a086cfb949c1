//! Embedded prompt templates
//!
//! Rendered with plain `{placeholder}` replacement; nothing here needs a
//! real template engine.

use crate::tools::ToolSpec;

/// System prompt for agent mode (tool calling enabled)
pub const AGENT_SYSTEM: &str = "\
You are a coding assistant working inside the user's workspace `{workspace}`.

You can inspect the workspace by emitting tool calls directly in your reply.
Two forms are recognized:

1. A JSON object: {\"tool\": \"<name>\", \"args\": {...}}
2. Shorthand: [[GREP:query]], [[FIND:pattern]], [[LIST_DIR:path]], [[READ:path]]

Available tools:
{tools}

Rules:
- Call a tool only when you need information you do not already have.
- Paths are relative to the workspace root; you cannot read outside it.
- After results are provided, answer the user directly instead of calling
  more tools, unless something is still missing.";

/// System prompt for responder mode (single turn, no tools)
pub const RESPONDER_SYSTEM: &str = "\
You are a coding assistant working inside the user's workspace `{workspace}`.
Answer from the conversation alone; you have no tools in this mode.";

/// Build the system prompt for a mode
pub fn system_prompt(template: &str, workspace_name: &str, tools: &[ToolSpec]) -> String {
    let tool_lines = tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    template
        .replace("{workspace}", workspace_name)
        .replace("{tools}", &tool_lines)
}
