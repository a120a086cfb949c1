//! ToolExecutor - catalog registry and dispatch

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::builtin::{FileInfoTool, FindByNameTool, GrepTool, ListDirTool, ReadFileTool};
use super::{Tool, ToolContext, ToolError, ToolResult, ToolSpec};

/// Dispatches tool calls to the catalog
///
/// Lookup is case-insensitive and alias-aware. Unknown names and handler
/// failures both come back as failed results, never errors.
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Lowercased alias (including the canonical name) -> canonical name
    aliases: HashMap<String, String>,
}

impl ToolExecutor {
    /// Create executor with the standard workspace-inspection catalog
    pub fn standard() -> Self {
        let mut executor = Self::empty();

        executor.add_tool(Arc::new(GrepTool));
        executor.add_tool(Arc::new(FindByNameTool));
        executor.add_tool(Arc::new(ListDirTool));
        executor.add_tool(Arc::new(ReadFileTool));
        executor.add_tool(Arc::new(FileInfoTool));

        executor
    }

    /// Create an empty executor (for testing)
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Add a tool to the catalog, registering its name and aliases
    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) {
        let canonical = tool.name().to_string();
        self.aliases.insert(canonical.to_lowercase(), canonical.clone());
        for alias in tool.aliases() {
            self.aliases.insert(alias.to_lowercase(), canonical.clone());
        }
        self.tools.insert(canonical, tool);
    }

    /// Resolve a (possibly aliased, any-case) name to its canonical form
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.aliases.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Check if a tool exists under any of its names
    pub fn has_tool(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Canonical tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Prompt-facing specs for the whole catalog
    pub fn definitions(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Execute a tool call
    pub async fn execute(&self, name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
        let canonical = match self.resolve(name) {
            Some(c) => c.to_string(),
            None => {
                debug!(%name, "ToolExecutor::execute: unknown tool");
                return ToolError::UnknownTool { name: name.to_string() }.into();
            }
        };

        debug!(%name, %canonical, "ToolExecutor::execute: dispatching");
        match self.tools.get(&canonical) {
            Some(tool) => tool.execute(args, ctx).await,
            None => ToolError::UnknownTool { name: name.to_string() }.into(),
        }
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::standard()
    }
}
