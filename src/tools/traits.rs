//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::context::ToolContext;

/// A tool the model can invoke from its streamed output
#[async_trait]
pub trait Tool: Send + Sync {
    /// Canonical tool name
    fn name(&self) -> &'static str;

    /// Alternate names accepted at dispatch
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Human-readable description (surfaced in the system prompt)
    fn description(&self) -> &'static str;

    /// JSON Schema for the argument object
    fn input_schema(&self) -> Value;

    /// Execute the tool; all failures come back as failed results
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult;
}

/// A tool's prompt-facing description
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Result of a tool execution
///
/// `data` is the structured payload; `formatted` is the display-ready string
/// the UI renders and the orchestrator injects into the next model turn.
#[derive(Debug, Clone, Default)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<Value>,
    pub formatted: Option<String>,
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(data: Value, formatted: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            success: true,
            data: Some(data),
            formatted: Some(formatted.into()),
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>) -> Self {
        debug!("ToolResult::failure: called");
        Self {
            success: false,
            data: None,
            formatted: None,
            error: Some(error.into()),
        }
    }
}

impl From<super::ToolError> for ToolResult {
    fn from(err: super::ToolError) -> Self {
        ToolResult::failure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success(json!({"lines": 3}), "3 lines");

        assert!(result.success);
        assert_eq!(result.formatted.as_deref(), Some("3 lines"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_tool_result_failure() {
        let result = ToolResult::failure("File not found");

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("File not found"));
        assert!(result.data.is_none());
    }

    #[test]
    fn test_tool_result_from_error() {
        let result: ToolResult = super::super::ToolError::UnknownTool {
            name: "x".to_string(),
        }
        .into();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unknown tool"));
    }
}
