//! Tool error types

use thiserror::Error;

/// Errors that can occur during tool execution
///
/// These never escape the executor boundary as `Err` - they are converted
/// into failed [`ToolResult`](super::ToolResult)s.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing or invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Access denied: {path} is outside the workspace sandbox")]
    AccessDenied { path: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_message() {
        let err = ToolError::AccessDenied {
            path: "/etc/passwd".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("Access denied"));
        assert!(msg.contains("/etc/passwd"));
    }

    #[test]
    fn test_unknown_tool_message() {
        let err = ToolError::UnknownTool {
            name: "teleport".to_string(),
        };

        assert!(err.to_string().contains("teleport"));
    }
}
