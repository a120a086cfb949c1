//! agent-runtime - agentic tool-calling core for the editor's AI assistant
//!
//! This crate is the runtime that lets a conversational model inspect the
//! user's workspace while it streams an answer. The model embeds tool
//! invocations in its output text; the runtime detects them, executes them
//! inside a path sandbox with rate limiting and deduplication, and feeds the
//! results back into a bounded multi-turn loop.
//!
//! # Core Concepts
//!
//! - **Calls live in text**: tool invocations are parsed out of the streamed
//!   response, not delivered out-of-band
//! - **One gateway per conversation**: dedup and rate-limiter state is owned
//!   by the conversation, never shared process-wide
//! - **Failures are results**: a tool failure becomes a failed `ToolResult`,
//!   it never aborts the surrounding loop
//! - **Bounded autonomy**: the agent loop stops after a configured number of
//!   tool-producing iterations
//!
//! # Modules
//!
//! - [`parser`] - detects tool-call syntax in free-form text
//! - [`tools`] - sandboxed executor and the builtin tool catalog
//! - [`gateway`] - per-conversation buffering, dedup and rate limiting
//! - [`orchestrator`] - the bounded agent loop over a provider adapter
//! - [`llm`] - provider adapter contract and message types
//! - [`workspace`] - filesystem/search collaborator contracts
//! - [`config`] - configuration types and loading

pub mod config;
pub mod gateway;
pub mod llm;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod tools;
pub mod workspace;

// Re-export commonly used types
pub use config::{AgentConfig, RateLimitConfig, SandboxConfig, ToolDefaults};
pub use gateway::{ChunkOutcome, CompletedCall, RateLimitError, RateLimiter, ToolEvent, ToolGateway};
pub use llm::{CancelSignal, ChatMessage, ProviderClient, ProviderError, Role};
pub use orchestrator::{ChatMode, Orchestrator, SendOutcome};
pub use parser::{StreamFilter, ToolCall, has_tool_calls, parse_tool_calls, strip_tool_calls};
pub use tools::{Tool, ToolContext, ToolError, ToolExecutor, ToolResult, ToolSpec};
pub use workspace::{FileEntry, FileSystem, LocalFs, LocalSearch, SearchBackend, SearchQuery};
