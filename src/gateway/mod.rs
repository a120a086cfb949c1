//! Tool execution gateway
//!
//! Sits between the streamed model output and the executor. Owns the
//! per-conversation pending buffer, the executed-call dedup set and the
//! rate limiter. Re-parsing the whole buffer on every chunk keeps
//! [`ToolGateway::process_chunk`] idempotent: a call found again on a later
//! re-scan is recognized by its `(tool, args, offset)` key and skipped.

mod rate_limit;

pub use rate_limit::{RateLimitError, RateLimiter};

use std::collections::HashSet;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::parser::{ToolCall, parse_tool_calls};
use crate::tools::{ToolContext, ToolExecutor, ToolResult};

/// Start/finish notifications for listeners (UI, logging)
#[derive(Debug, Clone)]
pub enum ToolEvent {
    Started { tool: String, args: Value },
    Finished { tool: String, result: ToolResult },
}

/// A call that went through the gateway this chunk, with its outcome
#[derive(Debug, Clone)]
pub struct CompletedCall {
    pub call: ToolCall,
    pub result: ToolResult,
}

/// Result of feeding one chunk through the gateway
#[derive(Debug)]
pub struct ChunkOutcome {
    /// Full buffer text after the append
    pub text: String,
    /// Results newly produced by this chunk
    pub results: Vec<CompletedCall>,
}

/// Render the stream marker for a finished call
pub fn result_marker(tool: &str, result: &ToolResult) -> String {
    if result.success {
        format!("[[TOOL_RESULT:{}:{}]]", tool, result.formatted.as_deref().unwrap_or(""))
    } else {
        format!("[[TOOL_ERROR:{}:{}]]", tool, result.error.as_deref().unwrap_or("unknown error"))
    }
}

/// Per-conversation tool execution gateway
pub struct ToolGateway {
    executor: ToolExecutor,
    ctx: ToolContext,
    limiter: RateLimiter,
    pending: String,
    executed: HashSet<String>,
    events: Option<mpsc::Sender<ToolEvent>>,
}

impl ToolGateway {
    /// Create a gateway with the standard tool catalog
    pub fn new(ctx: ToolContext, limits: RateLimitConfig) -> Self {
        Self::with_executor(ToolExecutor::standard(), ctx, limits)
    }

    /// Create a gateway with a custom executor (mainly for tests)
    pub fn with_executor(executor: ToolExecutor, ctx: ToolContext, limits: RateLimitConfig) -> Self {
        debug!(workspace = %ctx.workspace.display(), "ToolGateway::with_executor: called");
        Self {
            executor,
            ctx,
            limiter: RateLimiter::new(limits),
            pending: String::new(),
            executed: HashSet::new(),
            events: None,
        }
    }

    /// Attach a start/finish notification sink
    pub fn set_event_sink(&mut self, tx: mpsc::Sender<ToolEvent>) {
        self.events = Some(tx);
    }

    /// Prompt-facing specs of the underlying catalog
    pub fn tool_specs(&self) -> Vec<crate::tools::ToolSpec> {
        self.executor.definitions()
    }

    /// Current pending buffer for this model turn
    pub fn buffer(&self) -> &str {
        &self.pending
    }

    /// Clear the pending buffer for a new model turn
    ///
    /// The dedup set and rate limiter survive: both are scoped to the
    /// conversation, not the turn.
    pub fn begin_turn(&mut self) {
        debug!("ToolGateway::begin_turn: called");
        self.pending.clear();
    }

    /// Clear everything for a new conversation
    pub fn reset(&mut self) {
        debug!("ToolGateway::reset: called");
        self.pending.clear();
        self.executed.clear();
        self.limiter.reset();
    }

    /// Append a streamed chunk and execute any newly completed calls
    ///
    /// Safe to call on every delta: the whole buffer is re-parsed each time
    /// and already-executed calls are skipped by dedup key.
    pub async fn process_chunk(&mut self, chunk: &str) -> ChunkOutcome {
        self.pending.push_str(chunk);
        let calls = parse_tool_calls(&self.pending);
        debug!(chunk_len = chunk.len(), calls = calls.len(), "ToolGateway::process_chunk: parsed buffer");

        let mut results = Vec::new();
        for call in calls {
            if self.executed.contains(&call.dedup_key()) {
                continue;
            }
            let result = self.permit_and_execute(&call).await;
            results.push(CompletedCall { call, result });
        }

        ChunkOutcome {
            text: self.pending.clone(),
            results,
        }
    }

    /// Single-shot variant for a complete, non-streamed response
    ///
    /// Executes all calls sequentially and returns the text with each call's
    /// span replaced inline by its result marker.
    pub async fn process_response(&mut self, text: &str) -> String {
        let calls = parse_tool_calls(text);
        debug!(calls = calls.len(), "ToolGateway::process_response: parsed response");

        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        for call in calls {
            out.push_str(&text[pos..call.start_index]);
            pos = call.end_index();

            if self.executed.contains(&call.dedup_key()) {
                continue;
            }
            let result = self.permit_and_execute(&call).await;
            out.push_str(&result_marker(&call.tool, &result));
        }
        out.push_str(&text[pos..]);
        out
    }

    /// Direct single-call entry point (manual/UI-triggered)
    ///
    /// Still rate limited, but bypasses buffer parsing and dedup.
    pub async fn execute_tool(&mut self, name: &str, args: Value) -> ToolResult {
        debug!(%name, "ToolGateway::execute_tool: called");
        if let Err(denial) = self.limiter.check() {
            return ToolResult::failure(denial.to_string());
        }
        self.limiter.record();

        self.emit(ToolEvent::Started {
            tool: name.to_string(),
            args: args.clone(),
        })
        .await;
        let result = self.executor.execute(name, args, &self.ctx).await;
        self.emit(ToolEvent::Finished {
            tool: name.to_string(),
            result: result.clone(),
        })
        .await;
        result
    }

    /// Total calls accepted this session
    pub fn session_call_count(&self) -> usize {
        self.limiter.session_count()
    }

    /// Rate-limit check, then dispatch. A denial becomes a failed result and
    /// the executor is never reached. Denied calls join the dedup set like
    /// executed ones, so a buffer re-scan surfaces each denial only once.
    async fn permit_and_execute(&mut self, call: &ToolCall) -> ToolResult {
        self.executed.insert(call.dedup_key());

        if let Err(denial) = self.limiter.check() {
            debug!(tool = %call.tool, %denial, "ToolGateway::permit_and_execute: denied");
            let result = ToolResult::failure(denial.to_string());
            self.emit(ToolEvent::Finished {
                tool: call.tool.clone(),
                result: result.clone(),
            })
            .await;
            return result;
        }

        self.limiter.record();

        self.emit(ToolEvent::Started {
            tool: call.tool.clone(),
            args: call.args.clone(),
        })
        .await;
        let result = self.executor.execute(&call.tool, call.args.clone(), &self.ctx).await;
        self.emit(ToolEvent::Finished {
            tool: call.tool.clone(),
            result: result.clone(),
        })
        .await;
        result
    }

    async fn emit(&self, event: ToolEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
