//! Conversation orchestrator - drives the bounded agent loop
//!
//! One orchestrator per conversation. In agent mode each user message runs
//! a loop: stream a provider turn, execute any tool calls through the
//! gateway as they complete, rewrite history with the cleaned assistant
//! text plus a synthesized user turn carrying the results, repeat until the
//! model answers without calling tools or the iteration cap is hit.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::gateway::{CompletedCall, ToolGateway, result_marker};
use crate::llm::{CancelSignal, ChatMessage, ProviderClient};
use crate::parser::{StreamFilter, has_tool_calls, strip_tool_calls};
use crate::prompts;

/// Conversation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Single request/response turn, no tool execution
    Responder,
    /// Bounded tool-calling loop
    Agent,
}

/// How a `send_message` call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The model produced a terminal (no-tool-call) answer
    Completed { iterations: u32 },
    /// The loop stopped because the iteration cap was reached
    IterationCapReached,
    /// Cancellation was observed; stopped silently
    Cancelled,
    /// The provider failed; the error was surfaced as a visible chunk
    ProviderFailed,
}

/// Result of one streamed provider turn
enum Turn {
    Settled { raw: String, results: Vec<CompletedCall> },
    Cancelled,
    ProviderError(String),
}

/// Per-conversation orchestrator
pub struct Orchestrator {
    conversation_id: Uuid,
    provider: Arc<dyn ProviderClient>,
    gateway: ToolGateway,
    conversation: Vec<ChatMessage>,
    config: AgentConfig,
    mode: ChatMode,
    cancel: CancelSignal,
    workspace_name: String,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        gateway: ToolGateway,
        config: AgentConfig,
        mode: ChatMode,
        workspace_name: impl Into<String>,
    ) -> Self {
        let workspace_name = workspace_name.into();
        let system = Self::build_system_prompt(mode, &workspace_name, &gateway);
        Self {
            conversation_id: Uuid::now_v7(),
            provider,
            gateway,
            conversation: vec![ChatMessage::system(system)],
            config,
            mode,
            cancel: CancelSignal::new(),
            workspace_name,
        }
    }

    fn build_system_prompt(mode: ChatMode, workspace_name: &str, gateway: &ToolGateway) -> String {
        match mode {
            ChatMode::Agent => prompts::system_prompt(prompts::AGENT_SYSTEM, workspace_name, &gateway.tool_specs()),
            ChatMode::Responder => prompts::system_prompt(prompts::RESPONDER_SYSTEM, workspace_name, &[]),
        }
    }

    /// Signal handle for cooperative cancellation of the current request
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Conversation history, system prompt included
    pub fn conversation(&self) -> &[ChatMessage] {
        &self.conversation
    }

    /// Start over: new conversation, fresh gateway state, fresh cancel signal
    pub fn reset(&mut self) {
        info!(conversation = %self.conversation_id, "Orchestrator::reset: starting new conversation");
        let system = Self::build_system_prompt(self.mode, &self.workspace_name, &self.gateway);
        self.conversation = vec![ChatMessage::system(system)];
        self.gateway.reset();
        self.cancel = CancelSignal::new();
        self.conversation_id = Uuid::now_v7();
    }

    /// Send one user message and drive it to completion
    ///
    /// Visible output (filtered text, result markers, error/cap warnings)
    /// streams into `visible_tx`.
    pub async fn send_message(&mut self, user_text: &str, visible_tx: mpsc::Sender<String>) -> eyre::Result<SendOutcome> {
        self.conversation.push(ChatMessage::user(user_text));

        match self.mode {
            ChatMode::Responder => self.run_responder(&visible_tx).await,
            ChatMode::Agent => self.run_agent_loop(&visible_tx).await,
        }
    }

    async fn run_responder(&mut self, visible_tx: &mpsc::Sender<String>) -> eyre::Result<SendOutcome> {
        if self.cancel.is_cancelled() {
            return Ok(SendOutcome::Cancelled);
        }

        match self.stream_turn(visible_tx, false).await? {
            Turn::Settled { raw, .. } => {
                self.conversation.push(ChatMessage::assistant(raw));
                Ok(SendOutcome::Completed { iterations: 1 })
            }
            Turn::Cancelled => Ok(SendOutcome::Cancelled),
            Turn::ProviderError(message) => {
                let _ = visible_tx.send(format!("[Error: {message}]")).await;
                Ok(SendOutcome::ProviderFailed)
            }
        }
    }

    async fn run_agent_loop(&mut self, visible_tx: &mpsc::Sender<String>) -> eyre::Result<SendOutcome> {
        let max = self.config.max_iterations;

        for iteration in 1..=max {
            if self.cancel.is_cancelled() {
                info!(conversation = %self.conversation_id, "agent loop cancelled");
                return Ok(SendOutcome::Cancelled);
            }

            info!(conversation = %self.conversation_id, iteration, max, "agent loop iteration");
            self.gateway.begin_turn();

            match self.stream_turn(visible_tx, true).await? {
                Turn::Cancelled => return Ok(SendOutcome::Cancelled),
                Turn::ProviderError(message) => {
                    // Surfaced once; the loop does not retry
                    let _ = visible_tx.send(format!("[Error: {message}]")).await;
                    return Ok(SendOutcome::ProviderFailed);
                }
                Turn::Settled { raw, results } => {
                    if !has_tool_calls(&raw) {
                        debug!(iteration, "agent loop: terminal response");
                        self.conversation.push(ChatMessage::assistant(raw));
                        return Ok(SendOutcome::Completed { iterations: iteration });
                    }

                    let cleaned = strip_tool_calls(&raw);
                    self.conversation.push(ChatMessage::assistant(cleaned));
                    self.conversation.push(tool_results_message(&results));
                }
            }
        }

        warn!(conversation = %self.conversation_id, max, "agent loop hit iteration cap");
        let _ = visible_tx
            .send(format!(
                "\n[Agent stopped: reached the maximum of {max} tool iterations. Results so far are shown above.]"
            ))
            .await;
        Ok(SendOutcome::IterationCapReached)
    }

    /// Run one streaming provider request
    ///
    /// With `with_tools`, deltas feed both the visible-stream filter and the
    /// gateway, so calls execute sequentially as their closing syntax
    /// arrives and result markers land in the visible stream.
    async fn stream_turn(&mut self, visible_tx: &mpsc::Sender<String>, with_tools: bool) -> eyre::Result<Turn> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<String>(64);
        let provider = Arc::clone(&self.provider);
        let model = self.config.model.clone();
        let messages = self.conversation.clone();
        let cancel = self.cancel.clone();

        let request = tokio::spawn(async move {
            provider.send_chat_request(&model, &messages, raw_tx, cancel).await
        });

        let mut filter = StreamFilter::new();
        let mut raw = String::new();
        let mut results = Vec::new();

        while let Some(delta) = raw_rx.recv().await {
            if with_tools {
                let visible = filter.push(&delta);
                if !visible.is_empty() {
                    let _ = visible_tx.send(visible).await;
                }
                let outcome = self.gateway.process_chunk(&delta).await;
                for done in outcome.results {
                    let _ = visible_tx.send(result_marker(&done.call.tool, &done.result)).await;
                    results.push(done);
                }
            } else {
                raw.push_str(&delta);
                let _ = visible_tx.send(delta).await;
            }
        }

        let provider_result = request
            .await
            .map_err(|e| eyre::eyre!("provider task failed: {e}"))?;

        if self.cancel.is_cancelled() {
            // An in-flight call is not preempted, but its result is dropped
            return Ok(Turn::Cancelled);
        }

        match provider_result {
            Err(crate::llm::ProviderError::Cancelled) => Ok(Turn::Cancelled),
            Err(e) => Ok(Turn::ProviderError(e.to_string())),
            Ok(()) => {
                if with_tools {
                    let tail = filter.finish();
                    if !tail.is_empty() {
                        let _ = visible_tx.send(tail).await;
                    }
                    Ok(Turn::Settled {
                        raw: self.gateway.buffer().to_string(),
                        results,
                    })
                } else {
                    Ok(Turn::Settled { raw, results })
                }
            }
        }
    }

    /// Title for the finished exchange, with a local fallback when the
    /// provider call fails
    pub async fn generate_title(&self, user_message: &str, assistant_response: &str) -> String {
        match self
            .provider
            .generate_title(&self.config.model, user_message, assistant_response)
            .await
        {
            Ok(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => fallback_title(user_message),
        }
    }
}

/// Synthesized user turn carrying all tool results back to the model.
/// Formatted read_file output is included verbatim so the model sees literal
/// file content, not a paraphrase.
fn tool_results_message(results: &[CompletedCall]) -> ChatMessage {
    let mut body = String::from("Tool results:\n\n");
    for done in results {
        if done.result.success {
            body.push_str(&format!(
                "### {}\n{}\n\n",
                done.call.tool,
                done.result.formatted.as_deref().unwrap_or("(no output)")
            ));
        } else {
            body.push_str(&format!(
                "### {} (failed)\n{}\n\n",
                done.call.tool,
                done.result.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    body.push_str("Use these results to answer the user's question. Do not call more tools unless strictly necessary.");
    ChatMessage::user(body)
}

/// First ~4 words of the user message, capitalized and bounded
fn fallback_title(user_message: &str) -> String {
    let title: String = user_message
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(40)
        .collect();

    let mut chars = title.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "New Conversation".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::llm::client::mock::{MockProvider, MockTurn};
    use crate::tools::{Tool, ToolContext, ToolExecutor, ToolResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::tempdir;

    /// Fixed-output tool so loop tests need no real filesystem
    struct ProbeTool;

    #[async_trait]
    impl Tool for ProbeTool {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn description(&self) -> &'static str {
            "Returns a fixed payload."
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
            ToolResult::success(json!({"echo": args.clone()}), format!("probe saw {args}"))
        }
    }

    fn test_orchestrator(turns: Vec<MockTurn>, max_iterations: u32) -> (Orchestrator, Arc<MockProvider>) {
        let temp = tempdir().unwrap();
        let provider = Arc::new(MockProvider::new(turns));

        let mut executor = ToolExecutor::empty();
        executor.add_tool(Arc::new(ProbeTool));
        let ctx = ToolContext::new(temp.path().to_path_buf());
        let limits = RateLimitConfig {
            cooldown_ms: 0,
            ..Default::default()
        };
        let gateway = ToolGateway::with_executor(executor, ctx, limits);

        let config = AgentConfig {
            max_iterations,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(provider.clone(), gateway, config, ChatMode::Agent, "test-ws");
        (orchestrator, provider)
    }

    async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_terminal_response_completes_in_one_iteration() {
        let (mut orchestrator, provider) =
            test_orchestrator(vec![MockTurn::text("Just an answer, no tools.")], 10);
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("hi", tx).await.unwrap();

        assert_eq!(outcome, SendOutcome::Completed { iterations: 1 });
        assert_eq!(provider.call_count(), 1);
        let visible = drain(rx).await.join("");
        assert_eq!(visible, "Just an answer, no tools.");
        // system + user + assistant
        assert_eq!(orchestrator.conversation().len(), 3);
    }

    #[tokio::test]
    async fn test_tool_turn_rewrites_history_and_emits_marker() {
        let call_text = r#"Let me check. {"tool": "probe", "args": {"n": 1}}"#;
        let (mut orchestrator, provider) = test_orchestrator(
            vec![MockTurn::text(call_text), MockTurn::text("Found it.")],
            10,
        );
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("look around", tx).await.unwrap();

        assert_eq!(outcome, SendOutcome::Completed { iterations: 2 });
        assert_eq!(provider.call_count(), 2);

        let visible = drain(rx).await.join("");
        // Raw call syntax never reaches the visible stream
        assert!(!visible.contains("\"tool\""));
        assert!(visible.contains("Let me check."));
        assert!(visible.contains("[[TOOL_RESULT:probe:"));
        assert!(visible.contains("Found it."));

        // History: system, user, cleaned assistant, synthesized user, final assistant
        let conversation = orchestrator.conversation();
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation[2].role, crate::llm::Role::Assistant);
        assert!(!conversation[2].content.contains("\"tool\""));
        assert_eq!(conversation[3].role, crate::llm::Role::User);
        assert!(conversation[3].content.contains("Tool results:"));
        assert!(conversation[3].content.contains("probe saw"));
        assert!(conversation[3].content.contains("Do not call more tools"));

        // The second provider call saw the synthesized turn
        let seen = provider.seen.lock().unwrap();
        let second_request = &seen[1];
        assert!(second_request.iter().any(|m| m.content.contains("Tool results:")));
    }

    #[tokio::test]
    async fn test_iteration_cap_emits_warning_exactly_once() {
        // Every scripted turn calls a tool (different args so dedup never skips)
        let turns = (0..5)
            .map(|i| MockTurn::text(format!(r#"{{"tool": "probe", "args": {{"n": {i}}}}}"#)))
            .collect();
        let (mut orchestrator, provider) = test_orchestrator(turns, 3);
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("go", tx).await.unwrap();

        assert_eq!(outcome, SendOutcome::IterationCapReached);
        assert_eq!(provider.call_count(), 3);
        let chunks = drain(rx).await;
        let warnings = chunks.iter().filter(|c| c.contains("[Agent stopped:")).count();
        assert_eq!(warnings, 1);
    }

    #[tokio::test]
    async fn test_cancellation_before_request_is_silent() {
        let (mut orchestrator, provider) = test_orchestrator(vec![MockTurn::text("never sent")], 10);
        orchestrator.cancel_signal().cancel();
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("hi", tx).await.unwrap();

        assert_eq!(outcome, SendOutcome::Cancelled);
        assert_eq!(provider.call_count(), 0);
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_surfaces_once_and_stops() {
        let (mut orchestrator, _provider) =
            test_orchestrator(vec![MockTurn::Fail("connection refused".to_string())], 10);
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("hi", tx).await.unwrap();

        assert_eq!(outcome, SendOutcome::ProviderFailed);
        let chunks = drain(rx).await;
        let errors: Vec<_> = chunks.iter().filter(|c| c.starts_with("[Error:")).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_bracket_shorthand_drives_the_loop_too() {
        let (mut orchestrator, _provider) = test_orchestrator(
            vec![MockTurn::text("Reading. [[GREP:needle]]"), MockTurn::text("Done.")],
            10,
        );
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("hi", tx).await.unwrap();

        // grep is not registered in the probe-only executor, so the call
        // fails - but the loop still executes it and continues
        assert_eq!(outcome, SendOutcome::Completed { iterations: 2 });
        let visible = drain(rx).await.join("");
        assert!(visible.contains("[[TOOL_ERROR:grep:"));
        assert!(!visible.contains("[[GREP:needle]]"));
    }

    #[tokio::test]
    async fn test_responder_mode_is_single_turn_without_tools() {
        let temp = tempdir().unwrap();
        let provider = Arc::new(MockProvider::new(vec![MockTurn::text(
            r#"Responder ignores this: {"tool": "probe", "args": {}}"#,
        )]));
        let ctx = ToolContext::new(temp.path().to_path_buf());
        let gateway = ToolGateway::new(ctx, RateLimitConfig::default());
        let mut orchestrator = Orchestrator::new(
            provider.clone(),
            gateway,
            AgentConfig::default(),
            ChatMode::Responder,
            "test-ws",
        );
        let (tx, rx) = mpsc::channel(64);

        let outcome = orchestrator.send_message("hi", tx).await.unwrap();

        assert_eq!(outcome, SendOutcome::Completed { iterations: 1 });
        assert_eq!(provider.call_count(), 1);
        // No execution, no markers, text passed through unfiltered
        let visible = drain(rx).await.join("");
        assert!(visible.contains("\"tool\""));
        assert!(!visible.contains("[[TOOL_RESULT"));
    }

    #[tokio::test]
    async fn test_generate_title_uses_provider_when_available() {
        let (orchestrator, _provider) = {
            let temp = tempdir().unwrap();
            let provider = Arc::new(MockProvider::new(vec![]).with_title("Fix login bug"));
            let ctx = ToolContext::new(temp.path().to_path_buf());
            let gateway = ToolGateway::new(ctx, RateLimitConfig::default());
            (
                Orchestrator::new(provider.clone(), gateway, AgentConfig::default(), ChatMode::Agent, "ws"),
                provider,
            )
        };

        let title = orchestrator.generate_title("why does login fail?", "Because...").await;

        assert_eq!(title, "Fix login bug");
    }

    #[tokio::test]
    async fn test_generate_title_falls_back_locally() {
        let (orchestrator, _provider) = test_orchestrator(vec![], 10);

        let title = orchestrator
            .generate_title("why does the login page crash on submit", "...")
            .await;

        assert_eq!(title, "Why does the login");
    }

    #[test]
    fn test_fallback_title_empty_message() {
        assert_eq!(fallback_title("   "), "New Conversation");
    }

    #[tokio::test]
    async fn test_reset_starts_a_fresh_conversation() {
        let (mut orchestrator, _provider) = test_orchestrator(vec![MockTurn::text("answer")], 10);
        let (tx, _rx) = mpsc::channel(64);
        orchestrator.send_message("hi", tx).await.unwrap();
        assert!(orchestrator.conversation().len() > 1);

        orchestrator.reset();

        assert_eq!(orchestrator.conversation().len(), 1);
        assert_eq!(orchestrator.conversation()[0].role, crate::llm::Role::System);
    }
}
