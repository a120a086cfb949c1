//! ProviderClient trait definition

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatMessage, ProviderError};

/// Cooperative cancellation signal
///
/// Checked by the orchestrator at loop boundaries and passed into provider
/// adapters so they can abandon an in-flight request. Cancellation never
/// preempts; a request that ignores the signal simply has its result
/// discarded by the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Streaming chat client - the contract this runtime expects from a model
/// backend adapter
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Send one chat request, streaming text deltas into `chunk_tx` as they
    /// arrive. Resolves once the response has settled.
    async fn send_chat_request(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        chunk_tx: mpsc::Sender<String>,
        cancel: CancelSignal,
    ) -> Result<(), ProviderError>;

    /// One-shot title generation for a finished exchange
    async fn generate_title(
        &self,
        model_id: &str,
        user_message: &str,
        assistant_response: &str,
    ) -> Result<String, ProviderError>;
}
