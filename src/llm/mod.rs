//! LLM provider contracts
//!
//! The runtime core never talks to a model backend directly. Concrete
//! adapters (HTTP, IPC, whatever the host editor ships) implement
//! [`ProviderClient`]; this module only defines the contract and the
//! message types that cross it.

pub mod client;
mod error;
mod types;

pub use client::{CancelSignal, ProviderClient};
pub use error::ProviderError;
pub use types::{ChatMessage, Role};
