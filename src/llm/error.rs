//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during provider calls
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider backend error: {0}")]
    Backend(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Backend(_) => true,
            ProviderError::Timeout(_) => true,
            ProviderError::InvalidResponse(_) => false,
            ProviderError::Cancelled => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        let err = ProviderError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert!(err.is_rate_limit());
        assert!(!ProviderError::Cancelled.is_rate_limit());
    }

    #[test]
    fn test_is_retryable() {
        assert!(ProviderError::Backend("connection reset".to_string()).is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!ProviderError::InvalidResponse("bad JSON".to_string()).is_retryable());
        assert!(!ProviderError::Cancelled.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let err = ProviderError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(ProviderError::Cancelled.retry_after(), None);
    }
}
