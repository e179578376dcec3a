// Error types for the pricing core
// Soft conditions (missing agent or client) never reach this type; they degrade to rate 0.

use thiserror::Error;

use crate::repository::RepositoryError;

/// Main error type for the pricing core
///
/// Every variant is fatal to the single operation that produced it.
/// Only `UpstreamUnavailable` is worth retrying.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Malformed id, negative/NaN price, out-of-bound setting
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record the operation cannot proceed without (product, order, cart line)
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: String },

    /// Persistence layer I/O failure
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

impl PricingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PricingError::InvalidArgument(message.into())
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        PricingError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, PricingError::UpstreamUnavailable(_))
    }
}

impl From<RepositoryError> for PricingError {
    fn from(err: RepositoryError) -> Self {
        PricingError::UpstreamUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PricingError::invalid("basePrice must be finite");
        assert_eq!(error.to_string(), "Invalid argument: basePrice must be finite");

        let error = PricingError::not_found("Product", "p-1");
        assert_eq!(error.to_string(), "Product with id p-1 not found");
    }

    #[test]
    fn test_only_upstream_errors_are_retryable() {
        assert!(PricingError::UpstreamUnavailable("timeout".to_string()).is_retryable());
        assert!(!PricingError::invalid("bad id").is_retryable());
        assert!(!PricingError::not_found("Order", "x").is_retryable());
    }

    #[test]
    fn test_repository_error_becomes_upstream() {
        let err: PricingError = RepositoryError::Unavailable("memory store offline".to_string()).into();
        assert!(matches!(err, PricingError::UpstreamUnavailable(_)));
    }
}
