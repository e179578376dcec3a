use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::error::ApiError;
use crate::pricing::PricingError;
use crate::repository::RepositoryError;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Order {0} not found")]
    NotFound(Uuid),

    #[error("Cart for client {0} is empty")]
    EmptyCart(String),

    #[error("{0}")]
    InvalidTransition(String),
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        OrderError::Pricing(err.into())
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Pricing(inner) => inner.into(),
            OrderError::NotFound(id) => ApiError::NotFound {
                resource: "Order".to_string(),
                id: id.to_string(),
            },
            OrderError::EmptyCart(_) => ApiError::InvalidArgument(err.to_string()),
            OrderError::InvalidTransition(message) => ApiError::Conflict { message },
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
