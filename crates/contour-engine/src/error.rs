use contour_core::errors::GatewayError;
use contour_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session is already complete")]
    SessionComplete,

    #[error("{0}")]
    Internal(String),
}
