use crate::infrastructure::error::InfraError;
use async_trait::async_trait;

/// Boundary to the platform mechanism that reports and flips the external
/// grayscale mode.
///
/// The platform only exposes a toggle, never a direct setter, so `invoke`
/// carries no target state. Callers that need to know the outcome must call
/// `query` again afterwards; the state is shared with the rest of the host
/// environment and can change out-of-band at any time.
#[async_trait]
pub trait ModeGateway: Send + Sync {
    /// Current external-mode state. Platform implementations should report
    /// `false` when the state cannot be determined.
    async fn query(&self) -> Result<bool, InfraError>;

    /// Request a state flip.
    async fn invoke(&self) -> Result<(), InfraError>;
}
