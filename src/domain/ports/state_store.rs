use crate::domain::entities::StateEntry;
use crate::domain::errors::DomainResult;

/// Ephemeral, time-bounded store of in-flight CSRF states.
///
/// `peek` never consumes: the flow deletes the entry only once the callback
/// has definitively succeeded or failed. Expired and never-issued tokens are
/// both reported as `None`.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn insert(&self, entry: StateEntry) -> DomainResult<()>;
    async fn peek(&self, token: &str) -> DomainResult<Option<StateEntry>>;
    /// Idempotent; deleting a missing token is a no-op.
    async fn delete(&self, token: &str) -> DomainResult<()>;
}
