use crate::domain::entities::{NormalizedIdentity, User};
use crate::domain::errors::DomainResult;

#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create the user for `identity.provider_id`, or merge non-empty fields
    /// into the existing one.
    async fn upsert_by_provider_id(&self, identity: &NormalizedIdentity) -> DomainResult<User>;
    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>>;
}
