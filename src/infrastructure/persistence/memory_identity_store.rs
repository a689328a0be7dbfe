use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::entities::{NormalizedIdentity, User};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{Clock, IdentityStore};

#[derive(Default)]
struct Users {
    by_id: HashMap<String, User>,
    /// provider_id -> user id
    by_provider: HashMap<String, String>,
}

/// Process-local identity store for development and tests.
pub struct InMemoryIdentityStore {
    users: RwLock<Users>,
    clock: Arc<dyn Clock>,
}

impl InMemoryIdentityStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(Users::default()),
            clock,
        }
    }

    pub async fn find_by_provider_id(&self, provider_id: &str) -> Option<User> {
        let users = self.users.read().await;
        users
            .by_provider
            .get(provider_id)
            .and_then(|id| users.by_id.get(id))
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.by_id.len()
    }
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn upsert_by_provider_id(&self, identity: &NormalizedIdentity) -> DomainResult<User> {
        if identity.provider_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "provider_id is required".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut users = self.users.write().await;

        if let Some(id) = users.by_provider.get(&identity.provider_id).cloned() {
            if let Some(user) = users.by_id.get_mut(&id) {
                user.merge_identity(identity, now);
                return Ok(user.clone());
            }
        }

        let user = User::from_identity(identity, now);
        users
            .by_provider
            .insert(identity.provider_id.clone(), user.id.clone());
        users.by_id.insert(user.id.clone(), user.clone());
        tracing::info!(user_id = %user.id, "Created user from identity provider profile");
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.read().await.by_id.get(user_id).cloned())
    }
}
