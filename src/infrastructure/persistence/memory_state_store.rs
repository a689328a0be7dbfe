use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::entities::StateEntry;
use crate::domain::errors::DomainResult;
use crate::domain::ports::{Clock, StateStore};

/// Process-local state store.
///
/// A single lock guards the map and is held only for the duration of each
/// operation. Every insert sweeps expired entries, so abandoned logins are
/// bounded by the TTL without a background task. Horizontally scaled
/// deployments need a shared store behind the same trait.
pub struct InMemoryStateStore {
    entries: Mutex<HashMap<String, StateEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStateStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn sweep(entries: &mut HashMap<String, StateEntry>, clock: &dyn Clock) -> usize {
        let now = clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

#[async_trait::async_trait]
impl StateStore for InMemoryStateStore {
    async fn insert(&self, entry: StateEntry) -> DomainResult<()> {
        let mut entries = self.entries.lock().await;
        let swept = Self::sweep(&mut entries, self.clock.as_ref());
        if swept > 0 {
            tracing::debug!(swept, remaining = entries.len(), "Swept expired login states");
        }
        entries.insert(entry.token.clone(), entry);
        Ok(())
    }

    async fn peek(&self, token: &str) -> DomainResult<Option<StateEntry>> {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();

        match entries.get(token) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(token);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &str) -> DomainResult<()> {
        self.entries.lock().await.remove(token);
        Ok(())
    }
}
