pub mod memory_identity_store;
pub mod memory_state_store;

pub use memory_identity_store::InMemoryIdentityStore;
pub use memory_state_store::InMemoryStateStore;
