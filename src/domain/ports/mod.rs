pub mod avatar_sanitizer;
pub mod clock;
pub mod identity_provider;
pub mod identity_store;
pub mod state_store;

pub use avatar_sanitizer::AvatarSanitizer;
pub use clock::{Clock, SystemClock};
pub use identity_provider::{TokenExchanger, UserInfoFetcher};
pub use identity_store::IdentityStore;
pub use state_store::StateStore;
