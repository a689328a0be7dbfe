pub mod identity;
pub mod oauth_state;
pub mod session;
pub mod user;

pub use identity::*;
pub use oauth_state::*;
pub use session::*;
pub use user::*;
