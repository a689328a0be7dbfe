pub mod authorization_url;
pub mod identity_normalizer;
pub mod oauth_flow;
pub mod redirect_uri;
pub mod return_url;
pub mod session_issuer;

pub use authorization_url::*;
pub use identity_normalizer::*;
pub use oauth_flow::*;
pub use redirect_uri::*;
pub use return_url::*;
pub use session_issuer::*;
