pub mod csrf;
pub mod rate_limiter;

pub use csrf::*;
pub use rate_limiter::*;
