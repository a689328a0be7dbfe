pub mod controllers;
pub mod cookies;
pub mod middleware;
pub mod router;
