pub mod auth;
pub mod error;
pub mod extract;
pub mod session;
