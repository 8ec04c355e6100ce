pub mod jwt;
pub mod policy;
