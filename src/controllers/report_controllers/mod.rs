pub mod feed;
pub mod models;
pub mod summary;
