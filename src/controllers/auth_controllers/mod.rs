pub mod delete_user;
pub mod get_users;
pub mod login;
pub mod models;
pub mod register;
