pub mod auth_controllers;
pub mod poll_controllers;
pub mod report_controllers;
