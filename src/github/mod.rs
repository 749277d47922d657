pub mod api;
pub mod auth;
pub mod checks;
pub mod client;
pub mod config;
#[cfg(test)]
pub mod fake;
pub mod labels;
pub mod prs;
pub mod repos;
pub mod reviews;
pub mod teams;
