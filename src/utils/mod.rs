pub mod check_run;
pub mod config;
pub mod github_auth_info;
pub mod labels;
pub mod pr_info;
pub mod review_event;
pub mod webhook_event;
