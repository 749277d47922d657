pub mod api_review;
pub mod approval;
pub mod check_sync;
pub mod context;
pub mod deprecation_review;
pub mod dispatcher;
pub mod governance;
pub mod label_sync;
pub mod reconcile;
pub mod semver;
pub mod tamper;
pub mod time_gate;
