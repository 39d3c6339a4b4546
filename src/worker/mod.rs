//! A complete reminder run and its failure reporting

pub mod notify;
pub mod run;

pub use notify::{error_envelope, notify_failure};
pub use run::{RunReport, resolve_recipients, run_digest};
