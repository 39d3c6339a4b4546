//! Classification and rendering of task digests

pub mod builder;
pub mod classify;
pub mod template;

pub use builder::{DigestTemplates, RenderedDigest, build, format_subject, render_recipient};
pub use classify::{ClassifierSettings, classify, classify_item};
