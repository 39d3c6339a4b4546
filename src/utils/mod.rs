//! Utilities shared across modules

pub mod dates;
