//! Configuration and the data model shared by every stage

pub mod config;
pub mod models;
