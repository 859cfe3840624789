//! Config-file parsing.

pub mod config;
