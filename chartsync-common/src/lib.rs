//! # chartsync common library
//!
//! Shared code for the chartsync services:
//! - Error types
//! - Chart-date (KST) helpers
//! - Bootstrap configuration and data folder resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
