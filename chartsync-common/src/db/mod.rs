//! Database initialization shared across chartsync services

pub mod init;
