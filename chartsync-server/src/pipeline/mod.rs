//! Chart pipeline engines
//!
//! - [`resolver`]: fan a chart batch out against the catalog and persist
//!   every outcome
//! - [`reconciler`]: apply manual corrections to missed tracks atomically
//! - [`publisher`]: push a date's resolved ranking to a playlist
//! - [`genre_archive`]: daily snapshot of each genre's newest songs

pub mod genre_archive;
pub mod publisher;
pub mod reconciler;
pub mod resolver;
