//! Snapshot store access
//!
//! One module per table, free functions over the pool. The writes the
//! reconciler runs inside its migration transaction are generic over
//! the executor so both paths share one SQL definition.

pub mod aliases;
pub mod genres;
pub mod missed;
pub mod resolved;
