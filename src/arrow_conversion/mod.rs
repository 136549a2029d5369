//! Arrow data format conversion utilities.
//!
//! This module converts decoded row sets into Apache Arrow columnar format.

mod builders;
mod converter;

pub use builders::build_array;
pub use converter::{ArrowConverter, TYPE_METADATA_KEY};
