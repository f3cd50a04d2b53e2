//! Services layer - business operations and utilities.
//!
//! - Text operations (line/column, search)
//! - Find session state
//! - File formats

pub mod find;
pub mod formats;
pub mod text_ops;
