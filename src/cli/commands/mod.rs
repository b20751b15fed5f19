//! CLI command implementations.

pub mod check;
pub mod convert;
pub mod encode;
pub mod gif;
pub mod probe;
