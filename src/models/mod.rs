//! Data models.

pub mod config;
pub mod job;
pub mod media;
