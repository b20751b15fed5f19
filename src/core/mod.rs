//! Core business logic modules.

pub mod bitrate;
pub mod command;
pub mod controller;
pub mod encoder;
pub mod progress;
