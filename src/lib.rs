//! Discord Media Tool Library
//!
//! Probes media with ffprobe and drives two-pass ffmpeg encodes that fit a
//! target file size.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
