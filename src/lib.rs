pub mod config;
pub mod constants;
pub mod error;
pub mod ffmpeg;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod utils;

pub use error::{ConcatError, Result};
