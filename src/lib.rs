// src/lib.rs
pub mod aggregate;
pub mod config;
pub mod error;
pub mod logging;
pub mod matrix;
pub mod pipeline;

pub use config::{CliArgs, MergeConfig};
pub use error::{is_user_abort, MergeError};
