#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod replay;
pub mod scene;

pub use cli::{Cli, run, run_with_output};
pub use error::{CliError, Result};
