// Shared part with the log-analyzer binary
pub mod aggregate;
pub mod assets;
pub mod config;
pub mod error;
pub mod logfile;
pub mod parser;
pub mod report;
pub mod stages;
pub mod stats;
pub mod template;

pub use config::Config;
pub use error::{Error, Result};
pub use stages::{run, Outcome};
