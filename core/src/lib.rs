pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{Config, ErrorPolicy};
pub use error::{Error, Result};
