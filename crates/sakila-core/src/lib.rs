pub mod config;
pub mod error;

pub use config::SakilaConfig;
pub use error::{Result, SakilaError};
