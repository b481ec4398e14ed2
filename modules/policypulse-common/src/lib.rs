pub mod config;
pub mod error;
pub mod types;
pub mod vocab;

pub use config::Config;
pub use error::PolicyPulseError;
pub use types::*;
