pub mod config;
pub mod deform;
pub mod error;
pub mod math;
pub mod rbf;

pub use config::{BakeConfig, BridgePreset};
pub use error::{BakeError, Result};
