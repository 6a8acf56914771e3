pub mod board;
pub mod config;
pub mod error;

pub use board::ReviewBoard;
pub use config::{PipelineSettings, Settings, resolve_config_path};
pub use error::{Error, Result};
