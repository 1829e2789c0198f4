//! Pipeline configuration: loading and validating named pipelines from TOML.

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::load_config;
pub use types::{Config, PipelineConfig, StageConfig};
pub use validation::validate_config;
