pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{SqliteBaselineStore, TequilaConfig, TequilaSource};
pub use config::{cli::LocalStorage, toml_config::TomlConfig, CliConfig, RunSettings};
pub use crate::core::{etl::DealEngine, etl::RunOutcome, pipeline::DealPipeline};
pub use utils::error::{DealError, Result};
