//! File loading for the assembly line: station, order and topology record
//! files, plus RON/TOML/JSON run configurations.

pub mod config;
pub mod loader;

pub use config::{LineConfig, Scenario, SourceConfig};
pub use loader::DataLoadError;
