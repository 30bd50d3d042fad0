//! Run configuration: which files feed the line and how they are delimited.
//!
//! A `LineConfig` can be written as RON, TOML or JSON. Relative paths are
//! resolved against the directory holding the configuration file.
//!
//! ```toml
//! max_ticks = 500
//!
//! [[stations]]
//! path = "stations1.txt"
//! delimiter = ","
//!
//! [[stations]]
//! path = "stations2.txt"
//! delimiter = "|"
//!
//! [orders]
//! path = "orders.txt"
//! delimiter = "|"
//!
//! [topology]
//! path = "line.txt"
//! delimiter = "|"
//! ```

use crate::loader::{self, DataLoadError};
use assembly_core::id::ItemIdAllocator;
use assembly_core::item::InventoryItem;
use assembly_core::order::Order;
use assembly_core::pipeline::{Link, Pipeline, TopologyError};
use assembly_core::sim::{SimulationContext, Ticks};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===========================================================================
// Configuration
// ===========================================================================

fn default_delimiter() -> char {
    ','
}

fn default_reorder() -> bool {
    true
}

/// One record file and its field delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }
}

/// The files making up one assembly-line run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Station files, loaded in order; ids continue across files.
    pub stations: Vec<SourceConfig>,
    pub orders: SourceConfig,
    pub topology: SourceConfig,
    /// Give up after this many ticks. Unbounded when absent.
    #[serde(default)]
    pub max_ticks: Option<Ticks>,
    /// Put the active line into chain order before running.
    #[serde(default = "default_reorder")]
    pub reorder: bool,
}

impl LineConfig {
    /// The classic four-file batch layout: two station files, an order file
    /// and a topology file, delimited `,` `|` `|` `|`.
    pub fn batch(
        stations1: impl Into<PathBuf>,
        stations2: impl Into<PathBuf>,
        orders: impl Into<PathBuf>,
        topology: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stations: vec![
                SourceConfig::new(stations1, ','),
                SourceConfig::new(stations2, '|'),
            ],
            orders: SourceConfig::new(orders, '|'),
            topology: SourceConfig::new(topology, '|'),
            max_ticks: None,
            reorder: true,
        }
    }

    /// Read a configuration file and resolve its paths against the file's
    /// own directory.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let mut config: Self = loader::deserialize_file(path)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(file = %path.display(), "loaded line configuration");
        Ok(config)
    }

    /// Make every relative source path relative to `base` instead.
    pub fn resolve_paths(&mut self, base: &Path) {
        let sources = self
            .stations
            .iter_mut()
            .chain([&mut self.orders, &mut self.topology]);
        for source in sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
    }
}

// ===========================================================================
// Scenario
// ===========================================================================

/// Everything read from a configuration's record files.
#[derive(Debug)]
pub struct Scenario {
    pub items: Vec<InventoryItem>,
    pub orders: Vec<Order>,
    pub links: Vec<Link>,
}

impl Scenario {
    /// Load every source named by `config`. Fails on the first bad file.
    pub fn load(config: &LineConfig) -> Result<Self, DataLoadError> {
        let mut ids = ItemIdAllocator::new();
        let mut items = Vec::new();
        for source in &config.stations {
            let tokenizer = loader::tokenizer_for(source.delimiter)?;
            items.extend(loader::load_stations(&source.path, &tokenizer, &mut ids)?);
        }

        let tokenizer = loader::tokenizer_for(config.orders.delimiter)?;
        let orders = loader::load_orders(&config.orders.path, &tokenizer)?;

        let tokenizer = loader::tokenizer_for(config.topology.delimiter)?;
        let links = loader::load_topology(&config.topology.path, &tokenizer)?;

        Ok(Self {
            items,
            orders,
            links,
        })
    }

    /// Configure the line and queue every order as pending.
    pub fn build(self, reorder: bool) -> Result<(Pipeline, SimulationContext), TopologyError> {
        let ctx = SimulationContext::with_orders(self.orders);
        let mut line = Pipeline::new(self.items, &self.links, &ctx)?;
        if reorder {
            line.reorder_stations()?;
        }
        Ok((line, ctx))
    }
}
