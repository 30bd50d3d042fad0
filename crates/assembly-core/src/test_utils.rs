//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::id::ItemId;
use crate::item::InventoryItem;
use crate::order::Order;
use crate::pipeline::{Link, Pipeline};
use crate::sim::SimulationContext;

// ===========================================================================
// Stations
// ===========================================================================

/// Stock each office station starts with.
pub const OFFICE_STOCK: u32 = 5;

/// First serial number issued by the office stations.
pub const OFFICE_SERIAL: u64 = 100_000;

pub fn item(id: u32, name: &str, quantity: u32) -> InventoryItem {
    InventoryItem::new(ItemId(id), name, OFFICE_SERIAL, quantity, format!("{name} unit"))
}

/// Desk, Chair and Lamp with [`OFFICE_STOCK`] units each.
pub fn office_items() -> Vec<InventoryItem> {
    vec![
        item(1, "Desk", OFFICE_STOCK),
        item(2, "Chair", OFFICE_STOCK),
        item(3, "Lamp", OFFICE_STOCK),
    ]
}

// ===========================================================================
// Orders
// ===========================================================================

/// An "Office" order for `customer`.
pub fn order(customer: &str, items: &[&str]) -> Order {
    Order::new(customer, "Office", items.iter().copied()).unwrap()
}

// ===========================================================================
// Topology
// ===========================================================================

pub fn links(pairs: &[(&str, Option<&str>)]) -> Vec<Link> {
    pairs.iter().map(|&(from, to)| Link::new(from, to)).collect()
}

/// Links chaining `names` front to back.
pub fn chain(names: &[&str]) -> Vec<Link> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Link::new(*name, names.get(i + 1).copied()))
        .collect()
}

/// The office stations wired Desk -> Chair -> Lamp.
pub fn office_line(ctx: &SimulationContext) -> Pipeline {
    Pipeline::new(office_items(), &chain(&["Desk", "Chair", "Lamp"]), ctx).unwrap()
}
