//! Assembly Core -- a tick-driven simulation of a single-chain assembly line.
//!
//! Customer orders enter at the head of a chain of stations. Each station
//! holds one inventory item; while an order sits at the head of a station's
//! queue the station tries to fill the order's matching request from stock,
//! then passes the order down the chain. Orders leaving the last station
//! land in the completed or incomplete pool.
//!
//! # Four-Phase Tick
//!
//! Each call to [`pipeline::Pipeline::tick`] advances the line by one tick:
//!
//! 1. **Admit** -- Move one pending order onto the entry station.
//! 2. **Fill** -- Every active station fills its head order if it can.
//! 3. **Advance** -- Every active station releases a finished head order;
//!    transfers land after the pass, so an order moves at most one station.
//! 4. **Deliver** -- Buffered events go to subscribers.
//!
//! # Key Types
//!
//! - [`pipeline::Pipeline`] -- Station arena, chain topology and tick loop.
//! - [`sim::SimulationContext`] -- Pending, completed and incomplete pools.
//! - [`order::Order`] -- Move-only customer order with per-item fill state.
//! - [`item::InventoryItem`] -- Stock record that issues serial numbers.
//! - [`record::Tokenizer`] -- Delimiter-separated record splitting.
//! - [`event::EventBus`] -- Passive subscribers with buffered delivery.
//! - [`query::RunReport`] -- Owned snapshots for reports and JSON output.

pub mod event;
pub mod id;
pub mod item;
pub mod order;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod sim;
pub mod stage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
