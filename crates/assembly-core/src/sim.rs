//! Order pools and simulation state shared across one run.
//!
//! The three order pools (pending, completed, incomplete) live in an explicit
//! [`SimulationContext`] that the caller owns and lends to
//! [`Pipeline::tick`](crate::pipeline::Pipeline::tick). Every order is held by
//! exactly one pool or stage queue at a time; moving an order between them
//! is a move of ownership.

use crate::order::Order;
use std::collections::VecDeque;

/// Simulation time in ticks.
pub type Ticks = u64;

// ---------------------------------------------------------------------------
// Terminal pools
// ---------------------------------------------------------------------------

/// Which terminal pool an order was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Completed,
    Incomplete,
}

// ---------------------------------------------------------------------------
// Simulation context
// ---------------------------------------------------------------------------

/// The pending, completed and incomplete order pools.
#[derive(Debug, Default)]
pub struct SimulationContext {
    pending: VecDeque<Order>,
    completed: VecDeque<Order>,
    incomplete: VecDeque<Order>,
}

impl SimulationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose pending pool holds `orders` in the given order.
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            pending: orders.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Queue an order for admission behind any already pending.
    pub fn push_pending(&mut self, order: Order) {
        self.pending.push_back(order);
    }

    pub(crate) fn pop_pending(&mut self) -> Option<Order> {
        self.pending.pop_front()
    }

    /// Route an order that left the last stage into its terminal pool.
    pub(crate) fn route_terminal(&mut self, order: Order) -> Terminal {
        if order.is_complete() {
            self.completed.push_back(order);
            Terminal::Completed
        } else {
            self.incomplete.push_back(order);
            Terminal::Incomplete
        }
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Order> {
        self.pending.iter()
    }

    pub fn completed(&self) -> impl ExactSizeIterator<Item = &Order> {
        self.completed.iter()
    }

    pub fn incomplete(&self) -> impl ExactSizeIterator<Item = &Order> {
        self.incomplete.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn incomplete_len(&self) -> usize {
        self.incomplete.len()
    }

    /// Orders that can no longer move.
    pub fn terminal_len(&self) -> usize {
        self.completed.len() + self.incomplete.len()
    }

    /// Drop every order from every pool.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.completed.clear();
        self.incomplete.clear();
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit) fingerprint of a line's stock, queues and order pools.
/// Two runs of the same input produce the same value; not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Empty hash, seeded with the FNV offset basis.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Mix raw bytes in, one at a time.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Mix in a counter or serial, little-endian.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Mix in a stock quantity, little-endian.
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a string, length-prefixed so adjacent strings cannot alias.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write(s.as_bytes());
    }

    /// Feed the visible state of one order.
    pub fn write_order(&mut self, order: &Order) {
        self.write_str(order.customer());
        self.write_str(order.product());
        for item in order.items() {
            self.write_str(item.name());
            self.write_u64(item.serial().map_or(0, |s| s.wrapping_add(1)));
        }
    }

    /// The accumulated 64-bit value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(customer: &str, items: &[&str]) -> Order {
        Order::new(customer, "Office", items.iter().copied()).unwrap()
    }

    #[test]
    fn with_orders_keeps_fifo_order() {
        let mut ctx = SimulationContext::with_orders([order("Ann", &["Desk"]), order("Bob", &["Desk"])]);
        ctx.push_pending(order("Cy", &["Desk"]));
        let names: Vec<_> = ctx.pending().map(Order::customer).collect();
        assert_eq!(names, vec!["Ann", "Bob", "Cy"]);
        assert_eq!(ctx.pop_pending().map(|o| o.customer().to_string()), Some("Ann".into()));
        assert_eq!(ctx.pending_len(), 2);
    }

    #[test]
    fn route_terminal_splits_by_completeness() {
        let mut ctx = SimulationContext::new();
        assert_eq!(ctx.route_terminal(order("Ann", &["Desk"])), Terminal::Incomplete);
        assert_eq!(ctx.completed_len(), 0);
        assert_eq!(ctx.incomplete_len(), 1);
        assert_eq!(ctx.terminal_len(), 1);
    }

    #[test]
    fn clear_empties_every_pool() {
        let mut ctx = SimulationContext::with_orders([order("Ann", &["Desk"])]);
        ctx.route_terminal(order("Bob", &["Desk"]));
        ctx.clear();
        assert_eq!(ctx.pending_len() + ctx.terminal_len(), 0);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_str("Desk");

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_str("Desk");

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_strings_do_not_alias() {
        let mut h1 = StateHash::new();
        h1.write_str("ab");
        h1.write_str("c");

        let mut h2 = StateHash::new();
        h2.write_str("a");
        h2.write_str("bc");

        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_sees_fill_state() {
        use crate::id::ItemId;
        use crate::item::InventoryItem;

        let before = order("Ann", &["Desk"]);
        let mut after = order("Ann", &["Desk"]);
        after.fulfill_against(&mut InventoryItem::new(ItemId(1), "Desk", 0, 1, "d"));

        let mut h1 = StateHash::new();
        h1.write_order(&before);
        let mut h2 = StateHash::new();
        h2.write_order(&after);
        assert_ne!(h1.finish(), h2.finish());
    }
}
