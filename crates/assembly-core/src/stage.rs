use crate::id::StageId;
use crate::item::InventoryItem;
use crate::order::{FulfillResult, Order};
use std::collections::VecDeque;

/// A station on the line: one inventory item, the FIFO queue of orders
/// currently resident here, and a non-owning link to the next stage.
///
/// Only the head order is ever examined; orders behind it wait their turn.
#[derive(Debug)]
pub struct Stage {
    item: InventoryItem,
    queue: VecDeque<Order>,
    next: Option<StageId>,
}

impl Stage {
    pub fn new(item: InventoryItem) -> Self {
        Self {
            item,
            queue: VecDeque::new(),
            next: None,
        }
    }

    pub fn item(&self) -> &InventoryItem {
        &self.item
    }

    pub fn name(&self) -> &str {
        self.item.name()
    }

    /// The successor stage, or `None` at the end of the line.
    pub fn next(&self) -> Option<StageId> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<StageId>) {
        self.next = next;
    }

    /// Append an order to the back of this stage's queue.
    pub fn push(&mut self, order: Order) {
        self.queue.push_back(order);
    }

    pub fn head(&self) -> Option<&Order> {
        self.queue.front()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.queue.iter()
    }

    /// Try to fill the head order's matching item from this stage's stock.
    /// Returns `None` when the queue is empty.
    pub fn attempt_fulfill_head(&mut self) -> Option<FulfillResult> {
        let head = self.queue.front_mut()?;
        Some(head.fulfill_against(&mut self.item))
    }

    /// Whether the head order has nothing more to gain here: its request for
    /// this stage's item is filled (or was never made), or stock is gone.
    pub fn is_head_done(&self) -> bool {
        self.queue.front().is_some_and(|order| {
            order.is_item_filled(self.item.name()) || self.item.is_exhausted()
        })
    }

    /// Remove and return the head order if it is done at this stage.
    pub fn release_head(&mut self) -> Option<Order> {
        if self.is_head_done() {
            self.queue.pop_front()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ItemId;

    fn stage(name: &str, quantity: u32) -> Stage {
        Stage::new(InventoryItem::new(ItemId(1), name, 1, quantity, "test"))
    }

    fn order(customer: &str, items: &[&str]) -> Order {
        Order::new(customer, "Office", items.iter().copied()).unwrap()
    }

    #[test]
    fn empty_queue_does_nothing() {
        let mut desk = stage("Desk", 1);
        assert_eq!(desk.attempt_fulfill_head(), None);
        assert!(!desk.is_head_done());
        assert!(desk.release_head().is_none());
    }

    #[test]
    fn fills_head_then_releases_it() {
        let mut desk = stage("Desk", 2);
        desk.push(order("Ann", &["Desk"]));
        desk.push(order("Bob", &["Desk"]));

        assert!(!desk.is_head_done());
        assert_eq!(
            desk.attempt_fulfill_head(),
            Some(FulfillResult::Filled { serial: 1 })
        );
        let released = desk.release_head().unwrap();
        assert_eq!(released.customer(), "Ann");
        assert!(released.is_complete());
        assert_eq!(desk.head().map(Order::customer), Some("Bob"));
    }

    #[test]
    fn only_head_is_filled() {
        let mut desk = stage("Desk", 5);
        desk.push(order("Ann", &["Desk"]));
        desk.push(order("Bob", &["Desk"]));
        desk.attempt_fulfill_head();
        desk.attempt_fulfill_head();
        let bob = desk.orders().nth(1).unwrap();
        assert!(!bob.is_complete());
        assert_eq!(desk.item().quantity(), 4);
    }

    #[test]
    fn unfilled_head_stays_while_stock_remains() {
        let mut desk = stage("Desk", 1);
        desk.push(order("Ann", &["Desk", "Desk"]));
        desk.attempt_fulfill_head();
        // One request filled, one still open, stock now zero.
        assert!(desk.is_head_done());

        let mut chair = stage("Chair", 3);
        chair.push(order("Bob", &["Chair", "Chair"]));
        chair.attempt_fulfill_head();
        assert!(!chair.is_head_done());
        assert!(chair.release_head().is_none());
        assert_eq!(chair.queue_len(), 1);
    }

    #[test]
    fn non_matching_order_is_done_immediately() {
        let mut lamp = stage("Lamp", 3);
        lamp.push(order("Ann", &["Desk"]));
        assert_eq!(lamp.attempt_fulfill_head(), Some(FulfillResult::NoMatch));
        assert!(lamp.release_head().is_some());
    }

    #[test]
    fn exhausted_stage_releases_unfilled_order() {
        let mut chair = stage("Chair", 0);
        chair.push(order("Ann", &["Chair"]));
        assert_eq!(chair.attempt_fulfill_head(), Some(FulfillResult::OutOfStock));
        let released = chair.release_head().unwrap();
        assert!(!released.is_complete());
    }

    #[test]
    fn next_link_round_trips() {
        let mut arena = slotmap::SlotMap::<StageId, ()>::with_key();
        let id = arena.insert(());
        let mut desk = stage("Desk", 1);
        assert_eq!(desk.next(), None);
        desk.set_next(Some(id));
        assert_eq!(desk.next(), Some(id));
    }
}
