use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a stage in the pipeline's stage arena.
    pub struct StageId;
}

/// Sequence-assigned identity of an inventory item. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Hands out [`ItemId`]s in registration order, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct ItemIdAllocator {
    last: u32,
}

impl ItemIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id. Ids are never reused.
    pub fn next_id(&mut self) -> ItemId {
        self.last += 1;
        ItemId(self.last)
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_equality() {
        assert_eq!(ItemId(3), ItemId(3));
        assert_ne!(ItemId(3), ItemId(4));
    }

    #[test]
    fn allocator_starts_at_one_and_counts_up() {
        let mut ids = ItemIdAllocator::new();
        assert_eq!(ids.next_id(), ItemId(1));
        assert_eq!(ids.next_id(), ItemId(2));
        assert_eq!(ids.next_id(), ItemId(3));
        assert_eq!(ids.allocated(), 3);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ItemId(1), "Desk");
        map.insert(ItemId(2), "Chair");
        assert_eq!(map[&ItemId(2)], "Chair");
    }
}
