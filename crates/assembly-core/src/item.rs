use crate::id::ItemId;
use crate::record::{RecordError, Tokenizer};
use serde::{Deserialize, Serialize};

/// A named, quantity-bounded stock record that issues serial numbers.
///
/// Created once from a configuration record and mutated only by fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    next_serial: u64,
    quantity: u32,
    description: String,
}

impl InventoryItem {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        next_serial: u64,
        quantity: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            next_serial,
            quantity,
            description: description.into(),
        }
    }

    /// Parse `name, starting serial, quantity, description`.
    ///
    /// # Examples
    ///
    /// ```
    /// use assembly_core::id::ItemId;
    /// use assembly_core::item::InventoryItem;
    /// use assembly_core::record::Tokenizer;
    ///
    /// let item = InventoryItem::from_record(
    ///     ItemId(1),
    ///     "Desk,100000,5,Office desk",
    ///     &Tokenizer::new(','),
    /// )
    /// .unwrap();
    /// assert_eq!(item.name(), "Desk");
    /// assert_eq!(item.quantity(), 5);
    /// ```
    pub fn from_record(id: ItemId, record: &str, tokenizer: &Tokenizer) -> Result<Self, RecordError> {
        let mut fields = tokenizer.reader(record);
        let name = fields.required("name")?.to_string();
        let next_serial = fields.number("serial")?;
        let quantity = fields.number("quantity")?;
        let description = fields.required("description")?.to_string();
        fields.finish()?;

        Ok(Self {
            id,
            name,
            next_serial,
            quantity,
            description,
        })
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The serial number the next issuance will return.
    pub fn next_serial(&self) -> u64 {
        self.next_serial
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_exhausted(&self) -> bool {
        self.quantity == 0
    }

    /// Return the current serial number and advance the counter. Unbounded;
    /// this is an identity generator, not a stock check. Wraps at `u64::MAX`.
    pub fn issue_next_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        serial
    }

    /// Take one unit out of stock. No-op at zero.
    pub fn consume_one(&mut self) {
        self.quantity = self.quantity.saturating_sub(1);
    }
}
