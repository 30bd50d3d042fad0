//! Customer orders and their per-item fulfillment state.
//!
//! An [`Order`] is a move-only resource: it implements neither `Clone` nor
//! `Copy`, so it can only ever sit in one queue at a time and its
//! fulfillment state can never be duplicated.
//!
//! ```compile_fail
//! use assembly_core::order::Order;
//! use assembly_core::record::Tokenizer;
//!
//! let order = Order::from_record("Ann,Office,Desk", &Tokenizer::default()).unwrap();
//! let copy = order.clone();
//! ```

use crate::item::InventoryItem;
use crate::record::{RecordError, Tokenizer};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Item requests
// ---------------------------------------------------------------------------

/// One named, fillable line of an order.
#[derive(Debug, PartialEq, Eq)]
pub struct ItemRequest {
    name: String,
    /// Set once the request has been filled.
    serial: Option<u64>,
}

impl ItemRequest {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_filled(&self) -> bool {
        self.serial.is_some()
    }

    /// Serial number assigned at fill time. `None` while unfilled.
    pub fn serial(&self) -> Option<u64> {
        self.serial
    }
}

/// Outcome of one [`Order::fulfill_against`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillResult {
    /// A matching request was filled with the given serial number.
    Filled { serial: u64 },
    /// A matching unfilled request exists but the item has no stock left.
    OutOfStock,
    /// No unfilled request matches the item.
    NoMatch,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A named customer request made of an ordered, fixed list of item requests.
#[derive(Debug, PartialEq, Eq)]
pub struct Order {
    customer: String,
    product: String,
    items: Box<[ItemRequest]>,
}

impl Order {
    /// Build an order. At least one item is required.
    pub fn new<I, S>(
        customer: impl Into<String>,
        product: impl Into<String>,
        items: I,
    ) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Box<[ItemRequest]> = items
            .into_iter()
            .map(|name| ItemRequest::new(name))
            .collect();
        if items.is_empty() {
            return Err(RecordError::NoItems);
        }
        Ok(Self {
            customer: customer.into(),
            product: product.into(),
            items,
        })
    }

    /// Parse `customer, product, item1, item2, ...`.
    pub fn from_record(record: &str, tokenizer: &Tokenizer) -> Result<Self, RecordError> {
        let mut fields = tokenizer.reader(record);
        let customer = fields.required("customer")?;
        let product = fields.required("product")?;

        let mut items = Vec::new();
        while fields.has_more() {
            items.push(fields.required("item")?);
        }

        Self::new(customer, product, items)
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Item requests in declaration order.
    pub fn items(&self) -> &[ItemRequest] {
        &self.items
    }

    /// True iff every item request is filled.
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(ItemRequest::is_filled)
    }

    /// True iff no unfilled request named `name` exists. Vacuously true
    /// when the order never asked for `name`.
    pub fn is_item_filled(&self, name: &str) -> bool {
        !self
            .items
            .iter()
            .any(|req| req.name == name && !req.is_filled())
    }

    /// Fill the first unfilled request matching `item`'s name, drawing one
    /// serial number and one unit of stock. At most one request is touched
    /// per call.
    pub fn fulfill_against(&mut self, item: &mut InventoryItem) -> FulfillResult {
        let Some(request) = self
            .items
            .iter_mut()
            .find(|req| req.name == item.name() && !req.is_filled())
        else {
            return FulfillResult::NoMatch;
        };

        if item.is_exhausted() {
            return FulfillResult::OutOfStock;
        }

        let serial = item.issue_next_serial();
        request.serial = Some(serial);
        item.consume_one();
        FulfillResult::Filled { serial }
    }

    /// Owned, serializable copy of the order's visible state.
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            customer: self.customer.clone(),
            product: self.product.clone(),
            complete: self.is_complete(),
            items: self
                .items
                .iter()
                .map(|req| ItemSnapshot {
                    name: req.name.clone(),
                    serial: req.serial,
                    filled: req.is_filled(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Read-only view of one order for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSnapshot {
    pub customer: String,
    pub product: String,
    pub complete: bool,
    pub items: Vec<ItemSnapshot>,
}

/// Read-only view of one item request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub serial: Option<u64>,
    pub filled: bool,
}
