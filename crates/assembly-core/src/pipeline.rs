//! The assembly line: stage arena, chain topology and the tick loop.
//!
//! # Construction
//!
//! [`Pipeline::new`] registers every inventory item as a [`Stage`] in a
//! slot-map arena, then applies the topology links in order. Each link
//! `from -> to` sets `from`'s successor; unknown names are dropped. Stages
//! named by any link form the active line, in first-seen order. The entry
//! stage is the first active stage that no other active stage points at.
//! Zero or several such stages, cycles, and stages the entry cannot reach
//! are all rejected here, before any tick runs.
//!
//! # Tick
//!
//! Each call to [`Pipeline::tick`] runs:
//!
//! 1. **Admit** -- move the head of the pending pool onto the entry stage.
//! 2. **Fill** -- every active stage, in line order, tries to fill its head
//!    order from its own stock.
//! 3. **Advance** -- every active stage, in line order, releases its head
//!    order if it is done there. Released orders go to the next stage or,
//!    at the end of the line, to the completed / incomplete pool. Transfers
//!    land in their destination queue after the whole pass, so an order
//!    moves at most one stage per tick.
//! 4. **Deliver** -- buffered events go out to subscribers.

use crate::event::{Event, EventBus};
use crate::id::StageId;
use crate::item::InventoryItem;
use crate::order::{FulfillResult, Order};
use crate::query::StationSnapshot;
use crate::record::{RecordError, Tokenizer};
use crate::sim::{SimulationContext, StateHash, Terminal, Ticks};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural problems with the configured chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("duplicate station name '{name}'")]
    DuplicateStation { name: String },
    #[error("topology names no known station")]
    EmptyLine,
    #[error("every stage has a predecessor; the line has no entry")]
    NoEntry,
    #[error("ambiguous entry: stages {candidates:?} have no predecessor")]
    AmbiguousEntry { candidates: Vec<String> },
    #[error("cycle detected at stage '{stage}'")]
    Cycle { stage: String },
    #[error("stage '{stage}' is not reachable from entry '{entry}'")]
    Unreachable { stage: String, entry: String },
}

/// A bounded run ended before every order reached a terminal pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("line did not drain within {ticks} ticks ({terminal} of {expected} orders finished)")]
    Stalled {
        ticks: Ticks,
        terminal: usize,
        expected: usize,
    },
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// One topology record: `from` feeds `to`, or ends the line when `to` is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: String,
    pub to: Option<String>,
}

impl Link {
    pub fn new(from: impl Into<String>, to: Option<&str>) -> Self {
        Self {
            from: from.into(),
            to: to.map(str::to_string),
        }
    }

    /// Parse `station[,next station]`.
    pub fn from_record(record: &str, tokenizer: &Tokenizer) -> Result<Self, RecordError> {
        let mut fields = tokenizer.reader(record);
        let from = fields.required("station")?.to_string();
        let to = fields
            .next_field()?
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        fields.finish()?;
        Ok(Self { from, to })
    }
}

/// Result of a run that drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Ticks executed by this run.
    pub ticks: Ticks,
    pub completed: usize,
    pub incomplete: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The line manager: owns every stage and drives the simulation.
#[derive(Debug)]
pub struct Pipeline {
    stages: SlotMap<StageId, Stage>,
    /// Every registered stage, in registration order.
    registration: Vec<StageId>,
    by_name: HashMap<String, StageId>,
    /// Stages taking part in the simulation, in evaluation order.
    active: Vec<StageId>,
    entry: StageId,
    /// Orders that must reach a terminal pool before the run is finished.
    expected_orders: usize,
    tick: Ticks,

    /// Typed event bus for simulation events.
    pub event_bus: EventBus,
}

impl Pipeline {
    /// Build the line from the registered items and topology links.
    ///
    /// The number of orders held by `ctx` at this point is the target of the
    /// completion check in [`tick`](Self::tick).
    ///
    /// # Examples
    ///
    /// ```
    /// use assembly_core::id::ItemId;
    /// use assembly_core::item::InventoryItem;
    /// use assembly_core::order::Order;
    /// use assembly_core::pipeline::{Link, Pipeline};
    /// use assembly_core::sim::SimulationContext;
    ///
    /// let items = vec![
    ///     InventoryItem::new(ItemId(1), "Desk", 1, 1, "Office desk"),
    ///     InventoryItem::new(ItemId(2), "Chair", 1, 1, "Office chair"),
    /// ];
    /// let links = [Link::new("Desk", Some("Chair")), Link::new("Chair", None)];
    /// let mut ctx = SimulationContext::with_orders([
    ///     Order::new("Ann", "Office", ["Desk", "Chair"]).unwrap(),
    /// ]);
    ///
    /// let mut line = Pipeline::new(items, &links, &ctx).unwrap();
    /// while !line.tick(&mut ctx) {}
    /// assert_eq!(ctx.completed_len(), 1);
    /// ```
    pub fn new(
        items: Vec<InventoryItem>,
        links: &[Link],
        ctx: &SimulationContext,
    ) -> Result<Self, TopologyError> {
        let mut stages = SlotMap::with_capacity_and_key(items.len());
        let mut registration = Vec::with_capacity(items.len());
        let mut by_name = HashMap::with_capacity(items.len());

        for item in items {
            if by_name.contains_key(item.name()) {
                return Err(TopologyError::DuplicateStation {
                    name: item.name().to_string(),
                });
            }
            let name = item.name().to_string();
            let id = stages.insert(Stage::new(item));
            registration.push(id);
            by_name.insert(name, id);
        }

        let mut active: Vec<StageId> = Vec::new();
        for link in links {
            let Some(&from) = by_name.get(&link.from) else {
                tracing::warn!(station = %link.from, "topology names unknown station; link dropped");
                continue;
            };
            let to = match link.to.as_deref() {
                Some(name) => {
                    let resolved = by_name.get(name).copied();
                    if resolved.is_none() {
                        tracing::warn!(station = %name, "topology names unknown successor; treating as end of line");
                    }
                    resolved
                }
                None => None,
            };

            for id in std::iter::once(from).chain(to) {
                if !active.contains(&id) {
                    active.push(id);
                }
            }
            stages[from].set_next(to);
        }

        let entry = find_entry(&stages, &active)?;

        let line = Self {
            event_bus: EventBus::new(EventBus::DEFAULT_CAPACITY.max(active.len() * 4 + 8)),
            stages,
            registration,
            by_name,
            active,
            entry,
            expected_orders: ctx.pending_len() + ctx.terminal_len(),
            tick: 0,
        };
        line.walk_chain()?;

        tracing::debug!(
            stages = line.active.len(),
            entry = line.entry().name(),
            orders = line.expected_orders,
            "assembly line configured"
        );
        Ok(line)
    }

    /// Follow successor links from the entry stage to the end of the line.
    fn walk_chain(&self) -> Result<Vec<StageId>, TopologyError> {
        let mut chain = Vec::with_capacity(self.active.len());
        let mut seen = HashSet::with_capacity(self.active.len());
        let mut current = Some(self.entry);

        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(TopologyError::Cycle {
                    stage: self.stages[id].name().to_string(),
                });
            }
            chain.push(id);
            current = self.stages[id].next();
        }

        if let Some(&missing) = self.active.iter().find(|id| !seen.contains(id)) {
            return Err(TopologyError::Unreachable {
                stage: self.stages[missing].name().to_string(),
                entry: self.entry().name().to_string(),
            });
        }

        Ok(chain)
    }

    /// Replace the first-seen ordering of the active line with true chain
    /// order, walking forward from the entry stage.
    pub fn reorder_stations(&mut self) -> Result<(), TopologyError> {
        self.active = self.walk_chain()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Advance the simulation by one tick. Returns `true` once every order
    /// counted at construction has reached a terminal pool.
    pub fn tick(&mut self, ctx: &mut SimulationContext) -> bool {
        self.tick += 1;
        let tick = self.tick;
        self.event_bus.emit(Event::TickStarted { tick });

        self.admit(ctx);
        self.fill_pass();
        self.advance_pass(ctx);

        self.event_bus.deliver();
        self.is_finished(ctx)
    }

    /// Tick until the line drains, giving up after `max_ticks`. A line that
    /// has already drained returns at once, even with `max_ticks == 0`.
    pub fn run(
        &mut self,
        ctx: &mut SimulationContext,
        max_ticks: Ticks,
    ) -> Result<RunSummary, RunError> {
        let start = self.tick;
        while !self.is_finished(ctx) {
            if self.tick - start >= max_ticks {
                tracing::warn!(max_ticks, "assembly line did not drain");
                return Err(RunError::Stalled {
                    ticks: max_ticks,
                    terminal: ctx.terminal_len(),
                    expected: self.expected_orders,
                });
            }
            self.tick(ctx);
        }

        let summary = RunSummary {
            ticks: self.tick - start,
            completed: ctx.completed_len(),
            incomplete: ctx.incomplete_len(),
        };
        tracing::info!(
            ticks = summary.ticks,
            completed = summary.completed,
            incomplete = summary.incomplete,
            "assembly line drained"
        );
        Ok(summary)
    }

    /// Whether every expected order sits in a terminal pool.
    pub fn is_finished(&self, ctx: &SimulationContext) -> bool {
        ctx.terminal_len() == self.expected_orders
    }

    fn admit(&mut self, ctx: &mut SimulationContext) {
        let Some(order) = ctx.pop_pending() else {
            return;
        };
        let entry = &mut self.stages[self.entry];
        tracing::debug!(customer = order.customer(), stage = entry.name(), "order admitted");
        self.event_bus.emit(Event::OrderAdmitted {
            customer: order.customer().to_string(),
            product: order.product().to_string(),
            stage: entry.name().to_string(),
            tick: self.tick,
        });
        entry.push(order);
    }

    fn fill_pass(&mut self) {
        let Self {
            stages,
            active,
            event_bus,
            tick,
            ..
        } = self;

        for &id in active.iter() {
            let stage = &mut stages[id];
            let Some(result) = stage.attempt_fulfill_head() else {
                continue;
            };
            let Some(order) = stage.head() else {
                continue;
            };
            let customer = order.customer().to_string();
            let product = order.product().to_string();
            let item = stage.name().to_string();

            match result {
                FulfillResult::Filled { serial } => event_bus.emit(Event::ItemFilled {
                    customer,
                    product,
                    item,
                    serial,
                    tick: *tick,
                }),
                FulfillResult::OutOfStock => event_bus.emit(Event::ItemOutOfStock {
                    customer,
                    product,
                    item,
                    tick: *tick,
                }),
                FulfillResult::NoMatch => {}
            }
        }
    }

    fn advance_pass(&mut self, ctx: &mut SimulationContext) {
        let mut transfers: Vec<(StageId, StageId, Order)> = Vec::new();

        for i in 0..self.active.len() {
            let id = self.active[i];
            if let Some(transfer) = self.attempt_advance_head(id, ctx) {
                transfers.push(transfer);
            }
        }

        for (from, to, order) in transfers {
            tracing::debug!(
                customer = order.customer(),
                from = self.stages[from].name(),
                to = self.stages[to].name(),
                "order moved"
            );
            self.event_bus.emit(Event::OrderMoved {
                customer: order.customer().to_string(),
                product: order.product().to_string(),
                from: self.stages[from].name().to_string(),
                to: self.stages[to].name().to_string(),
                tick: self.tick,
            });
            self.stages[to].push(order);
        }
    }

    /// Release the head of stage `id` if it is done there. Orders leaving
    /// the last stage are routed to a terminal pool immediately; others are
    /// returned as a pending transfer.
    fn attempt_advance_head(
        &mut self,
        id: StageId,
        ctx: &mut SimulationContext,
    ) -> Option<(StageId, StageId, Order)> {
        let stage = &mut self.stages[id];
        let order = stage.release_head()?;

        if let Some(next) = stage.next() {
            return Some((id, next, order));
        }

        let customer = order.customer().to_string();
        let product = order.product().to_string();
        let tick = self.tick;
        let event = match ctx.route_terminal(order) {
            Terminal::Completed => Event::OrderCompleted {
                customer,
                product,
                tick,
            },
            Terminal::Incomplete => Event::OrderIncomplete {
                customer,
                product,
                tick,
            },
        };
        tracing::debug!(%event, "order left the line");
        self.event_bus.emit(event);
        None
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Ticks run so far.
    pub fn tick_count(&self) -> Ticks {
        self.tick
    }

    pub fn entry(&self) -> &Stage {
        &self.stages[self.entry]
    }

    pub fn stage_by_name(&self, name: &str) -> Option<&Stage> {
        self.by_name.get(name).and_then(|&id| self.stages.get(id))
    }

    /// Active stages in evaluation order.
    pub fn active_line(&self) -> impl ExactSizeIterator<Item = &Stage> {
        self.active.iter().map(|&id| &self.stages[id])
    }

    /// Every registered station, in registration order.
    pub fn stations(&self) -> impl ExactSizeIterator<Item = &Stage> {
        self.registration.iter().map(|&id| &self.stages[id])
    }

    /// `(stage, successor)` name pairs in active-line order.
    pub fn links(&self) -> Vec<(&str, Option<&str>)> {
        self.active_line()
            .map(|stage| {
                let next = stage.next().map(|id| self.stages[id].name());
                (stage.name(), next)
            })
            .collect()
    }

    /// Orders currently resident in stage queues.
    pub fn in_flight(&self) -> usize {
        self.stages.values().map(Stage::queue_len).sum()
    }

    /// Station snapshots in registration order.
    pub fn snapshot_stations(&self) -> Vec<StationSnapshot> {
        self.stations().map(StationSnapshot::of).collect()
    }

    /// Deterministic hash of inventory, stage queues and order pools.
    pub fn state_hash(&self, ctx: &SimulationContext) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.tick);
        for stage in self.stations() {
            let item = stage.item();
            h.write_str(item.name());
            h.write_u64(item.next_serial());
            h.write_u32(item.quantity());
            h.write_u64(stage.queue_len() as u64);
            for order in stage.orders() {
                h.write_order(order);
            }
        }
        for pool in [
            ctx.pending().collect::<Vec<_>>(),
            ctx.completed().collect(),
            ctx.incomplete().collect(),
        ] {
            h.write_u64(pool.len() as u64);
            for order in pool {
                h.write_order(order);
            }
        }
        h.finish()
    }
}

/// The first active stage with no predecessor among the active stages.
fn find_entry(
    stages: &SlotMap<StageId, Stage>,
    active: &[StageId],
) -> Result<StageId, TopologyError> {
    if active.is_empty() {
        return Err(TopologyError::EmptyLine);
    }

    let targets: HashSet<StageId> = active.iter().filter_map(|&id| stages[id].next()).collect();
    let candidates: Vec<StageId> = active
        .iter()
        .copied()
        .filter(|id| !targets.contains(id))
        .collect();

    match candidates.as_slice() {
        [] => Err(TopologyError::NoEntry),
        [entry] => Ok(*entry),
        _ => Err(TopologyError::AmbiguousEntry {
            candidates: candidates
                .iter()
                .map(|&id| stages[id].name().to_string())
                .collect(),
        }),
    }
}
