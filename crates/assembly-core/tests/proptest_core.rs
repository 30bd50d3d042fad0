//! Property-based tests for the assembly line.
//!
//! Uses proptest to generate random stations, order books and link orders,
//! then verify stock, serial and order-conservation invariants hold.

use assembly_core::id::ItemId;
use assembly_core::item::InventoryItem;
use assembly_core::order::Order;
use assembly_core::pipeline::{Link, Pipeline};
use assembly_core::sim::SimulationContext;
use assembly_core::test_utils::chain;
use proptest::prelude::*;
use std::collections::HashSet;

// ===========================================================================
// Generators
// ===========================================================================

const NAMES: [&str; 6] = ["Desk", "Chair", "Lamp", "Shelf", "Rug", "Monitor"];

/// A station count, per-station stock, and orders whose items index into
/// the station names. Index `stations` names an item no station carries.
#[derive(Debug, Clone)]
struct Scenario {
    quantities: Vec<u32>,
    orders: Vec<Vec<usize>>,
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (1..=NAMES.len()).prop_flat_map(|stations| {
        (
            proptest::collection::vec(0..4u32, stations),
            proptest::collection::vec(
                proptest::collection::vec(0..=stations, 1..5),
                0..12,
            ),
        )
            .prop_map(|(quantities, orders)| Scenario { quantities, orders })
    })
}

impl Scenario {
    fn names(&self) -> &[&'static str] {
        &NAMES[..self.quantities.len()]
    }

    fn items(&self) -> Vec<InventoryItem> {
        self.names()
            .iter()
            .zip(&self.quantities)
            .enumerate()
            .map(|(i, (name, &qty))| {
                InventoryItem::new(ItemId(i as u32 + 1), *name, 1000 * (i as u64 + 1), qty, "prop")
            })
            .collect()
    }

    fn context(&self) -> SimulationContext {
        SimulationContext::with_orders(self.orders.iter().enumerate().map(|(i, wanted)| {
            let items = wanted
                .iter()
                .map(|&idx| self.names().get(idx).copied().unwrap_or("Widget"));
            Order::new(format!("Customer{i}"), "Prop", items).unwrap()
        }))
    }

    fn links(&self) -> Vec<Link> {
        chain(self.names())
    }

    /// Ticks that are always enough for the line to drain. Every tick with
    /// an order on the line fills a request or releases an order.
    fn tick_bound(&self) -> u64 {
        let requests: usize = self.orders.iter().map(Vec::len).sum();
        (requests + self.orders.len() * self.quantities.len() + 1) as u64
    }
}

fn outcome(ctx: &SimulationContext) -> (Vec<String>, Vec<String>) {
    (
        ctx.completed().map(|o| o.customer().to_string()).collect(),
        ctx.incomplete().map(|o| o.customer().to_string()).collect(),
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every order ends in exactly one terminal pool and nothing is left on
    /// the line.
    #[test]
    fn orders_are_conserved(scenario in arb_scenario()) {
        let mut ctx = scenario.context();
        let mut line = Pipeline::new(scenario.items(), &scenario.links(), &ctx).unwrap();

        let summary = line.run(&mut ctx, scenario.tick_bound());
        prop_assert!(summary.is_ok(), "line stalled: {:?}", summary);

        prop_assert_eq!(ctx.terminal_len(), scenario.orders.len());
        prop_assert_eq!(ctx.pending_len(), 0);
        prop_assert_eq!(line.in_flight(), 0);
        prop_assert!(ctx.completed().all(Order::is_complete));
        prop_assert!(!ctx.incomplete().any(Order::is_complete));
    }

    /// Stock only falls, serials only rise, and every unit drawn is paid for
    /// with exactly one serial.
    #[test]
    fn stock_and_serials_move_together(scenario in arb_scenario()) {
        let mut ctx = scenario.context();
        let mut line = Pipeline::new(scenario.items(), &scenario.links(), &ctx).unwrap();
        let initial = scenario.items();

        let mut previous: Vec<(u64, u32)> = initial
            .iter()
            .map(|item| (item.next_serial(), item.quantity()))
            .collect();

        for _ in 0..scenario.tick_bound() {
            let done = line.tick(&mut ctx);
            for ((stage, start), prev) in line.stations().zip(&initial).zip(previous.iter_mut()) {
                let item = stage.item();
                prop_assert!(item.quantity() <= prev.1);
                prop_assert!(item.next_serial() >= prev.0);
                prop_assert_eq!(
                    u64::from(start.quantity() - item.quantity()),
                    item.next_serial() - start.next_serial()
                );
                *prev = (item.next_serial(), item.quantity());
            }
            if done {
                break;
            }
        }
    }

    /// No serial number is ever handed out twice.
    #[test]
    fn serials_are_unique(scenario in arb_scenario()) {
        let mut ctx = scenario.context();
        let mut line = Pipeline::new(scenario.items(), &scenario.links(), &ctx).unwrap();
        line.run(&mut ctx, scenario.tick_bound()).unwrap();

        let mut seen = HashSet::new();
        for order in ctx.completed().chain(ctx.incomplete()) {
            for serial in order.items().iter().filter_map(|r| r.serial()) {
                prop_assert!(seen.insert(serial), "serial {} issued twice", serial);
            }
        }
    }

    /// The order links are listed in does not change which orders complete,
    /// and reordering recovers the chain.
    #[test]
    fn link_order_does_not_matter(
        (scenario, shuffled) in arb_scenario().prop_flat_map(|s| {
            let links = s.links();
            (Just(s), Just(links).prop_shuffle())
        }),
        reorder in any::<bool>(),
    ) {
        let mut ctx = scenario.context();
        let mut line = Pipeline::new(scenario.items(), &scenario.links(), &ctx).unwrap();
        line.run(&mut ctx, scenario.tick_bound()).unwrap();

        let mut shuffled_ctx = scenario.context();
        let mut shuffled_line = Pipeline::new(scenario.items(), &shuffled, &shuffled_ctx).unwrap();
        if reorder {
            shuffled_line.reorder_stations().unwrap();
            let names: Vec<_> = shuffled_line.active_line().map(|s| s.name()).collect();
            prop_assert_eq!(names.as_slice(), scenario.names());
        }
        shuffled_line.run(&mut shuffled_ctx, scenario.tick_bound()).unwrap();

        prop_assert_eq!(outcome(&ctx), outcome(&shuffled_ctx));
        prop_assert_eq!(line.snapshot_stations(), shuffled_line.snapshot_stations());
    }
}
