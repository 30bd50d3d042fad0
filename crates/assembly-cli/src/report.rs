//! Text rendering of stations, orders, the line and the tick trace.

use assembly_core::event::{Event, EventKind};
use assembly_core::item::InventoryItem;
use assembly_core::order::Order;
use assembly_core::pipeline::Pipeline;
use assembly_core::sim::SimulationContext;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Width of the section banners, borders included.
const BANNER_WIDTH: usize = 40;

/// A boxed section title.
pub fn banner(out: &mut impl Write, title: &str) -> io::Result<()> {
    let rule = "=".repeat(BANNER_WIDTH);
    let inner = BANNER_WIDTH - 2;
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "={title:^inner$}=")?;
    writeln!(out, "{rule}")
}

/// One line per station: `ID | NAME | SERIAL |`, plus `QTY | DESCRIPTION`
/// when `full`. Names are padded to the longest name shown.
pub fn write_stations<'a>(
    out: &mut impl Write,
    items: impl IntoIterator<Item = &'a InventoryItem>,
    full: bool,
) -> io::Result<()> {
    let items: Vec<_> = items.into_iter().collect();
    let width = items.iter().map(|i| i.name().len()).max().unwrap_or(1);

    for item in items {
        write!(
            out,
            "{:03} | {:<width$} | {:06} | ",
            item.id().0,
            item.name(),
            item.next_serial()
        )?;
        if full {
            write!(out, "{:>4} | {}", item.quantity(), item.description())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `customer - product`, then `[SERIAL] ITEM - FILLED` or `- TO BE FILLED`
/// for each item. Unfilled items show serial zero.
pub fn write_orders<'a>(
    out: &mut impl Write,
    orders: impl IntoIterator<Item = &'a Order>,
) -> io::Result<()> {
    let orders: Vec<_> = orders.into_iter().collect();
    let width = orders
        .iter()
        .flat_map(|o| o.items())
        .map(|r| r.name().len())
        .max()
        .unwrap_or(1);

    for order in orders {
        writeln!(out, "{} - {}", order.customer(), order.product())?;
        for request in order.items() {
            let status = if request.is_filled() {
                "FILLED"
            } else {
                "TO BE FILLED"
            };
            writeln!(
                out,
                "[{:06}] {:<width$} - {status}",
                request.serial().unwrap_or(0),
                request.name()
            )?;
        }
    }
    Ok(())
}

/// `A --> B` per active stage, `A --> End of Line` for the last one.
pub fn write_line(out: &mut impl Write, line: &Pipeline) -> io::Result<()> {
    for (station, next) in line.links() {
        writeln!(out, "{station} --> {}", next.unwrap_or("End of Line"))?;
    }
    Ok(())
}

/// The end-of-run summary printed in batch mode.
pub fn write_results(
    out: &mut impl Write,
    line: &Pipeline,
    ctx: &SimulationContext,
) -> io::Result<()> {
    writeln!(out, "\nCompleted Orders:")?;
    write_orders(out, ctx.completed())?;
    writeln!(out, "\nIncomplete Orders:")?;
    write_orders(out, ctx.incomplete())?;
    writeln!(out, "\nRemaining Inventory:")?;
    write_stations(out, line.stations().map(|s| s.item()), true)
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// Collects the per-tick trace lines delivered by a pipeline's event bus.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Trace {
    /// Subscribe to the trace events of `line`.
    pub fn attach(line: &mut Pipeline) -> Self {
        let trace = Self::default();
        for kind in EventKind::TRACE {
            let lines = Rc::clone(&trace.lines);
            line.event_bus.on_passive(
                kind,
                Box::new(move |event: &Event| lines.borrow_mut().push(event.to_string())),
            );
        }
        trace
    }

    /// Write and forget every line collected so far.
    pub fn flush(&self, out: &mut impl Write) -> io::Result<()> {
        for line in self.lines.borrow_mut().drain(..) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}
