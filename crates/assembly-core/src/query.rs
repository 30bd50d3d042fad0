//! Read-only query API for inspecting line state.
//!
//! Provides snapshot types that aggregate pipeline and pool state into
//! convenient views for reports and JSON output. All types are owned copies
//! -- no references into internal pipeline storage.

use crate::id::ItemId;
use crate::order::OrderSnapshot;
use crate::pipeline::{Pipeline, RunSummary};
use crate::sim::{SimulationContext, Ticks};
use crate::stage::Stage;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Station snapshot
// ---------------------------------------------------------------------------

/// A read-only view of one station and its stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSnapshot {
    /// Registration id, assigned in load order starting at 1.
    pub id: ItemId,
    pub name: String,
    /// Serial number the next fill will receive.
    pub next_serial: u64,
    /// Units left in stock.
    pub quantity: u32,
    pub description: String,
    /// Orders currently waiting at this station.
    pub queued: usize,
}

impl StationSnapshot {
    pub fn of(stage: &Stage) -> Self {
        let item = stage.item();
        Self {
            id: item.id(),
            name: item.name().to_string(),
            next_serial: item.next_serial(),
            quantity: item.quantity(),
            description: item.description().to_string(),
            queued: stage.queue_len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Link snapshot
// ---------------------------------------------------------------------------

/// One hop of the active line. `next == None` ends the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSnapshot {
    pub station: String,
    pub next: Option<String>,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Everything a finished (or paused) run has to show.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub ticks: Ticks,
    pub summary: Option<RunSummary>,
    pub line: Vec<LinkSnapshot>,
    pub stations: Vec<StationSnapshot>,
    pub pending: Vec<OrderSnapshot>,
    pub completed: Vec<OrderSnapshot>,
    pub incomplete: Vec<OrderSnapshot>,
    pub state_hash: u64,
}

impl RunReport {
    /// Capture the current state of `line` and `ctx`.
    pub fn collect(
        line: &Pipeline,
        ctx: &SimulationContext,
        summary: Option<RunSummary>,
    ) -> Self {
        Self {
            ticks: line.tick_count(),
            summary,
            line: line
                .links()
                .into_iter()
                .map(|(station, next)| LinkSnapshot {
                    station: station.to_string(),
                    next: next.map(str::to_string),
                })
                .collect(),
            stations: line.snapshot_stations(),
            pending: ctx.pending().map(|o| o.snapshot()).collect(),
            completed: ctx.completed().map(|o| o.snapshot()).collect(),
            incomplete: ctx.incomplete().map(|o| o.snapshot()).collect(),
            state_hash: line.state_hash(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn station_snapshots_follow_registration_order() {
        let ctx = SimulationContext::new();
        let line = Pipeline::new(
            office_items(),
            &links(&[("Lamp", Some("Desk")), ("Desk", None)]),
            &ctx,
        )
        .unwrap();

        let names: Vec<_> = line
            .snapshot_stations()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Desk", "Chair", "Lamp"]);
    }

    #[test]
    fn report_reflects_finished_run() {
        let mut ctx = SimulationContext::with_orders([order("Ann", &["Desk", "Chair"])]);
        let mut line = office_line(&ctx);
        let summary = line.run(&mut ctx, 10).unwrap();

        let report = RunReport::collect(&line, &ctx, Some(summary));
        assert_eq!(report.ticks, 3);
        assert_eq!(report.completed.len(), 1);
        assert!(report.pending.is_empty());
        assert_eq!(report.line[2], LinkSnapshot { station: "Lamp".into(), next: None });
        assert_eq!(report.stations[0].quantity, OFFICE_STOCK - 1);
        assert_eq!(report.stations[0].next_serial, 100_001);
    }

    #[test]
    fn report_serializes_to_json() {
        let ctx = SimulationContext::with_orders([order("Ann", &["Desk"])]);
        let line = office_line(&ctx);
        let json = serde_json::to_value(RunReport::collect(&line, &ctx, None)).unwrap();
        assert_eq!(json["pending"][0]["customer"], "Ann");
        assert_eq!(json["stations"][1]["name"], "Chair");
        assert!(json["summary"].is_null());
    }
}
