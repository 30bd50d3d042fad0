//! Loads the bundled sample line and runs it end to end.

use assembly_core::order::Order;
use assembly_data::{LineConfig, Scenario};
use std::path::Path;

fn sample_config() -> LineConfig {
    let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/line.toml"));
    LineConfig::load(path).unwrap()
}

#[test]
fn sample_config_resolves_next_to_itself() {
    let config = sample_config();
    assert_eq!(config.stations.len(), 2);
    assert!(config.orders.path.ends_with("data/orders.txt"));
    assert!(config.orders.path.exists());
    assert_eq!(config.max_ticks, Some(200));
}

#[test]
fn sample_line_runs_to_completion() {
    let config = sample_config();
    let scenario = Scenario::load(&config).unwrap();
    assert_eq!(scenario.items.len(), 6);
    assert_eq!(scenario.orders.len(), 5);

    let (mut line, mut ctx) = scenario.build(config.reorder).unwrap();
    let names: Vec<_> = line.active_line().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec!["Desk", "Chair", "Lamp", "Monitor", "Keyboard", "Computer"]
    );

    let summary = line.run(&mut ctx, config.max_ticks.unwrap()).unwrap();
    assert_eq!(summary.ticks, 10);

    let completed: Vec<_> = ctx.completed().map(Order::customer).collect();
    let incomplete: Vec<_> = ctx.incomplete().map(Order::customer).collect();
    assert_eq!(completed, vec!["Alice", "Bob", "Charlie"]);
    assert_eq!(incomplete, vec!["Diana", "Evan"]);

    let stock: Vec<_> = line
        .snapshot_stations()
        .into_iter()
        .map(|s| (s.name, s.quantity))
        .collect();
    assert_eq!(
        stock,
        vec![
            ("Desk".to_string(), 1),
            ("Chair".to_string(), 0),
            ("Lamp".to_string(), 0),
            ("Monitor".to_string(), 0),
            ("Keyboard".to_string(), 4),
            ("Computer".to_string(), 0),
        ]
    );
}

#[test]
fn sample_line_is_deterministic() {
    let run = || {
        let config = sample_config();
        let (mut line, mut ctx) = Scenario::load(&config).unwrap().build(true).unwrap();
        line.run(&mut ctx, 200).unwrap();
        line.state_hash(&ctx)
    };
    assert_eq!(run(), run());
}
