use std::fs;

use chanmetric::analysis::{BatchOrchestrator, MetricSettings};
use chanmetric::config::Config;
use chanmetric::metric::default_evaluator;
use chanmetric::models::ChannelStatus;
use chanmetric::report::write_outputs;
use chanmetric::scanner::EventScanner;

const CONFIG: &str = r#"
[metric]
name = "pedestal"
channel_ranges = ["femb0", "apa9"]
min = 90.0
max = 110.0

[lines]
modulus = 2
pattern = [0]

[output]
hist_name = "hped_%CRNAME%_%STATUS%"
hist_title = "Pedestal %CRLABEL% run %RUN% event %EVENT%"
plot_file_name = "ped_%CRNAME%_%0EVENT%.md"
json_file_name = "ped_%CRNAME%.json"

[[catalog.ranges]]
name = "femb0"
first = 10
last = 13
label = "FEMB 0"

[status]
bad = [11]
noisy = [12]
"#;

fn event(event: u32, pedestals: [f32; 4]) -> String {
    let channels: Vec<String> = pedestals
        .iter()
        .enumerate()
        .map(|(i, p)| format!(r#"{{"channel": {}, "pedestal": {}}}"#, 10 + i, p))
        .collect();
    format!(
        r#"{{"run": 3, "subrun": 0, "event": {}, "channels": [{}]}}"#,
        event,
        channels.join(", ")
    )
}

#[test]
fn test_events_to_reports() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("e1.json"), event(1, [100.0, 102.0, 98.0, 1000.0])).unwrap();
    fs::write(input.path().join("e2.json"), event(2, [104.0, 100.0, 96.0, 100.0])).unwrap();

    let config: Config = toml::from_str(CONFIG).unwrap();
    config.validate().unwrap();

    let mut orchestrator = BatchOrchestrator::new(
        MetricSettings::from(&config),
        &config.range_catalog(),
        Box::new(default_evaluator()),
        Box::new(config.status_table()),
    );
    assert_eq!(orchestrator.unresolved(), ["apa9".to_string()]);

    let events = EventScanner::new(input.path()).load_all().unwrap();
    assert_eq!(events.len(), 2);

    let first = orchestrator.run(&events[0]).unwrap();
    let combined = &first.results[0];
    assert_eq!(combined.name, "hped_femb0_all");
    assert_eq!(combined.table.rows[3].value, 110.0);
    assert_eq!(combined.lines, vec![10, 12]);

    let second = orchestrator.run(&events[1]).unwrap();
    assert_eq!(second.results.len(), 4);
    assert_eq!(second.summary.event_count, 2);
    assert_eq!(second.summary.run_count, 1);

    // Channel 13: clamped 110 then 100.
    let row = &second.results[0].table.rows[3];
    assert_eq!(row.count, 2);
    assert_eq!(row.mean, 105.0);
    assert!((row.stderr - 5.0 / 2f64.sqrt()).abs() < 1e-9);

    let bad = &second.results[1];
    assert_eq!(bad.status, Some(ChannelStatus::Bad));
    assert_eq!(bad.title, "Pedestal FEMB 0 run 3 event 2");
    assert_eq!(bad.table.channels(), vec![11]);

    let written = write_outputs(&second, output.path()).unwrap();
    assert_eq!(written.len(), 2);

    let plot = fs::read_to_string(output.path().join("ped_femb0_000002.md")).unwrap();
    assert!(plot.contains("Status: noisy"));
    assert!(plot.contains("`apa9`"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("ped_femb0.json")).unwrap())
            .unwrap();
    assert_eq!(json["event"], 2);
    assert_eq!(json["results"].as_array().map(|r| r.len()), Some(4));
}
