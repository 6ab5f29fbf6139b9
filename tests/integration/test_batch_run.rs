//! Integration Tests for Batch Runs
//!
//! Many targets, one terminal view: each target is connected, worked and
//! fully disconnected before the next one starts.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::fs;

use echoflow::orchestrator::{SUCCESS_MESSAGE, SUMMARY_FILE};
use echoflow::{BatchOrchestrator, CommandSpec, FileSink, MemorySink, RemoteTarget, RunReport};
use tempfile::TempDir;
use test_utils::{fast_settings, MockEvent, MockHost, MockTransport};

fn targets(names: &[&str]) -> Vec<RemoteTarget> {
    names.iter().map(|name| RemoteTarget::new(*name)).collect()
}

fn commands() -> CommandSpec {
    CommandSpec::new(["show version | i ptime", "show inventory"])
}

fn router(name: &str) -> MockHost {
    MockHost::new(&format!("{}#", name))
        .respond("show version | i ptime", &format!("{} uptime is 5 weeks", name))
        .respond("show inventory", "NAME: \"Chassis\", DESCR: \"ISR4331\"")
}

fn three_hosts() -> MockTransport {
    MockTransport::new()
        .with_host("hostA", router("hostA"))
        .with_host("badhost", MockHost::refusing("Connection refused"))
        .with_host("hostC", router("hostC"))
}

#[tokio::test]
async fn test_failed_target_is_recorded_and_skipped() {
    let mut transport = three_hosts();
    let mut orchestrator = BatchOrchestrator::new(fast_settings(), MemorySink::new());

    let report = orchestrator
        .run(
            &mut transport,
            &targets(&["hostA", "badhost", "hostC"]),
            &commands(),
        )
        .await
        .unwrap();

    assert_eq!(report.targets_processed, 3);
    assert_eq!(report.results, 4);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].target.as_str(), "badhost");
    assert_eq!(
        report.errors[0].message,
        "Error connecting to badhost: Connection refused"
    );
    assert!(!report.is_success());
    assert!(report
        .summary()
        .ends_with("\n*** Error connecting to badhost: Connection refused"));

    let sink = orchestrator.into_sink();
    let tags: Vec<(String, String)> = sink
        .results
        .iter()
        .map(|r| (r.target.to_string(), r.ordinal_tag()))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("hostA".to_string(), "01".to_string()),
            ("hostA".to_string(), "02".to_string()),
            ("hostC".to_string(), "01".to_string()),
            ("hostC".to_string(), "02".to_string()),
        ]
    );
    assert_eq!(sink.results[2].output, "hostC uptime is 5 weeks");
    assert_eq!(sink.report.as_ref().map(RunReport::is_success), Some(false));
}

#[tokio::test]
async fn test_all_targets_succeed() {
    let mut transport = MockTransport::new()
        .with_host("hostA", router("hostA"))
        .with_host("hostB", router("hostB"));
    let mut orchestrator = BatchOrchestrator::new(fast_settings(), MemorySink::new());

    let report = orchestrator
        .run(&mut transport, &targets(&["hostA", "hostB"]), &commands())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.summary(), SUCCESS_MESSAGE);
    assert!(report.finished_at.is_some());
}

#[tokio::test]
async fn test_next_connect_waits_for_disconnect() {
    let mut transport = three_hosts().linger(3);
    let mut orchestrator = BatchOrchestrator::new(fast_settings(), MemorySink::new());

    orchestrator
        .run(&mut transport, &targets(&["hostA", "hostC"]), &commands())
        .await
        .unwrap();

    let events = transport.events();
    let disconnect = events
        .iter()
        .position(|e| *e == MockEvent::Disconnect("hostA".to_string()))
        .unwrap();
    let next_connect = events
        .iter()
        .position(|e| *e == MockEvent::Connect("hostC".to_string()))
        .unwrap();

    assert!(disconnect < next_connect);
    assert_eq!(
        &events[disconnect + 1..next_connect],
        &[
            MockEvent::IsConnected(true),
            MockEvent::IsConnected(true),
            MockEvent::IsConnected(true),
            MockEvent::IsConnected(false),
        ]
    );
}

#[tokio::test]
async fn test_file_sink_layout() {
    let dir = TempDir::new().unwrap();
    let mut transport = three_hosts();
    let mut orchestrator = BatchOrchestrator::new(fast_settings(), FileSink::new(dir.path()));

    let report = orchestrator
        .run(
            &mut transport,
            &targets(&["hostA", "badhost", "hostC"]),
            &commands(),
        )
        .await
        .unwrap();

    let first = fs::read_to_string(dir.path().join("hostA").join("Command_01_Results.txt")).unwrap();
    assert!(first.starts_with("Results of command: show version | i ptime"));
    assert!(first.contains("hostA uptime is 5 weeks"));

    let second = fs::read_to_string(dir.path().join("hostC").join("Command_02_Results.txt")).unwrap();
    assert!(second.starts_with("Results of command: show inventory"));
    assert!(!dir.path().join("badhost").exists());

    let summary: RunReport =
        serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(summary.run_id, report.run_id);
    assert_eq!(summary.errors.len(), 1);
}
