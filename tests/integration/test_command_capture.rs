//! Integration Tests for Command Capture
//!
//! Output of a command is everything between its echo and the next prompt.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use echoflow::session::{CommandRunner, RunnerSettings};
use echoflow::{AuthMode, Error, PromptDetector, RemoteTarget, Transport};
use test_utils::{MockHost, MockTransport};

async fn connect(transport: &mut MockTransport, name: &str) {
    transport
        .connect(&RemoteTarget::new(name), AuthMode::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_output_excludes_command_and_prompt() {
    let host = MockHost::new("R1#").raw_reply("show clock", "R1# show clock\r\n*10:00:00.000 UTC Mon Jan 1 2024\nR1#");
    let mut transport = MockTransport::new().with_host("R1", host);
    connect(&mut transport, "R1").await;

    let prompt = PromptDetector::default().capture(&mut transport).await.unwrap();
    assert_eq!(prompt.as_str(), "R1#");

    let runner = CommandRunner::new(&prompt, RunnerSettings::default());
    let result = runner.run(&mut transport, "show clock").await.unwrap();

    assert_eq!(result.output, "*10:00:00.000 UTC Mon Jan 1 2024");
    assert!(!result.output.contains("show clock"));
}

#[tokio::test]
async fn test_banner_is_not_captured() {
    let host = MockHost::new("edge1>")
        .banner("*** Authorized use only ***\r\n\r\n")
        .respond("show version | i ptime", "edge1 uptime is 12 weeks, 3 days");
    let mut transport = MockTransport::new().with_host("edge1", host);
    connect(&mut transport, "edge1").await;

    let prompt = PromptDetector::default().capture(&mut transport).await.unwrap();
    assert_eq!(prompt.as_str(), "edge1>");

    let runner = CommandRunner::new(&prompt, RunnerSettings::default());
    let result = runner
        .run(&mut transport, "  show version | i ptime  ")
        .await
        .unwrap();

    assert_eq!(result.command, "show version | i ptime");
    assert_eq!(result.output, "edge1 uptime is 12 weeks, 3 days");
}

#[tokio::test]
async fn test_consecutive_commands_stay_separated() {
    let host = MockHost::new("R1#")
        .respond("show clock", "10:00 UTC")
        .respond("show users", "    Line       User\r\n*  1 vty 0     admin\r\n");
    let mut transport = MockTransport::new().with_host("R1", host);
    connect(&mut transport, "R1").await;
    let prompt = PromptDetector::default().capture(&mut transport).await.unwrap();
    let runner = CommandRunner::new(&prompt, RunnerSettings::default());

    let first = runner.run(&mut transport, "show clock").await.unwrap();
    let second = runner.run(&mut transport, "show users").await.unwrap();

    assert_eq!(first.output, "10:00 UTC");
    assert_eq!(second.output, "Line       User\r\n*  1 vty 0     admin");
}

#[tokio::test]
async fn test_escape_sequences_stripped_on_request() {
    let host = MockHost::new("$").respond("ls", "\x1b[0m\x1b[01;34mbackups\x1b[0m  notes.txt");
    let mut transport = MockTransport::new().with_host("box", host);
    connect(&mut transport, "box").await;
    let prompt = PromptDetector::default().capture(&mut transport).await.unwrap();

    let settings = RunnerSettings {
        ignore_escapes: true,
        ..RunnerSettings::default()
    };
    let result = CommandRunner::new(&prompt, settings)
        .run(&mut transport, "ls")
        .await
        .unwrap();
    assert_eq!(result.output, "backups  notes.txt");
}

#[tokio::test]
async fn test_prompt_never_returning_is_timeout() {
    let host = MockHost::new("R1#").respond("copy run start", "Destination filename [startup-config]?");
    let mut transport = MockTransport::new()
        .with_host("R1", host)
        .hang_on("copy run start");
    connect(&mut transport, "R1").await;
    let prompt = PromptDetector::default().capture(&mut transport).await.unwrap();

    let result = CommandRunner::new(&prompt, RunnerSettings::default())
        .run(&mut transport, "copy run start")
        .await;
    assert!(matches!(result, Err(Error::CommandTimeout { .. })));
}

#[tokio::test]
async fn test_unechoed_command_is_abandoned() {
    let host = MockHost::new("R1#").swallow("show inventory");
    let mut transport = MockTransport::new().with_host("R1", host);
    connect(&mut transport, "R1").await;
    let prompt = PromptDetector::default().capture(&mut transport).await.unwrap();

    let result = CommandRunner::new(&prompt, RunnerSettings::default())
        .run(&mut transport, "show inventory")
        .await;
    match result {
        Err(Error::CommandAbandoned { command, .. }) => assert_eq!(command, "show inventory"),
        other => panic!("expected abandoned command, got {:?}", other),
    }
}
