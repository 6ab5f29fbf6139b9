//! Integration Tests for Paced Bulk Transfer
//!
//! A whole block of text is pushed through a session one line at a time,
//! each line waiting for its echo.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::io::Cursor;

use echoflow::transfer::{
    probe_mode, transfer_text, AbortOnTimeout, AckMatcher, AskOnTimeout, ContinueOnTimeout,
    PacingSettings, TimeoutContext, TimeoutDecision, TransferOptions,
};
use echoflow::{AuthMode, Error, PromptDetector, RemoteTarget, Transport};
use test_utils::{MockEvent, MockHost, MockTransport};

const SNIPPET: &str = "interface GigabitEthernet0/1\n description uplink to core\n switchport mode trunk\n no shutdown\nend";

async fn connected(host: MockHost) -> MockTransport {
    let mut transport = MockTransport::new().with_host("sw1", host);
    transport
        .connect(&RemoteTarget::new("sw1"), AuthMode::default())
        .await
        .unwrap();
    PromptDetector::default()
        .capture(&mut transport)
        .await
        .unwrap();
    transport
}

#[tokio::test]
async fn test_every_echoed_line_is_confirmed() {
    let mut transport = connected(MockHost::new("sw1(config)#")).await;

    let report = transfer_text(
        &mut transport,
        SNIPPET,
        &TransferOptions::default(),
        &mut AbortOnTimeout,
    )
    .await
    .unwrap();

    assert_eq!(report.total_lines, 5);
    assert_eq!(report.confirmed, 5);
    assert!(report.timed_out.is_empty());
    assert!(report.is_complete());
    assert_eq!(
        transport.sent(),
        vec![
            "interface GigabitEthernet0/1\r",
            " description uplink to core\r",
            " switchport mode trunk\r",
            " no shutdown\r",
            "end\r",
        ]
    );
}

#[tokio::test]
async fn test_abort_after_unechoed_line() {
    let host = MockHost::new("sw1(config)#").swallow(" switchport mode trunk");
    let mut transport = connected(host).await;

    let report = transfer_text(
        &mut transport,
        SNIPPET,
        &TransferOptions::default(),
        &mut AbortOnTimeout,
    )
    .await
    .unwrap();

    // Line 3 was never echoed: two confirmed, nothing sent after it
    assert_eq!(report.confirmed, 2);
    assert_eq!(report.aborted_at, Some(3));
    assert_eq!(report.failing_line.as_deref(), Some(" switchport mode trunk"));
    assert_eq!(transport.sent().len(), 3);
}

#[tokio::test]
async fn test_continue_sends_remaining_lines() {
    let host = MockHost::new("sw1(config)#").swallow(" switchport mode trunk");
    let mut transport = connected(host).await;

    let report = transfer_text(
        &mut transport,
        SNIPPET,
        &TransferOptions::default(),
        &mut ContinueOnTimeout,
    )
    .await
    .unwrap();

    assert_eq!(report.confirmed, 4);
    assert_eq!(report.timed_out, vec![3]);
    assert_eq!(transport.sent().len(), 5);
}

#[tokio::test]
async fn test_interactive_policy_answer_decides() {
    let host = MockHost::new("sw1(config)#").swallow(" no shutdown");
    let mut transport = connected(host).await;
    let mut prompt_text = Vec::new();
    let mut ask = AskOnTimeout::new(Cursor::new("n\n"), &mut prompt_text);

    let report = transfer_text(&mut transport, SNIPPET, &TransferOptions::default(), &mut ask)
        .await
        .unwrap();

    assert_eq!(report.aborted_at, Some(4));
    assert_eq!(report.confirmed, 3);
    drop(ask);
    assert!(String::from_utf8_lossy(&prompt_text).contains("Continue?"));
}

#[tokio::test]
async fn test_policy_sees_line_context() {
    let host = MockHost::new("sw1(config)#").swallow(" description uplink to core");
    let mut transport = connected(host).await;
    let mut seen = Vec::new();
    let mut policy = |ctx: &TimeoutContext<'_>| {
        seen.push((ctx.line_number, ctx.confirmed, ctx.line.to_string()));
        TimeoutDecision::Continue
    };

    transfer_text(&mut transport, SNIPPET, &TransferOptions::default(), &mut policy)
        .await
        .unwrap();

    assert_eq!(seen, vec![(2, 1, " description uplink to core".to_string())]);
}

#[tokio::test]
async fn test_crlf_text_with_blank_line() {
    let mut transport = connected(MockHost::new("sw1(config)#")).await;
    let text = "banner motd ^\r\n\r\nAuthorized access only\r\n^\r\n";

    let report = transfer_text(
        &mut transport,
        text,
        &TransferOptions::default(),
        &mut AbortOnTimeout,
    )
    .await
    .unwrap();

    // Trailing empty segment skipped, the blank line in the middle is sent
    assert_eq!(report.total_lines, 4);
    assert_eq!(report.confirmed, 4);
    assert_eq!(transport.sent()[1], "\r");
}

#[tokio::test]
async fn test_pattern_acknowledgment() {
    let mut transport = connected(MockHost::new("sw1(config-if)#")).await;
    let options = TransferOptions {
        pacing: PacingSettings {
            ack: AckMatcher::Pattern(")#".to_string()),
            ..PacingSettings::default()
        },
        ..TransferOptions::default()
    };

    let report = transfer_text(&mut transport, SNIPPET, &options, &mut AbortOnTimeout)
        .await
        .unwrap();
    assert_eq!(report.confirmed, 5);
}

#[tokio::test]
async fn test_mode_probe_before_paste() {
    let mut config_mode = connected(MockHost::new("sw1(config)#")).await;
    probe_mode(
        &mut config_mode,
        "\r",
        Some(")#"),
        std::time::Duration::from_secs(1),
    )
    .await
    .unwrap();
    assert_eq!(config_mode.events().last(), Some(&MockEvent::Send("\r".to_string())));

    let mut exec_mode = connected(MockHost::new("sw1#")).await;
    let result = probe_mode(
        &mut exec_mode,
        "\r",
        Some(")#"),
        std::time::Duration::from_secs(1),
    )
    .await;
    assert!(matches!(result, Err(Error::ModeCheckFailed { .. })));
}
