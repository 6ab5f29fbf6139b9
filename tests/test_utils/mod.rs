//! Test Utilities and Mocks
//!
//! Shared by the integration tests through `#[path]` includes.

#![allow(dead_code)]

pub mod mock_transport;

pub use mock_transport::{MockEvent, MockHost, MockTransport};

use std::time::Duration;

use echoflow::orchestrator::OrchestratorSettings;
use echoflow::PromptDetector;

/// Orchestrator settings that never sleep long
pub fn fast_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        prompt: PromptDetector::new(Duration::from_millis(1), Duration::from_secs(1)),
        disconnect_poll: Duration::from_millis(1),
        disconnect_timeout: Duration::from_millis(50),
        post_disconnect_delay: Duration::ZERO,
        ..OrchestratorSettings::default()
    }
}
