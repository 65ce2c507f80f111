//! Reusable test utilities:
//! - Scripted command runner (no real processes)
//! - Recording notifier
//! - Mock Pushover endpoint
//! - Configuration builder

// Allow unused code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fake_runner;
pub mod mock_pushover;
pub mod recording_notifier;
pub mod test_config;

pub use fake_runner::{FakeCommandRunner, Invocation};
pub use mock_pushover::MockPushoverServer;
pub use recording_notifier::RecordingNotifier;
pub use test_config::{test_config, SERVICES};
