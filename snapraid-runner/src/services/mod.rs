// File: snapraid-runner/src/services/mod.rs

pub mod controller;
pub mod notifier;

pub use controller::{LoopPolicy, ServiceAction, ServiceController};
pub use notifier::{Notifier, Priority, PushoverNotifier};
