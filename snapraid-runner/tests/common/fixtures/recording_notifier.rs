//! Notifier that records every message instead of sending it

use futures::future::BoxFuture;
use snapraid_runner::{Notifier, Priority};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub message: String,
    pub priority: Priority,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, message: &'a str, priority: Priority) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(SentNotification {
                message: message.to_string(),
                priority,
            });
        })
    }
}
