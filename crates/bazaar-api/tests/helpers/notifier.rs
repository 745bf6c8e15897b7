//! Notifier that records every event for assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use bazaar_api::{Notifier, ProcessEvent};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, ProcessEvent)>>,
}

impl RecordingNotifier {
    /// Wait until at least `count` events arrived and return all of them.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, ProcessEvent)> {
        let poll = async {
            loop {
                {
                    let events = self.events.lock().await;
                    if events.len() >= count {
                        return events.clone();
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(15), poll)
            .await
            .expect("Timed out waiting for notifications")
    }

    pub async fn events(&self) -> Vec<(String, ProcessEvent)> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, event: ProcessEvent) {
        self.events.lock().await.push((recipient.to_string(), event));
    }
}
