#![allow(dead_code)]

use appinsights_log_sink::{TelemetryClient, TraceEvent};
use std::sync::{Arc, Mutex};

/// Client that keeps every tracked event in memory.
#[derive(Clone, Default)]
pub struct RecordingClient {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl RecordingClient {
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TelemetryClient for RecordingClient {
    fn track(&self, event: TraceEvent) {
        self.events.lock().unwrap().push(event);
    }
}
