use crate::client::TelemetryClient;
use crate::event::TraceEvent;

/// A client that simply drops all events.
///
/// Useful for measuring the overhead of decoding and relaying without any
/// network I/O, and for tests that only care about write results.
#[derive(Clone, Default)]
pub struct NoopClient;

impl TelemetryClient for NoopClient {
    fn track(&self, _event: TraceEvent) {}
}
