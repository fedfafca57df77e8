use crate::event::TraceEvent;
use crate::severity::Severity;
use std::sync::Arc;

/// Destination for [`TraceEvent`]s produced by the translator.
///
/// Implementations own transport to the telemetry backend, including any
/// retry, batching or session handling. The translator only hands events
/// over and never waits for an acknowledgement.
pub trait TelemetryClient: Send + Sync {
    /// Create an empty trace event for the given message and severity.
    ///
    /// The default builds a plain [`TraceEvent`]; clients that stamp extra
    /// context on every item can override it.
    fn new_trace_event(&self, message: String, severity: Severity) -> TraceEvent {
        TraceEvent::new(message, severity)
    }

    /// Submit an event, fire-and-forget.
    ///
    /// Called from the relay's drain worker, or directly from caller
    /// threads when the translator is used without the relay, so it must
    /// not block for network I/O.
    fn track(&self, event: TraceEvent);
}

impl<T: TelemetryClient + ?Sized> TelemetryClient for Arc<T> {
    fn new_trace_event(&self, message: String, severity: Severity) -> TraceEvent {
        (**self).new_trace_event(message, severity)
    }

    fn track(&self, event: TraceEvent) {
        (**self).track(event)
    }
}
