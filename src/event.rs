use crate::severity::Severity;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Context tag carrying the operation (correlation) identifier.
pub const OPERATION_ID_TAG: &str = "ai.operation.id";

/// A trace telemetry item produced from one log record.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub message: String,
    pub severity: Severity,
    /// Open-ended metadata; every value is text.
    pub properties: BTreeMap<String, String>,
    /// Context tags such as [`OPERATION_ID_TAG`].
    pub tags: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl TraceEvent {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        TraceEvent {
            message: message.into(),
            severity,
            properties: BTreeMap::new(),
            tags: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.tags.get(OPERATION_ID_TAG).map(String::as_str)
    }

    pub fn set_operation_id(&mut self, id: impl Into<String>) {
        self.tags.insert(OPERATION_ID_TAG.to_string(), id.into());
    }
}
