use crate::client::TelemetryClient;
use crate::config::{MessagePolicy, SinkConfig};
use crate::encode::{JsonEncoder, PropertyEncoder};
use crate::event::TraceEvent;
use crate::record::{DecodeError, LogRecord};
use crate::severity::{severity_for_level, Severity};
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Property whose value is also used as the event's operation id.
pub const TRACE_ID_FIELD: &str = "traceId";

/// Synchronous writer that decodes each serialized log record, maps it to
/// a [`TraceEvent`] and hands it to a [`TelemetryClient`].
///
/// Every call is independent; the only shared state is the client, so a
/// translator can be cloned freely and used from many threads as long as
/// the client tolerates that.
#[derive(Clone)]
pub struct Translator {
    client: Arc<dyn TelemetryClient>,
    encoder: Arc<dyn PropertyEncoder>,
    config: SinkConfig,
}

impl Translator {
    /// Create a translator that submits to `client`.
    ///
    /// `config.instrumentation_key` is not used here; it is consumed by
    /// whoever builds the client.
    pub fn new(config: SinkConfig, client: Arc<dyn TelemetryClient>) -> Self {
        Self { client, encoder: Arc::new(JsonEncoder), config }
    }

    /// Replace the encoder used for non-text property values.
    pub fn with_encoder(mut self, encoder: Arc<dyn PropertyEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Decode `raw`, submit the resulting event and report how many bytes
    /// were consumed.
    ///
    /// **Returns**
    /// - `Ok(raw.len())` once the event has been handed to the client.
    /// - `Err(..)` if the record was rejected; nothing was tracked and no
    ///   bytes count as consumed.
    pub fn write_record(&self, raw: &[u8]) -> Result<usize, TranslateError> {
        let event = self.translate(raw)?;
        self.client.track(event);
        Ok(raw.len())
    }

    /// Build the [`TraceEvent`] for `raw` without submitting it.
    pub fn translate(&self, raw: &[u8]) -> Result<TraceEvent, TranslateError> {
        let names = &self.config.field_names;
        let mut fields = LogRecord::decode(raw)?.into_fields();

        let severity = match fields.remove(&names.level) {
            Some(FieldValue::Text(level)) => severity_for_level(&level, self.config.default_severity),
            _ => self.config.default_severity,
        };

        let message = match (fields.remove(&names.message), self.config.message_policy) {
            (Some(FieldValue::Text(message)), _) => message,
            (_, MessagePolicy::Lenient) => String::new(),
            (found, MessagePolicy::Strict) => {
                return Err(TranslateError::MissingMessage {
                    field: names.message.clone(),
                    found: found.as_ref().map(FieldValue::kind),
                })
            }
        };

        let mut event = self.client.new_trace_event(message, severity);
        if let Some(timestamp) = fields.remove(&names.timestamp).as_ref().and_then(parse_timestamp) {
            event.timestamp = timestamp;
        }

        let mut escalate = false;
        for (key, value) in fields {
            let text = match value {
                FieldValue::Text(text) | FieldValue::Number(text) => text,
                other @ (FieldValue::Null
                | FieldValue::Bool(_)
                | FieldValue::Array(_)
                | FieldValue::Object(_)) => match self.encoder.encode(&other) {
                    Ok(text) => text,
                    Err(e) => {
                        escalate = true;
                        format!("[error: {e}]")
                    }
                },
            };

            if key == TRACE_ID_FIELD {
                event.set_operation_id(text.clone());
            }
            event.properties.insert(self.config.key_case.apply(key), text);
        }

        if escalate {
            event.severity = Severity::Critical;
        }
        Ok(event)
    }
}

fn parse_timestamp(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Text(text) => DateTime::parse_from_rfc3339(text).ok().map(|ts| ts.with_timezone(&Utc)),
        FieldValue::Number(text) => DateTime::from_timestamp(text.parse().ok()?, 0),
        _ => None,
    }
}

impl io::Write for Translator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Translator {
    type Writer = Translator;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Error returned when a record is rejected by the translator.
#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("message field {field:?} is required, found {}", .found.unwrap_or("nothing"))]
    MissingMessage {
        field: String,
        found: Option<&'static str>,
    },
}

impl From<TranslateError> for io::Error {
    fn from(err: TranslateError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}
