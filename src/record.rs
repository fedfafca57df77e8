use crate::envelope;
use crate::value::FieldValue;
use std::collections::BTreeMap;

/// One decoded structured log record: field names mapped to values.
///
/// Records are decoded from a single `write` call's bytes and consumed
/// immediately by the translator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    /// Decode a serialized record, unwrapping the binary envelope first
    /// when present.
    ///
    /// **Returns**
    /// - `Ok(record)` if the bytes hold a key/value object.
    /// - `Err(DecodeError)` for empty, malformed, or non-object input.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value = if envelope::is_binary(raw) {
            envelope::decode_binary(raw).map_err(DecodeError::Binary)?
        } else {
            decode_json(raw)?
        };

        match value {
            FieldValue::Object(fields) => Ok(LogRecord { fields }),
            other => Err(DecodeError::NotAnObject(other.kind())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

/// Decode the first JSON value in `raw`. Anything after it, such as the
/// trailing newline a logger appends, is ignored.
pub(crate) fn decode_json(raw: &[u8]) -> Result<FieldValue, DecodeError> {
    let mut values = serde_json::Deserializer::from_slice(raw).into_iter::<serde_json::Value>();
    match values.next() {
        Some(Ok(value)) => Ok(FieldValue::from(value)),
        Some(Err(e)) => Err(DecodeError::Json(e)),
        None => Err(DecodeError::Empty),
    }
}

/// Error returned when a record cannot be decoded.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("empty log record")]
    Empty,

    #[error("malformed JSON log record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed binary log record: {0}")]
    Binary(String),

    #[error("log record is a {0}, expected an object")]
    NotAnObject(&'static str),
}
