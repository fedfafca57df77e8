use crate::value::FieldValue;
use std::error::Error;

/// Turns a non-text field value (object, array, bool, null) into the text
/// stored in a telemetry property.
pub trait PropertyEncoder: Send + Sync {
    /// **Returns**
    /// - `Ok(text)` with the encoded value.
    /// - `Err(..)` if the value cannot be encoded. The translator then
    ///   stores an error placeholder and escalates the event to Critical.
    fn encode(&self, value: &FieldValue) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// Compact JSON encoding with object keys in sorted order.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl PropertyEncoder for JsonEncoder {
    fn encode(&self, value: &FieldValue) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(serde_json::to_string(value)?)
    }
}
