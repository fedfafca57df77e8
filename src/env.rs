//! Environment variable names used to configure the writers from services.
//!
//! These are purely helpers; the core writer types remain decoupled from
//! environment access.

/// Application Insights connection string,
/// e.g. `InstrumentationKey=...;IngestionEndpoint=https://...`.
pub const CONNECTION_STRING_ENV: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";

/// Bare instrumentation key, used when no connection string is set.
pub const INSTRUMENTATION_KEY_ENV: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";

/// Capacity of the async relay buffer.
pub const LOG_SINK_BUFFER_CAPACITY_ENV: &str = "LOG_SINK_BUFFER_CAPACITY";

/// Upper-case every property key when set to a true value.
pub const LOG_SINK_UPPERCASE_KEYS_ENV: &str = "LOG_SINK_UPPERCASE_KEYS";

/// Require a text message field when set to a true value.
pub const LOG_SINK_STRICT_MESSAGE_ENV: &str = "LOG_SINK_STRICT_MESSAGE";

/// Interpret an optional variable value as a boolean flag.
pub fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        assert!(flag(Some("TRUE".into())));
        assert!(flag(Some(" on ".into())));
        assert!(!flag(Some("0".into())));
        assert!(!flag(None));
    }
}
