use crate::env;
use crate::severity::{Severity, DEFAULT_SEVERITY};
use std::fmt;
use std::sync::Arc;

/// Buffer capacity for low-volume services.
pub const SMALL_BUFFER_CAPACITY: usize = 1_000;

/// Buffer capacity for high-volume services; the default.
pub const LARGE_BUFFER_CAPACITY: usize = 20_024;

/// How the translator treats the message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessagePolicy {
    /// A text message field becomes the event message; a missing or
    /// non-text one yields an empty message.
    #[default]
    Lenient,
    /// The message field must be present and be text. Records without one
    /// are rejected with [`TranslateError::MissingMessage`] and nothing is
    /// tracked for them. Only enable this when every producer is known to
    /// set a message.
    ///
    /// [`TranslateError::MissingMessage`]: crate::translator::TranslateError::MissingMessage
    Strict,
}

/// Casing applied to property keys before they are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    #[default]
    Preserve,
    Upper,
}

impl KeyCase {
    pub fn apply(self, key: String) -> String {
        match self {
            KeyCase::Preserve => key,
            KeyCase::Upper => key.to_uppercase(),
        }
    }
}

/// Names of the reserved record fields.
///
/// They must match what the producing logger writes. The defaults match
/// `tracing-subscriber`'s JSON formatter with flattened events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub level: String,
    pub timestamp: String,
    pub message: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            level: "level".to_string(),
            timestamp: "timestamp".to_string(),
            message: "message".to_string(),
        }
    }
}

/// Configuration of the synchronous writer.
///
/// **Fields**
/// - `instrumentation_key`: identifies the destination telemetry resource;
///   either a bare key or a connection string
///   (`InstrumentationKey=...;IngestionEndpoint=...`).
/// - `default_severity`: severity for records without a usable level.
/// - `message_policy`: see [`MessagePolicy`].
/// - `key_case`: see [`KeyCase`].
/// - `field_names`: reserved field names, see [`FieldNames`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub instrumentation_key: String,
    pub default_severity: Severity,
    pub message_policy: MessagePolicy,
    pub key_case: KeyCase,
    pub field_names: FieldNames,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            instrumentation_key: String::new(),
            default_severity: DEFAULT_SEVERITY,
            message_policy: MessagePolicy::default(),
            key_case: KeyCase::default(),
            field_names: FieldNames::default(),
        }
    }
}

impl SinkConfig {
    pub fn new(instrumentation_key: impl Into<String>) -> Self {
        Self { instrumentation_key: instrumentation_key.into(), ..Self::default() }
    }

    /// Build a config from the process environment. See [`crate::env`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// The connection string variable wins over the bare instrumentation
    /// key variable when both are set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let instrumentation_key = lookup(env::CONNECTION_STRING_ENV)
            .or_else(|| lookup(env::INSTRUMENTATION_KEY_ENV))
            .unwrap_or_default();

        let key_case = if env::flag(lookup(env::LOG_SINK_UPPERCASE_KEYS_ENV)) {
            KeyCase::Upper
        } else {
            KeyCase::Preserve
        };
        let message_policy = if env::flag(lookup(env::LOG_SINK_STRICT_MESSAGE_ENV)) {
            MessagePolicy::Strict
        } else {
            MessagePolicy::Lenient
        };

        Self { instrumentation_key, key_case, message_policy, ..Self::default() }
    }
}

/// Callback receiving the number of records dropped since the last report.
pub type MissedCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Configuration of the asynchronous relay.
///
/// **Fields**
/// - `buffer_capacity`: maximum number of records waiting for the drain
///   worker before new ones are dropped. Clamped to at least 1.
/// - `on_missed`: invoked with the count of records dropped since the
///   previous report. When `None` the relay logs an error instead.
#[derive(Clone)]
pub struct AsyncConfig {
    pub buffer_capacity: usize,
    pub on_missed: Option<MissedCallback>,
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self { buffer_capacity: LARGE_BUFFER_CAPACITY, on_missed: None }
    }
}

impl fmt::Debug for AsyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncConfig")
            .field("buffer_capacity", &self.buffer_capacity)
            .field("on_missed", &self.on_missed.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl AsyncConfig {
    pub fn with_capacity(buffer_capacity: usize) -> Self {
        Self { buffer_capacity, ..Self::default() }
    }

    pub fn on_missed(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_missed = Some(Arc::new(callback));
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable capacities fall back to [`LARGE_BUFFER_CAPACITY`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let buffer_capacity = lookup(env::LOG_SINK_BUFFER_CAPACITY_ENV)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(LARGE_BUFFER_CAPACITY);
        Self::with_capacity(buffer_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_the_safe_choices() {
        let config = SinkConfig::default();
        assert_eq!(config.default_severity, Severity::Information);
        assert_eq!(config.message_policy, MessagePolicy::Lenient);
        assert_eq!(config.key_case, KeyCase::Preserve);
        assert_eq!(AsyncConfig::default().buffer_capacity, LARGE_BUFFER_CAPACITY);
    }

    #[test]
    fn connection_string_wins_over_bare_key() {
        let config = SinkConfig::from_lookup(lookup(&[
            (env::INSTRUMENTATION_KEY_ENV, "bare"),
            (env::CONNECTION_STRING_ENV, "InstrumentationKey=full"),
        ]));
        assert_eq!(config.instrumentation_key, "InstrumentationKey=full");
    }

    #[test]
    fn flags_select_policies() {
        let config = SinkConfig::from_lookup(lookup(&[
            (env::INSTRUMENTATION_KEY_ENV, "k"),
            (env::LOG_SINK_UPPERCASE_KEYS_ENV, "true"),
            (env::LOG_SINK_STRICT_MESSAGE_ENV, "1"),
        ]));
        assert_eq!(config.instrumentation_key, "k");
        assert_eq!(config.key_case, KeyCase::Upper);
        assert_eq!(config.message_policy, MessagePolicy::Strict);
    }

    #[test]
    fn buffer_capacity_from_env() {
        let small = AsyncConfig::from_lookup(lookup(&[(env::LOG_SINK_BUFFER_CAPACITY_ENV, " 1000 ")]));
        assert_eq!(small.buffer_capacity, SMALL_BUFFER_CAPACITY);
        let bogus = AsyncConfig::from_lookup(lookup(&[(env::LOG_SINK_BUFFER_CAPACITY_ENV, "lots")]));
        assert_eq!(bogus.buffer_capacity, LARGE_BUFFER_CAPACITY);
    }

    #[test]
    fn upper_key_case() {
        assert_eq!(KeyCase::Upper.apply("traceId".into()), "TRACEID");
        assert_eq!(KeyCase::Preserve.apply("traceId".into()), "traceId");
    }
}
