use std::io;
use std::sync::Arc;

use crate::client::TelemetryClient;
use crate::config::{AsyncConfig, SinkConfig};
use crate::relay::AsyncWriter;
use crate::translator::Translator;

/// Ingestion endpoint used when the connection string does not name one.
pub const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com";

/// Destination resource parsed from an instrumentation key or connection
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub instrumentation_key: String,
    /// Base URL of the ingestion service, without a trailing slash.
    pub ingestion_endpoint: String,
}

impl ConnectionConfig {
    /// URL that accepts telemetry envelopes.
    pub fn track_url(&self) -> String {
        format!("{}/v2/track", self.ingestion_endpoint)
    }
}

/// Parse either a bare instrumentation key or a connection string.
///
/// Examples:
/// - "00000000-0000-0000-0000-000000000000"
/// - "InstrumentationKey=00000000-...;IngestionEndpoint=https://westeurope-5.in.applicationinsights.azure.com/"
pub fn parse_connection_string(value: &str) -> Result<ConnectionConfig, ConnectionStringError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConnectionStringError::MissingInstrumentationKey);
    }

    if !value.contains('=') {
        return Ok(ConnectionConfig {
            instrumentation_key: value.to_string(),
            ingestion_endpoint: DEFAULT_INGESTION_ENDPOINT.to_string(),
        });
    }

    let mut instrumentation_key = None;
    let mut ingestion_endpoint = None;
    for part in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, val) = part
            .split_once('=')
            .ok_or_else(|| ConnectionStringError::Malformed(part.to_string()))?;
        let val = val.trim();
        if key.trim().eq_ignore_ascii_case("InstrumentationKey") {
            instrumentation_key = Some(val.to_string());
        } else if key.trim().eq_ignore_ascii_case("IngestionEndpoint") {
            ingestion_endpoint = Some(val.trim_end_matches('/').to_string());
        }
    }

    match instrumentation_key {
        Some(key) if !key.is_empty() => Ok(ConnectionConfig {
            instrumentation_key: key,
            ingestion_endpoint: ingestion_endpoint
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_INGESTION_ENDPOINT.to_string()),
        }),
        _ => Err(ConnectionStringError::MissingInstrumentationKey),
    }
}

/// Error type returned when parsing a connection string.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionStringError {
    #[error("instrumentation key is missing")]
    MissingInstrumentationKey,

    #[error("malformed connection string segment: {0:?}")]
    Malformed(String),
}

/// Error type returned when building a writer from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    ConnectionString(#[from] ConnectionStringError),

    #[error("http feature is not enabled")]
    HttpFeatureDisabled,

    #[error("the HTTP telemetry client must be created inside a tokio runtime")]
    NoRuntime,

    #[error("failed to start drain worker: {0}")]
    Worker(#[from] io::Error),
}

/// Create the synchronous writer, submitting to Application Insights over
/// HTTP.
///
/// This is the main entry point for applications that only have an
/// instrumentation key. Must be called from within a tokio runtime, which
/// the HTTP client uses for its requests.
pub fn new_writer(config: SinkConfig) -> Result<Translator, BuildError> {
    #[cfg(feature = "http")]
    {
        use crate::http::HttpTelemetryClient;

        let connection = parse_connection_string(&config.instrumentation_key)?;
        let client = HttpTelemetryClient::new(connection)?;
        Ok(Translator::new(config, Arc::new(client) as Arc<dyn TelemetryClient>))
    }

    #[cfg(not(feature = "http"))]
    {
        let _ = config;
        Err(BuildError::HttpFeatureDisabled)
    }
}

/// Create the synchronous writer around an existing client.
pub fn new_writer_with_client(config: SinkConfig, client: Arc<dyn TelemetryClient>) -> Translator {
    Translator::new(config, client)
}

/// Create the asynchronous, loss-tolerant writer in front of
/// [`new_writer`].
pub fn new_async_writer(config: SinkConfig, async_config: AsyncConfig) -> Result<AsyncWriter, BuildError> {
    let translator = new_writer(config)?;
    Ok(AsyncWriter::new(translator, async_config)?)
}

/// Create the asynchronous writer around an existing client.
pub fn new_async_writer_with_client(
    config: SinkConfig,
    client: Arc<dyn TelemetryClient>,
    async_config: AsyncConfig,
) -> Result<AsyncWriter, BuildError> {
    Ok(AsyncWriter::new(new_writer_with_client(config, client), async_config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_key_uses_default_endpoint() {
        let cfg = parse_connection_string(" abc-123 ").unwrap();
        assert_eq!(cfg.instrumentation_key, "abc-123");
        assert_eq!(cfg.track_url(), "https://dc.services.visualstudio.com/v2/track");
    }

    #[test]
    fn connection_string_with_endpoint() {
        let cfg = parse_connection_string(
            "InstrumentationKey=abc;IngestionEndpoint=https://westeurope-5.in.applicationinsights.azure.com/;LiveEndpoint=https://live",
        )
        .unwrap();
        assert_eq!(cfg.instrumentation_key, "abc");
        assert_eq!(cfg.track_url(), "https://westeurope-5.in.applicationinsights.azure.com/v2/track");
    }

    #[test]
    fn rejects_missing_key() {
        assert!(matches!(parse_connection_string(""), Err(ConnectionStringError::MissingInstrumentationKey)));
        assert!(matches!(
            parse_connection_string("IngestionEndpoint=https://x"),
            Err(ConnectionStringError::MissingInstrumentationKey)
        ));
        assert!(matches!(
            parse_connection_string("InstrumentationKey=abc;garbage"),
            Err(ConnectionStringError::Malformed(_))
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_writer_requires_runtime() {
        let err = new_writer(SinkConfig::new("abc")).err().unwrap();
        assert!(matches!(err, BuildError::NoRuntime));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn http_writer_inside_runtime() {
        assert!(new_writer(SinkConfig::new("abc")).is_ok());
        assert!(matches!(new_writer(SinkConfig::default()), Err(BuildError::ConnectionString(_))));
    }
}
