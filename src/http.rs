use crate::backend::{BuildError, ConnectionConfig};
use crate::client::TelemetryClient;
use crate::event::TraceEvent;
use crate::relay::INTERNAL_TARGET;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::runtime::Handle;

/// Application Insights implementation of [`TelemetryClient`] using the
/// HTTP ingestion API.
///
/// Every tracked event becomes one POST spawned on the tokio runtime that
/// was current when the client was created. Failures are logged and the
/// event is discarded; there is no retry or batching.
#[derive(Clone)]
pub struct HttpTelemetryClient {
    client: Client,
    connection: ConnectionConfig,
    runtime: Handle,
}

impl HttpTelemetryClient {
    /// Construct a new client for the given destination.
    ///
    /// **Returns**
    /// - `Err(BuildError::NoRuntime)` if called outside a tokio runtime.
    pub fn new(connection: ConnectionConfig) -> Result<Self, BuildError> {
        let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;
        Ok(Self { client: Client::new(), connection, runtime })
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    fn envelope<'a>(&self, event: &'a TraceEvent) -> Envelope<'a> {
        let key = &self.connection.instrumentation_key;
        Envelope {
            name: format!("Microsoft.ApplicationInsights.{}.Message", key.replace('-', "")),
            time: event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            i_key: key.clone(),
            tags: &event.tags,
            data: Data {
                base_type: "MessageData",
                base_data: MessageData {
                    ver: 2,
                    message: &event.message,
                    severity_level: event.severity.code(),
                    properties: &event.properties,
                },
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    name: String,
    time: String,
    i_key: String,
    tags: &'a BTreeMap<String, String>,
    data: Data<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Data<'a> {
    base_type: &'static str,
    base_data: MessageData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageData<'a> {
    ver: i32,
    message: &'a str,
    severity_level: i32,
    properties: &'a BTreeMap<String, String>,
}

impl TelemetryClient for HttpTelemetryClient {
    fn track(&self, event: TraceEvent) {
        let body = match serde_json::to_vec(&[self.envelope(&event)]) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(target: INTERNAL_TARGET, error = %e, "failed to encode telemetry envelope");
                return;
            }
        };

        let client = self.client.clone();
        let url = self.connection.track_url();
        self.runtime.spawn(async move {
            let result = client
                .post(&url)
                .header("Content-Type", "application/json")
                .body(body)
                .send()
                .await;
            match result {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
                    tracing::warn!(target: INTERNAL_TARGET, %status, body = %text, "telemetry submission rejected");
                }
                Err(e) => {
                    tracing::warn!(target: INTERNAL_TARGET, error = %e, "telemetry submission failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::parse_connection_string;
    use crate::severity::Severity;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn envelope_matches_ingestion_schema() {
        let client = HttpTelemetryClient::new(parse_connection_string("0000-abcd").unwrap()).unwrap();

        let mut event = TraceEvent::new("payment failed", Severity::Error);
        event.timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        event.properties.insert("orderId".into(), "42".into());
        event.set_operation_id("op-1");

        let json = serde_json::to_value(client.envelope(&event)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Microsoft.ApplicationInsights.0000abcd.Message",
                "time": "2024-05-01T10:00:00.000Z",
                "iKey": "0000-abcd",
                "tags": { "ai.operation.id": "op-1" },
                "data": {
                    "baseType": "MessageData",
                    "baseData": {
                        "ver": 2,
                        "message": "payment failed",
                        "severityLevel": 3,
                        "properties": { "orderId": "42" }
                    }
                }
            })
        );
    }
}
