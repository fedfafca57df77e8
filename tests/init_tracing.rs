mod common;

use appinsights_log_sink::config::AsyncConfig;
use appinsights_log_sink::init::{init_tracing_with_config, LayerConfig};
use appinsights_log_sink::relay::INTERNAL_TARGET;
use appinsights_log_sink::{new_async_writer_with_client, Severity, SinkConfig};
use common::RecordingClient;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;

// Installs the global subscriber, so this binary holds a single test.
#[test]
fn tracing_events_reach_the_client() {
    let recording = RecordingClient::default();
    let writer =
        new_async_writer_with_client(SinkConfig::default(), Arc::new(recording.clone()), AsyncConfig::default())
            .unwrap();

    let config = LayerConfig { max_level: LevelFilter::DEBUG, enable_stdout: false };
    init_tracing_with_config(writer.clone(), config).unwrap();

    tracing::debug!("warming up");
    tracing::warn!(traceId = "op-7", attempt = 3, "retrying upstream call");
    tracing::trace!("below the configured level");
    tracing::error!(target: INTERNAL_TARGET, "never written back into the sink");

    writer.close().unwrap();

    let events = recording.events();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].severity, Severity::Verbose);
    assert_eq!(events[0].message, "warming up");

    let warn = &events[1];
    assert_eq!(warn.severity, Severity::Warning);
    assert_eq!(warn.message, "retrying upstream call");
    assert_eq!(warn.operation_id(), Some("op-7"));
    assert_eq!(warn.properties["attempt"], "3");
    assert!(warn.properties.contains_key("target"));
    assert!(!warn.properties.contains_key("timestamp"));
    assert!(!warn.properties.contains_key("level"));
}
