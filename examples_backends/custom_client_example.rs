use std::sync::Arc;

use appinsights_log_sink::config::{AsyncConfig, SinkConfig};
use appinsights_log_sink::init::init_tracing;
use appinsights_log_sink::{new_async_writer_with_client, TelemetryClient, TraceEvent};
use tracing::{error, info, warn};

/// Example of plugging in a custom telemetry client by implementing the
/// `TelemetryClient` trait directly. Here the events are just printed.
struct PrintClient;

impl TelemetryClient for PrintClient {
    fn track(&self, event: TraceEvent) {
        println!("[telemetry] {:?} {:?} {:?}", event.severity, event.message, event.properties);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let writer = new_async_writer_with_client(SinkConfig::default(), Arc::new(PrintClient), AsyncConfig::default())?;

    init_tracing(writer.clone())?;

    info!("custom client example started");
    warn!(traceId = "4bf92f3577b34da6", attempt = 3, "retrying upstream call");
    error!(order_id = 123, "order failed");

    writer.close()?;
    Ok(())
}
