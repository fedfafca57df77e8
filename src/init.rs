use crate::relay::{AsyncWriter, INTERNAL_TARGET};
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Configuration of the installed subscriber.
///
/// **Fields**
/// - `max_level`: most verbose level forwarded to Application Insights.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added as well and everything, including the writer's own
///   diagnostics, is printed to the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub max_level: LevelFilter,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { max_level: LevelFilter::INFO, enable_stdout: true }
    }
}

/// Install a global `tracing` subscriber whose events are serialized as
/// flattened JSON and written into `writer`.
///
/// **Parameters**
/// - `writer`: relay returned by [`crate::new_async_writer`]; a clone is
///   kept by the subscriber, so the caller can still close it on shutdown.
/// - `config`: [`LayerConfig`] controlling level and console output.
///
/// Events under [`INTERNAL_TARGET`] are never written into `writer`.
pub fn init_tracing_with_config(writer: AsyncWriter, config: LayerConfig) -> Result<(), SetGlobalDefaultError> {
    let filter = Targets::new()
        .with_default(config.max_level)
        .with_target(INTERNAL_TARGET, LevelFilter::OFF);

    let sink_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(writer)
        .with_filter(filter);

    let stdout_layer = config.enable_stdout.then(|| tracing_subscriber::fmt::layer());

    let subscriber = Registry::default().with(sink_layer).with(stdout_layer);
    tracing::subscriber::set_global_default(subscriber)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing(writer: AsyncWriter) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(writer, LayerConfig::default())
}
