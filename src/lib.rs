//! Writers that turn serialized structured log records into Application
//! Insights trace telemetry.
//!
//! [`Translator`] decodes one JSON (or CBOR) record per `write`, maps its
//! level, message and remaining fields onto a [`TraceEvent`] and hands it
//! to a [`TelemetryClient`]. [`AsyncWriter`] puts a bounded, drop-on-full
//! buffer and a single drain worker in front of it so that logging call
//! sites never wait on telemetry.

pub mod backend;
pub mod client;
pub mod config;
pub mod encode;
pub mod env;
pub mod envelope;
pub mod event;
pub mod init;
pub mod noop_client;
pub mod record;
pub mod relay;
pub mod severity;
pub mod translator;
pub mod value;

#[cfg(feature = "http")]
pub mod http;

pub use backend::{
    new_async_writer, new_async_writer_with_client, new_writer, new_writer_with_client, BuildError,
};
pub use client::TelemetryClient;
pub use config::{AsyncConfig, KeyCase, MessagePolicy, SinkConfig};
pub use event::TraceEvent;
pub use record::DecodeError;
pub use relay::{AsyncWriter, RelayStats};
pub use severity::Severity;
pub use translator::{TranslateError, Translator};
