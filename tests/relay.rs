mod common;

use appinsights_log_sink::config::AsyncConfig;
use appinsights_log_sink::{new_async_writer_with_client, SinkConfig, TelemetryClient, TraceEvent};
use common::RecordingClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Client whose first `track` call blocks until released.
struct SlowClient {
    inner: RecordingClient,
    started: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl TelemetryClient for SlowClient {
    fn track(&self, event: TraceEvent) {
        if let Some(started) = self.started.lock().unwrap().take() {
            started.send(()).unwrap();
            let release = self.release.lock().unwrap().take().unwrap();
            release.recv().unwrap();
        }
        self.inner.track(event);
    }
}

fn record(i: usize) -> Vec<u8> {
    format!(r#"{{"level":"info","message":"record {i}","seq":{i}}}"#).into_bytes()
}

#[test]
fn saturated_relay_drops_and_reports_then_delivers_in_order() {
    const CAPACITY: usize = 8;
    const EXTRA: usize = 5;

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let recording = RecordingClient::default();
    let client = Arc::new(SlowClient {
        inner: recording.clone(),
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(Some(release_rx)),
    });

    let missed = Arc::new(AtomicU64::new(0));
    let missed_cb = Arc::clone(&missed);
    let async_config = AsyncConfig::with_capacity(CAPACITY).on_missed(move |n| {
        missed_cb.fetch_add(n, Ordering::SeqCst);
    });
    let writer = new_async_writer_with_client(SinkConfig::default(), client, async_config).unwrap();

    // Park the worker inside the first submission.
    writer.write_record(&record(0)).unwrap();
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    for i in 1..=CAPACITY + EXTRA {
        let raw = record(i);
        assert_eq!(writer.write_record(&raw).unwrap(), raw.len());
    }

    release_tx.send(()).unwrap();
    writer.close().unwrap();

    let messages: Vec<String> = recording.events().into_iter().map(|e| e.message).collect();
    let expected: Vec<String> = (0..=CAPACITY).map(|i| format!("record {i}")).collect();
    assert_eq!(messages, expected);
    assert_eq!(missed.load(Ordering::SeqCst), EXTRA as u64);
    assert_eq!(writer.stats().dropped, EXTRA as u64);
}

#[test]
fn concurrent_writers_each_keep_their_order() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 250;

    let recording = RecordingClient::default();
    let writer = new_async_writer_with_client(
        SinkConfig::default(),
        Arc::new(recording.clone()),
        AsyncConfig::with_capacity(THREADS * PER_THREAD),
    )
    .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let writer = writer.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let raw = format!(r#"{{"message":"m","thread":{t},"seq":{i}}}"#);
                    writer.write_record(raw.as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    writer.close().unwrap();

    let events = recording.events();
    assert_eq!(events.len(), THREADS * PER_THREAD);
    for t in 0..THREADS {
        let seqs: Vec<usize> = events
            .iter()
            .filter(|e| e.properties["thread"] == t.to_string())
            .map(|e| e.properties["seq"].parse().unwrap())
            .collect();
        assert_eq!(seqs, (0..PER_THREAD).collect::<Vec<_>>());
    }
    assert_eq!(writer.stats().dropped, 0);
}

#[test]
fn decode_failures_behind_the_relay_are_counted() {
    let recording = RecordingClient::default();
    let writer = new_async_writer_with_client(
        SinkConfig::default(),
        Arc::new(recording.clone()),
        AsyncConfig::with_capacity(16),
    )
    .unwrap();

    // The relay accepts anything; the translator rejects it later.
    assert_eq!(writer.write_record(b"not a record").unwrap(), 12);
    writer.write_record(br#"{"message":"fine"}"#).unwrap();
    writer.close().unwrap();

    let stats = writer.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(recording.events().len(), 1);
}
