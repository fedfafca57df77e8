use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use appinsights_log_sink::config::{AsyncConfig, SinkConfig, SMALL_BUFFER_CAPACITY};
use appinsights_log_sink::noop_client::NoopClient;
use appinsights_log_sink::new_async_writer_with_client;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let missed = Arc::new(AtomicU64::new(0));
    let missed_cb = Arc::clone(&missed);

    let async_config = AsyncConfig::with_capacity(SMALL_BUFFER_CAPACITY).on_missed(move |n| {
        missed_cb.fetch_add(n, Ordering::Relaxed);
    });
    let writer = new_async_writer_with_client(SinkConfig::default(), Arc::new(NoopClient), async_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let record = format!(
            r#"{{"level":"error","message":"load test error","iteration":{i},"ctx":{{"worker":1}}}}"#
        );
        writer.write_record(record.as_bytes())?;
    }

    let elapsed = start.elapsed();
    writer.close()?;

    let stats = writer.stats();
    println!(
        "wrote {} records in {:?} (~{:.0} rec/s): delivered {}, dropped {}, reported missed {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        stats.delivered,
        stats.dropped,
        missed.load(Ordering::Relaxed),
    );
    Ok(())
}
