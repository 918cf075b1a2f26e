//! Streams length-prefixed log lines through a byte ring.
//!
//! The ring carries no framing, so the producer writes `[len: u16][bytes]`
//! records and the consumer reassembles them, retrying partial pushes and
//! partial gets as the ring fills and drains.
//!
//! Run with: RUST_LOG=bytering_rs=trace cargo run --release --example stream

use bytering_rs::{Config, Consumer, Producer, RingBuffer};
use std::thread;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LINES: usize = 100_000;

fn send_all(tx: &mut Producer, mut data: &[u8]) {
    while !data.is_empty() {
        let n = tx.push(data);
        if n == 0 {
            thread::yield_now();
        }
        data = &data[n..];
    }
}

fn recv_exact(rx: &mut Consumer, mut dest: &mut [u8]) {
    while !dest.is_empty() {
        let n = rx.get(dest);
        if n == 0 {
            thread::yield_now();
        }
        dest = &mut std::mem::take(&mut dest)[n..];
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::new(
        12,   // 4 KiB
        true, // metrics enabled
    );
    let ring = match RingBuffer::with_config(config) {
        Ok(ring) => ring,
        Err(e) => {
            eprintln!("bad ring config: {e}");
            std::process::exit(1);
        }
    };
    info!(capacity = ring.capacity(), "starting stream");
    let (mut tx, mut rx) = ring.split();

    let start = Instant::now();

    let producer = thread::spawn(move || {
        for i in 0..LINES {
            let line = format!("line {i}: the quick brown fox jumps over the lazy dog");
            send_all(&mut tx, &(line.len() as u16).to_le_bytes());
            send_all(&mut tx, line.as_bytes());
        }
    });

    let mut total_bytes = 0usize;
    let mut buf = vec![0u8; u16::MAX as usize];
    for i in 0..LINES {
        let mut len = [0u8; 2];
        recv_exact(&mut rx, &mut len);
        let len = u16::from_le_bytes(len) as usize;
        recv_exact(&mut rx, &mut buf[..len]);
        assert!(buf[..len].starts_with(format!("line {i}:").as_bytes()));
        total_bytes += len;
    }

    producer.join().unwrap();
    let duration = start.elapsed();
    let m = rx.metrics();

    println!("\nResults:");
    println!("  Lines received: {}", LINES);
    println!("  Payload bytes: {}", total_bytes);
    println!("  Duration: {:.2?}", duration);
    println!(
        "  Bandwidth: {:.2} MB/sec",
        m.bytes_consumed as f64 / duration.as_secs_f64() / 1_000_000.0
    );
    println!("  Push calls: {} ({} truncated)", m.push_calls, m.truncated_pushes);
    println!("  Get calls: {} ({} empty)", m.get_calls, m.empty_gets);
}
