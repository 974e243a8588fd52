//! Multi-threaded stress test of the window handoff
//!
//! The producer stamps every element of a window with the window's sequence
//! number. A torn read shows up as a window holding two different stamps; a
//! redelivery as a stamp that is not strictly greater than the previous one.

use spectrum_link::handoff::HandoffBuffer;
use std::thread;
use std::time::{Duration, Instant};

const WINDOW: usize = 64;
const WINDOWS: u64 = 200_000;

#[test]
fn test_no_torn_reads_or_redelivery() {
    let (mut producer, mut consumer) =
        HandoffBuffer::new(vec![0u64; WINDOW], vec![0u64; WINDOW]).split();

    let writer = thread::spawn(move || {
        for seq in 1..=WINDOWS {
            let window = producer.start_writing();
            for value in window.iter_mut() {
                *value = seq;
            }
            producer.stop_writing();
        }
    });

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut last = 0u64;
    let mut reads = 0u64;

    while last != WINDOWS {
        assert!(Instant::now() < deadline, "consumer never saw the final window");

        let Some(window) = consumer.start_reading() else {
            thread::yield_now();
            continue;
        };

        let seq = window[0];
        assert!(window.iter().all(|&v| v == seq), "torn read in window {}", seq);
        assert!(seq > last, "window {} delivered after {}", seq, last);
        last = seq;
        reads += 1;

        consumer.end_reading();
    }

    writer.join().unwrap();
    assert!(consumer.start_reading().is_none());
    assert!(reads >= 1);
}

#[test]
fn test_producer_runs_without_consumer() {
    let (mut producer, mut consumer) = HandoffBuffer::new(vec![0u64; 4], vec![0u64; 4]).split();

    let writer = thread::spawn(move || {
        for seq in 1..=10_000u64 {
            producer.start_writing().fill(seq);
            producer.stop_writing();
        }
    });
    writer.join().unwrap();

    assert_eq!(consumer.start_reading(), Some(&vec![10_000u64; 4]));
    consumer.end_reading();
}

#[test]
fn test_slow_consumer_sees_increasing_windows() {
    let (mut producer, mut consumer) =
        HandoffBuffer::new(vec![0u64; WINDOW], vec![0u64; WINDOW]).split();

    let writer = thread::spawn(move || {
        for seq in 1..=2_000u64 {
            producer.start_writing().fill(seq);
            producer.stop_writing();
            if seq % 100 == 0 {
                thread::sleep(Duration::from_micros(200));
            }
        }
    });

    let mut last = 0u64;
    let deadline = Instant::now() + Duration::from_secs(30);
    while last != 2_000 {
        assert!(Instant::now() < deadline);
        if let Some(window) = consumer.start_reading() {
            let seq = window[0];
            // Hold the window for a while so the producer publishes meanwhile
            thread::sleep(Duration::from_micros(50));
            assert!(window.iter().all(|&v| v == seq));
            assert!(seq > last);
            last = seq;
            consumer.end_reading();
        }
    }
    writer.join().unwrap();
}
