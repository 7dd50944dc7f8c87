//! Stress tests for concurrent logging and uploading
//!
//! These tests verify:
//! - Per-thread call order survives concurrent logging
//! - No record is lost or duplicated across many upload cycles
//! - Overflow policies behave under a saturated worker queue
//! - Retry and scheduled uploads fire while the command queue stays busy

use agent_logger::prelude::*;
use agent_logger::{parse_records, MemoryTransport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Records from each thread appear in that thread's call order
#[test]
fn test_concurrent_logging_keeps_per_thread_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = Arc::new(
        Logger::builder()
            .log_dir(temp_dir.path())
            .targets(LogTargets::FILE)
            .levels(LevelMask::ALL)
            .max_log_file_bytes(None)
            .queue_capacity(64)
            .build()
            .expect("Failed to build logger"),
    );

    let threads = 8;
    let per_thread = 250u32;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..per_thread {
                    logger.log(LogLevel::Info, "stress.rs", i, &format!("thread-{}", t), "tick");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let records = parse_records(&logger.log_file_data().unwrap()).unwrap();
    assert_eq!(records.len(), threads * per_thread as usize);

    let mut last_seen: HashMap<String, i64> = HashMap::new();
    for record in &records {
        let method = record["method"].as_str().unwrap().to_string();
        let line = record["lineNumber"].as_i64().unwrap();
        let previous = last_seen.insert(method.clone(), line).unwrap_or(-1);
        assert_eq!(line, previous + 1, "{} out of order", method);
    }
}

/// Every agent record is delivered exactly once across many enqueue cycles
/// interleaved with transport failures
#[test]
fn test_uploads_under_load_deliver_each_record_once() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let transport = MemoryTransport::new();
    let logger = Arc::new(
        Logger::builder()
            .log_dir(temp_dir.path())
            .targets(LogTargets::NONE)
            .remote_level(LevelMask::ERROR)
            .ingest_key("key")
            .entity_guid("guid")
            .backoff(BackoffPolicy::new(
                Duration::from_millis(1),
                Duration::from_millis(5),
                2,
            ))
            .max_backlog_bytes(None)
            .transport(transport.clone())
            .build()
            .expect("Failed to build logger"),
    );

    let threads = 4;
    let per_thread = 200u32;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let transport = transport.clone();
            thread::spawn(move || {
                for i in 0..per_thread {
                    logger.log_with_agent_logs(
                        LogLevel::Error,
                        "load.rs",
                        i,
                        &format!("thread-{}", t),
                        format!("{}-{}", t, i),
                        true,
                    );
                    if i % 25 == 0 {
                        if t == 0 {
                            transport.fail_next(1);
                        }
                        logger.enqueue_log_upload();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = threads * per_thread as usize;
    let delivered = || {
        transport
            .deliveries()
            .iter()
            .map(|d| match serde_json::from_slice::<Value>(&d.payload) {
                Ok(Value::Array(records)) => records.len(),
                _ => 0,
            })
            .sum::<usize>()
    };
    assert!(wait_until(|| {
        logger.enqueue_log_upload();
        let status = logger.upload_status();
        status.pending_payloads == 0 && !status.is_uploading && delivered() >= total
    }));

    let mut messages: Vec<String> = transport
        .deliveries()
        .iter()
        .flat_map(|d| match serde_json::from_slice::<Value>(&d.payload) {
            Ok(Value::Array(records)) => records,
            _ => Vec::new(),
        })
        .map(|r| r["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages.len(), total);
    messages.sort();
    messages.dedup();
    assert_eq!(messages.len(), total, "duplicate deliveries");
}

fn spawn_noise(logger: &Arc<Logger>, stop: &Arc<AtomicBool>) -> Vec<thread::JoinHandle<()>> {
    (0..4)
        .map(|t| {
            let logger = Arc::clone(logger);
            let stop = Arc::clone(stop);
            thread::spawn(move || {
                let method = format!("noise-{}", t);
                while !stop.load(Ordering::Relaxed) {
                    logger.log(LogLevel::Info, "noise.rs", 1, &method, "steady traffic");
                }
            })
        })
        .collect()
}

/// A backoff retry is not held back by a command queue that never empties
#[test]
fn test_retry_fires_during_sustained_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let transport = MemoryTransport::new();
    transport.fail_next(1);
    let logger = Arc::new(
        Logger::builder()
            .log_dir(temp_dir.path())
            .targets(LogTargets::FILE)
            .levels(LevelMask::ALL)
            .ingest_key("key")
            .entity_guid("guid")
            .backoff(BackoffPolicy::new(
                Duration::from_millis(20),
                Duration::from_millis(20),
                2,
            ))
            .transport(transport.clone())
            .build()
            .expect("Failed to build logger"),
    );

    logger.log_with_agent_logs(LogLevel::Error, "retry.rs", 1, "m", "retried", true);
    logger.enqueue_log_upload();
    assert!(wait_until(|| transport.attempts() >= 1));

    let stop = Arc::new(AtomicBool::new(false));
    let noise = spawn_noise(&logger, &stop);

    let deadline = Instant::now() + Duration::from_secs(3);
    let mut delivered_under_load = false;
    while Instant::now() < deadline {
        if transport.deliveries().len() == 1 {
            delivered_under_load = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    stop.store(true, Ordering::Relaxed);
    for handle in noise {
        handle.join().unwrap();
    }

    assert!(delivered_under_load, "retry did not fire while logging continued");
    assert_eq!(transport.attempts(), 2);
}

/// Scheduled uploads keep their period while the command queue stays busy
#[test]
fn test_scheduled_upload_fires_during_sustained_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let transport = MemoryTransport::new();
    let logger = Arc::new(
        Logger::builder()
            .log_dir(temp_dir.path())
            .targets(LogTargets::FILE)
            .levels(LevelMask::ALL)
            .ingest_key("key")
            .entity_guid("guid")
            .upload_interval(Duration::from_millis(20))
            .transport(transport.clone())
            .build()
            .expect("Failed to build logger"),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let noise = spawn_noise(&logger, &stop);
    logger.log_with_agent_logs(LogLevel::Error, "tick.rs", 1, "m", "scheduled", true);

    let deadline = Instant::now() + Duration::from_secs(3);
    let mut delivered_under_load = false;
    while Instant::now() < deadline {
        if !transport.deliveries().is_empty() {
            delivered_under_load = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    stop.store(true, Ordering::Relaxed);
    for handle in noise {
        handle.join().unwrap();
    }

    assert!(delivered_under_load, "scheduled upload did not fire while logging continued");
}

/// DropNewest never blocks the caller and accounts for every record
#[test]
fn test_drop_newest_accounts_for_every_record() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = Logger::builder()
        .log_dir(temp_dir.path())
        .targets(LogTargets::FILE)
        .levels(LevelMask::ALL)
        .max_log_file_bytes(None)
        .queue_capacity(4)
        .overflow_policy(OverflowPolicy::DropNewest)
        .build()
        .expect("Failed to build logger");

    let attempts = 2_000u32;
    for i in 0..attempts {
        logger.log(LogLevel::Debug, "drop.rs", i, "flood", "x");
    }

    let written = parse_records(&logger.log_file_data().unwrap()).unwrap().len() as u64;
    let dropped = logger.metrics().queue_full_events();
    assert_eq!(written + dropped, attempts as u64);
    assert!(written > 0);
}

/// Configuration churn from other threads never wedges the worker
#[test]
fn test_concurrent_configuration_changes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = Arc::new(
        Logger::builder()
            .log_dir(temp_dir.path())
            .targets(LogTargets::FILE)
            .build()
            .expect("Failed to build logger"),
    );

    let writer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..500 {
                logger.log(LogLevel::Warning, "churn.rs", i, "write", "w");
            }
        })
    };
    let configurer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..500 {
                if i % 2 == 0 {
                    logger.set_log_levels(LevelMask::ERROR);
                } else {
                    logger.set_log_levels(LevelMask::WARNING);
                }
                let _ = logger.log_levels();
            }
        })
    };
    writer.join().unwrap();
    configurer.join().unwrap();

    logger.flush();
    assert_eq!(logger.log_levels(), LevelMask::WARNING);
    let written = parse_records(&logger.log_file_data().unwrap()).unwrap().len();
    assert!(written <= 500);
}
