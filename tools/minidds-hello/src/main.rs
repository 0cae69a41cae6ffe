// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! minidds-hello - HelloWorld publisher/subscriber
//!
//! Publishes `Hello world N` once per period, or waits for samples and
//! prints them. `pubsub` runs both loops in one process over a shared
//! directory and ends once the publisher is done and the history is
//! drained. Ctrl+C stops either loop cleanly.

use clap::{Parser, ValueEnum};
use crossbeam::channel::{self, Receiver, TryRecvError};
use minidds::config::{DEFAULT_DOMAIN_ID, DEFAULT_HISTORY_DEPTH, DEFAULT_TOPIC_NAME};
use minidds::{DataReader, DataWriter, HelloWorld, Participant, QoS};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MESSAGE: &str = "Hello world";

/// Run a simple minidds publisher or subscriber
#[derive(Parser, Debug, Clone)]
#[command(name = "minidds-hello")]
#[command(version)]
#[command(about = "Run a simple minidds publisher or subscriber")]
struct Args {
    /// The kind of endpoint to create
    #[arg(value_enum)]
    endpoint: Endpoint,

    /// Domain identifier
    #[arg(long, default_value_t = DEFAULT_DOMAIN_ID)]
    domain: u32,

    /// Topic name
    #[arg(long, default_value = DEFAULT_TOPIC_NAME)]
    topic: String,

    /// Publish period in milliseconds
    #[arg(long, default_value_t = 1000)]
    period_ms: u64,

    /// Subscriber wait per loop in seconds
    #[arg(long, default_value_t = 2)]
    wait_secs: u64,

    /// Stop after this many samples published/received (default: run until Ctrl+C)
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Reader history depth
    #[arg(long, default_value_t = DEFAULT_HISTORY_DEPTH as u32)]
    depth: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Endpoint {
    Publisher,
    Subscriber,
    Pubsub,
}

/// How a loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Interrupted,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() {
    env_logger::init();

    let args = Args::parse();

    let shutdown = match install_shutdown_handler() {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("Error installing Ctrl+C handler: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.endpoint {
        Endpoint::Publisher => run_publisher(&args, &shutdown),
        Endpoint::Subscriber => run_subscriber(&args, &shutdown),
        Endpoint::Pubsub => run_pubsub(&args, &shutdown),
    };

    match result {
        Ok(Outcome::Interrupted) => println!("Shutdown requested...exiting"),
        Ok(Outcome::Completed) => {}
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Ctrl+C drops the only sender, which every receiver observes as a
/// disconnect.
fn install_shutdown_handler() -> Result<Receiver<()>, ctrlc::Error> {
    let (tx, rx) = channel::bounded::<()>(0);
    let mut tx = Some(tx);
    ctrlc::set_handler(move || {
        if tx.take().is_some() {
            log::debug!("[minidds-hello] interrupt received");
        }
    })?;
    Ok(rx)
}

fn participant(args: &Args) -> minidds::Result<Arc<Participant>> {
    Participant::builder("minidds-hello")
        .domain_id(args.domain)
        .build()
}

fn create_writer(
    participant: &Arc<Participant>,
    args: &Args,
) -> Result<DataWriter<HelloWorld>, BoxError> {
    participant
        .create_writer::<HelloWorld>(&args.topic, QoS::default())
        .map_err(|e| format!("Error creating publisher: {}", e).into())
}

fn create_reader(
    participant: &Arc<Participant>,
    args: &Args,
) -> Result<DataReader<HelloWorld>, BoxError> {
    participant
        .create_reader::<HelloWorld>(&args.topic, QoS::keep_last(args.depth))
        .map_err(|e| format!("Error creating subscriber: {}", e).into())
}

fn run_publisher(args: &Args, shutdown: &Receiver<()>) -> Result<Outcome, BoxError> {
    let participant =
        participant(args).map_err(|e| format!("Error creating publisher: {}", e))?;
    let writer = create_writer(&participant, args)?;
    publish_loop(&writer, args, shutdown, &channel::never())
}

fn run_subscriber(args: &Args, shutdown: &Receiver<()>) -> Result<Outcome, BoxError> {
    let participant =
        participant(args).map_err(|e| format!("Error creating subscriber: {}", e))?;
    let reader = create_reader(&participant, args)?;
    subscribe_loop(&reader, args, shutdown, &channel::never())
}

fn run_pubsub(args: &Args, shutdown: &Receiver<()>) -> Result<Outcome, BoxError> {
    let participant =
        participant(args).map_err(|e| format!("Error creating subscriber: {}", e))?;
    let reader = create_reader(&participant, args)?;
    let writer = create_writer(&participant, args)?;

    // Dropping `stop_tx` stops the publisher; the publisher drops `done_tx`
    // when it returns.
    let (stop_tx, stop_rx) = channel::bounded::<()>(0);
    let (done_tx, done_rx) = channel::bounded::<()>(0);
    let publisher = {
        let args = args.clone();
        let shutdown = shutdown.clone();
        thread::Builder::new()
            .name("minidds-hello-pub".into())
            .spawn(move || {
                let _done = done_tx;
                publish_loop(&writer, &args, &shutdown, &stop_rx)
            })?
    };

    let received = match subscribe_loop(&reader, args, shutdown, &done_rx) {
        Ok(outcome) => outcome,
        Err(e) => {
            drop(stop_tx);
            match publisher.join() {
                Ok(Err(publish_err)) => {
                    log::debug!("[minidds-hello] publisher also failed: {}", publish_err)
                }
                Err(_) => log::warn!("[minidds-hello] publisher thread panicked"),
                Ok(Ok(_)) => {}
            }
            return Err(e);
        }
    };
    let published = publisher
        .join()
        .map_err(|_| "publisher thread panicked")??;
    drop(stop_tx);

    if received == Outcome::Interrupted || published == Outcome::Interrupted {
        return Ok(Outcome::Interrupted);
    }
    Ok(Outcome::Completed)
}

fn publish_loop(
    writer: &DataWriter<HelloWorld>,
    args: &Args,
    shutdown: &Receiver<()>,
    stop: &Receiver<()>,
) -> Result<Outcome, BoxError> {
    let period = Duration::from_millis(args.period_ms);
    let mut msg = HelloWorld::new(MESSAGE, 0);
    let mut counter: u32 = 0;

    loop {
        if args.count.is_some_and(|count| counter >= count) {
            return Ok(Outcome::Completed);
        }

        counter = counter.wrapping_add(1);
        msg.set_index(counter);
        println!("Publishing {} {}", msg.message(), msg.index());
        writer.write_sample(&msg)?;

        channel::select! {
            recv(shutdown) -> _ => return Ok(Outcome::Interrupted),
            recv(stop) -> _ => return Ok(Outcome::Interrupted),
            default(period) => {}
        }
    }
}

/// Take samples until `count` are consumed, or until the publisher behind
/// `publisher_done` disconnects and the history is empty.
///
/// Samples evicted by the history count as consumed.
fn subscribe_loop(
    reader: &DataReader<HelloWorld>,
    args: &Args,
    shutdown: &Receiver<()>,
    publisher_done: &Receiver<()>,
) -> Result<Outcome, BoxError> {
    let wait = Duration::from_secs(args.wait_secs);
    let mut msg = HelloWorld::default();
    let mut taken: u64 = 0;

    loop {
        let consumed = taken + reader.stats().dropped;
        if args.count.is_some_and(|count| consumed >= u64::from(count)) {
            return Ok(Outcome::Completed);
        }
        if let Err(TryRecvError::Disconnected) = shutdown.try_recv() {
            return Ok(Outcome::Interrupted);
        }
        // Writes are delivered before they return, so once the publisher is
        // done an empty history stays empty.
        let publisher_finished = matches!(
            publisher_done.try_recv(),
            Err(TryRecvError::Disconnected)
        );
        if publisher_finished && reader.is_empty() {
            log::debug!(
                "[minidds-hello] publisher done, {} taken, {} dropped",
                taken,
                reader.stats().dropped
            );
            return Ok(Outcome::Completed);
        }

        if reader.wait_for_sample(wait) {
            taken += 1;
            if reader.take_sample(&mut msg) {
                println!("Received {} {}", msg.message(), msg.index());
            } else {
                println!("Bad sample");
            }
        } else if !reader.is_attached() {
            return Err("subscriber detached".into());
        } else if !publisher_finished {
            println!("No messages received in the last loop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["minidds-hello", "publisher"]).expect("parse");
        assert_eq!(args.endpoint, Endpoint::Publisher);
        assert_eq!(args.domain, 0);
        assert_eq!(args.topic, "HelloWorld");
        assert_eq!(args.period_ms, 1000);
        assert_eq!(args.wait_secs, 2);
        assert_eq!(args.count, None);
    }

    #[test]
    fn test_rejects_unknown_endpoint() {
        assert!(Args::try_parse_from(["minidds-hello", "broker"]).is_err());
        assert!(Args::try_parse_from(["minidds-hello"]).is_err());
    }

    #[test]
    fn test_pubsub_completes_after_count() {
        let args = Args::try_parse_from([
            "minidds-hello",
            "pubsub",
            "--topic",
            "hello-test",
            "--period-ms",
            "5",
            "--wait-secs",
            "1",
            "-n",
            "3",
        ])
        .expect("parse");
        // Sender kept alive: no interrupt.
        let (_tx, rx) = channel::bounded::<()>(0);

        let outcome = run_pubsub(&args, &rx).expect("pubsub run");
        assert_eq!(outcome, Outcome::Completed);
    }

    #[test]
    fn test_pubsub_completes_when_history_drops_samples() {
        let args = Args::try_parse_from([
            "minidds-hello",
            "pubsub",
            "--topic",
            "hello-burst",
            "--period-ms",
            "0",
            "--wait-secs",
            "1",
            "-n",
            "200",
            "--depth",
            "1",
        ])
        .expect("parse");

        let (result_tx, result_rx) = channel::bounded(1);
        thread::spawn(move || {
            let (_tx, rx) = channel::bounded::<()>(0);
            let _ = result_tx.send(run_pubsub(&args, &rx).map_err(|e| e.to_string()));
        });

        let outcome = result_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("pubsub did not finish")
            .expect("pubsub run");
        assert_eq!(outcome, Outcome::Completed);
    }

    #[test]
    fn test_subscriber_stops_once_publisher_done_and_drained() {
        let args = Args::try_parse_from(["minidds-hello", "subscriber", "--wait-secs", "60"])
            .expect("parse");
        let participant = participant(&args).expect("participant");
        let reader = create_reader(&participant, &args).expect("reader");
        let (_tx, shutdown) = channel::bounded::<()>(0);
        let (done_tx, done_rx) = channel::bounded::<()>(0);
        drop(done_tx);

        let outcome = subscribe_loop(&reader, &args, &shutdown, &done_rx).expect("subscribe");
        assert_eq!(outcome, Outcome::Completed);
    }

    #[test]
    fn test_publisher_stops_when_signalled() {
        let args = Args::try_parse_from(["minidds-hello", "publisher", "--period-ms", "60000"])
            .expect("parse");
        let participant = participant(&args).expect("participant");
        let writer = create_writer(&participant, &args).expect("writer");
        let (_tx, shutdown) = channel::bounded::<()>(0);
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        drop(stop_tx);

        let outcome = publish_loop(&writer, &args, &shutdown, &stop_rx).expect("publish");
        assert_eq!(outcome, Outcome::Interrupted);
    }

    #[test]
    fn test_publisher_stops_on_interrupt() {
        let args = Args::try_parse_from(["minidds-hello", "publisher", "--period-ms", "60000"])
            .expect("parse");
        let (tx, rx) = channel::bounded::<()>(0);
        drop(tx);

        let outcome = run_publisher(&args, &rx).expect("publisher run");
        assert_eq!(outcome, Outcome::Interrupted);
    }

    #[test]
    fn test_invalid_domain_reports_creation_error() {
        let args = Args::try_parse_from(["minidds-hello", "subscriber", "--domain", "500"])
            .expect("parse");
        let (_tx, rx) = channel::bounded::<()>(0);

        let err = run_subscriber(&args, &rx).expect_err("domain out of range");
        assert!(err.to_string().starts_with("Error creating subscriber: "));
    }
}
