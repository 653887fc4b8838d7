//! ontokb feed host
//!
//! Loads an optional snapshot, reads update statements from stdin and
//! drives the engine's feed and periodic units at the configured rates.
//! Notifications, echoes and explanations are printed to stdout.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ontokb::{Event, FeedStatus, KnowledgeEngine, Ontology, OntologyConfig};

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    save: Option<PathBuf>,
    name: Option<String>,
}

fn usage() -> ! {
    eprintln!("usage: ontokb-feed [--config FILE] [--snapshot FILE] [--save FILE] [--name NAME]");
    std::process::exit(2);
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        let mut value = || it.next().unwrap_or_else(|| usage());
        match flag.as_str() {
            "--config" | "-c" => args.config = Some(PathBuf::from(value())),
            "--snapshot" | "-s" => args.snapshot = Some(PathBuf::from(value())),
            "--save" => args.save = Some(PathBuf::from(value())),
            "--name" | "-n" => args.name = Some(value()),
            _ => usage(),
        }
    }
    args
}

fn period(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)))
}

fn print(event: &Event) {
    match event {
        Event::Notification(n) => println!("{n}"),
        Event::Explanation(e) => println!("explain {} <- {}", e.fact, e.cause),
        Event::Echo(statement) => println!("echo {statement}"),
        Event::BatchEnd => println!("end"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    let mut config = match &args.config {
        Some(path) => OntologyConfig::from_file(path).unwrap_or_else(|err| {
            error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }),
        None => OntologyConfig::default(),
    };
    if args.name.is_some() {
        config.name.clone_from(&args.name);
    }

    let feed_period = period(config.feeder_rate_hz);
    let periodic_period = period(config.periodic_rate_hz);
    let ontology = Ontology::new(config);
    if let Some(path) = &args.snapshot {
        let status = ontology.read_from_file(path);
        info!(path = %path.display(), code = status.code(), "snapshot read");
    }

    let engine = Arc::new(KnowledgeEngine::with_ontology(Arc::new(ontology)));
    let stream = engine.subscribe();
    engine.close();

    let input_done = Arc::new(AtomicBool::new(false));
    let reader = {
        let engine = Arc::clone(&engine);
        let input_done = Arc::clone(&input_done);
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines().map_while(Result::ok) {
                if !line.trim().is_empty() {
                    engine.store(&line);
                }
            }
            input_done.store(true, Ordering::SeqCst);
        })
    };

    let mut next_feed = Instant::now();
    loop {
        let now = Instant::now();
        if now >= next_feed {
            let status = engine.feed_once();
            next_feed = now + feed_period;
            if status == FeedStatus::Idle && input_done.load(Ordering::SeqCst) && !engine.has_pending() {
                break;
            }
        }
        engine.periodic_once();
        for event in stream.drain() {
            print(&event);
        }
        thread::sleep(periodic_period.min(feed_period));
    }
    for event in stream.drain() {
        print(&event);
    }
    let _ = reader.join();

    if let Some(path) = &args.save {
        if let Err(err) = engine.ontology().save(path) {
            error!(error = %err, "snapshot not saved");
            std::process::exit(1);
        }
    }
}
