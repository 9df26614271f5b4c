use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use timedelay::core::{
    ActorId, ConfiguredClock, DelayQueue, KindRegistry, ManualClock, Message, QueueConfig,
};

#[derive(Parser)]
#[command(name = "timedelay-cli", version, about = "Delay queue tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run concurrent producers against one queue, then drain it.
    Simulate {
        /// JSON queue config; flags below override it
        #[arg(long = "config")]
        config: Option<PathBuf>,
        #[arg(long = "delay-ms")]
        delay_ms: Option<i64>,
        #[arg(long = "producers", default_value_t = 4)]
        producers: usize,
        #[arg(long = "messages", default_value_t = 1_000)]
        messages: usize,
        /// Make every Nth message transient
        #[arg(long = "transient-every")]
        transient_every: Option<usize>,
        #[arg(long = "lifetime-ms", default_value_t = 0)]
        lifetime_ms: u64,
        #[arg(long = "window-ms", default_value_t = 10)]
        window_ms: u64,
    },
    /// Peak load over operations logged at the given millisecond offsets.
    Peak {
        #[arg(long = "window-ms")]
        window_ms: u64,
        offsets: Vec<u64>,
    },
    /// List the built-in message kinds.
    Kinds,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate {
            config,
            delay_ms,
            producers,
            messages,
            transient_every,
            lifetime_ms,
            window_ms,
        } => {
            let mut queue_config = match config {
                Some(path) => QueueConfig::from_json_file(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => QueueConfig::default(),
            };
            if let Some(delay_ms) = delay_ms {
                queue_config.delay_ms = delay_ms;
            }
            let plan = SimulationPlan {
                producers,
                messages,
                transient_every,
                lifetime: Duration::from_millis(lifetime_ms),
                window: Duration::from_millis(window_ms),
            };
            cmd_simulate(&queue_config, &plan)
        }
        Commands::Peak { window_ms, offsets } => cmd_peak(window_ms, offsets),
        Commands::Kinds => {
            let registry = KindRegistry::new();
            for name in registry.names() {
                let kind = registry.resolve(name)?;
                println!("{:<16} {}", kind.name(), kind.description());
            }
            Ok(())
        }
    }
}

struct SimulationPlan {
    producers: usize,
    messages: usize,
    transient_every: Option<usize>,
    lifetime: Duration,
    window: Duration,
}

fn cmd_simulate(config: &QueueConfig, plan: &SimulationPlan) -> Result<()> {
    if plan.producers == 0 {
        bail!("at least one producer is required");
    }
    let queue: Arc<DelayQueue<ConfiguredClock>> =
        Arc::new(DelayQueue::from_config(config).context("invalid queue config")?);
    info!(
        "Simulating {} producers x {} messages, delay {:?}",
        plan.producers,
        plan.messages,
        queue.delay()
    );

    let consumer = ActorId::random();
    let started = Instant::now();
    let handles: Vec<_> = (0..plan.producers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let messages = plan.messages;
            let transient_every = plan.transient_every;
            let lifetime = plan.lifetime;
            thread::spawn(move || {
                let sender = ActorId::random();
                let mut accepted = 0usize;
                for i in 0..messages {
                    let body = format!("message {i} from {sender}");
                    let msg = match transient_every {
                        Some(every) if every > 0 && i % every == 0 => {
                            Message::transient(sender, consumer, body, lifetime)
                        }
                        _ => Message::new(sender, consumer, body),
                    };
                    if queue.submit(msg).is_accepted() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let mut accepted = 0usize;
    for handle in handles {
        accepted += handle
            .join()
            .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    }
    let submit_elapsed = started.elapsed();

    thread::sleep(queue.delay() + Duration::from_millis(1));
    let delivered = queue.retrieve_all();
    let stats = queue.stats();

    println!("accepted:   {accepted} in {submit_elapsed:?}");
    println!("delivered:  {}", delivered.len());
    println!("discarded:  {}", stats.discarded);
    println!("processed:  {}", queue.total_processed());
    println!(
        "peak load:  {} ops / {:?}",
        queue.peak_load(plan.window),
        plan.window
    );
    info!("{}", stats.summary());
    Ok(())
}

fn cmd_peak(window_ms: u64, mut offsets: Vec<u64>) -> Result<()> {
    offsets.sort_unstable();
    let clock = ManualClock::new(0);
    let queue = DelayQueue::with_clock(Duration::ZERO, clock.clone());
    for offset in &offsets {
        clock.set(offset.saturating_mul(1_000_000));
        let _ = queue.retrieve();
    }
    println!(
        "{}",
        queue.peak_load(Duration::from_millis(window_ms))
    );
    Ok(())
}
