use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use keyspace_search::monitor::utils;
use keyspace_search::prelude::*;
use keyspace_search::{md5_hex, parse_packet_number};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "keyspace-search")]
#[command(about = "Packetised brute-force search for the password behind an MD5 digest")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: SearchOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchOptions {
    /// Target MD5 digest (32 hex characters)
    #[arg(short, long, global = true, conflicts_with = "password")]
    target: Option<String>,

    /// Known plaintext; its MD5 becomes the target
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// JSON or TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads per batch
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Character set preset: full, lowercase, alphanumeric, digits
    #[arg(long, global = true, conflicts_with = "alphabet")]
    charset: Option<String>,

    /// Custom ordered alphabet
    #[arg(long, global = true)]
    alphabet: Option<String>,

    /// Log progress lines instead of drawing a progress bar
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search job packets from the global packet sequence
    Packet {
        /// Packet number to start from
        number: String,
        /// Number of packets to search (default: 1)
        #[arg(
            short = 'n',
            long,
            conflicts_with = "all",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        count: Option<u64>,
        /// Keep going until a match or the end of the configured space
        #[arg(long)]
        all: bool,
    },
    /// Search one node's share of a single password length
    Node {
        /// Total number of nodes
        #[arg(long, default_value = "2")]
        nodes: usize,
        /// This node's index (0-based)
        #[arg(long)]
        index: usize,
        /// Password length to search
        #[arg(long)]
        length: usize,
        /// Scan one candidate at a time instead of in parallel batches
        #[arg(long)]
        sequential: bool,
    },
    /// List packets of the configured schedule
    Plan {
        /// First packet to list
        #[arg(long, default_value = "0")]
        from: u64,
        /// Number of packets to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Print the MD5 digest of a string
    Hash {
        text: String,
    },
}

fn load_config(options: &SearchOptions) -> Result<SearchConfig> {
    let mut config = match &options.config {
        Some(path) => SearchConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    };

    if let Some(workers) = options.workers {
        config.workers = workers;
    }
    if let Some(alphabet) = &options.alphabet {
        config.alphabet = alphabet.clone();
    } else if let Some(preset) = &options.charset {
        config.alphabet = Alphabet::preset(preset)?.to_string();
    }
    if options.no_progress {
        config.show_progress = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn resolve_target(options: &SearchOptions) -> Result<TargetDigest> {
    match (&options.target, &options.password) {
        (Some(hex), _) => TargetDigest::from_hex(hex).context("Invalid --target digest"),
        (None, Some(password)) => Ok(TargetDigest::of_password(password)),
        (None, None) => anyhow::bail!("Provide --target <MD5> or --password <TEXT>"),
    }
}

async fn run_search(config: SearchConfig, target: TargetDigest, job: SearchJob) -> Result<()> {
    let show_progress = config.show_progress;
    let session = Arc::new(SearchSession::new(config, target)?);
    let cancel = session.cancel_token();

    let logger = (!show_progress).then(|| {
        session.monitor().start();
        session.monitor().start_background_logging()
    });

    let mut search = tokio::spawn(Arc::clone(&session).run_async(job));
    let report = tokio::select! {
        joined = &mut search => joined??,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupt received; stopping after the current batch");
            cancel.cancel();
            search.await??
        }
    };

    if let Some(handle) = logger {
        if handle.join().is_err() {
            warn!("Progress logger thread panicked");
        }
    }

    print_report(&report, session.monitor().snapshot().packets_exhausted);
    Ok(())
}

fn print_report(report: &SessionReport, packets_exhausted: u64) {
    for summary in &report.packets {
        println!("  {} -> {:?} ({} attempts)", summary.packet, summary.state, summary.attempts);
    }

    let seconds = report.elapsed.as_secs_f64();
    let rate = if seconds > 0.0 { report.attempts as f64 / seconds } else { 0.0 };
    println!(
        "Attempts: {} in {} ({})",
        utils::format_number(report.attempts),
        utils::format_duration(report.elapsed),
        utils::format_rate(rate)
    );
    println!("Exhausted packets: {}", packets_exhausted);

    if let Some(result) = report.found() {
        println!("Password found: {:?}", result.password);
        println!("Digest: {}", result.digest);
        println!("Position: {}", result.position);
    } else if report.state == SearchState::Cancelled {
        let reached = report.result.as_ref().map_or("", |r| r.password.as_str());
        println!("Search cancelled (last candidate: {:?})", reached);
    } else if report.space_exhausted {
        println!("Search space exhausted: every length up to the configured maximum was tried");
    } else {
        println!("Packet completed - no match found");
    }
}

fn print_plan(config: &SearchConfig, from: u64, limit: usize, password: Option<&str>) -> Result<()> {
    let scheduler = PacketScheduler::new(
        Keyspace::new(config.build_alphabet()?),
        config.packet_capacity,
        config.max_password_length,
    );

    println!(
        "{} symbols, capacity {}, lengths 1..={}: {} packets",
        scheduler.keyspace().base(),
        scheduler.capacity(),
        scheduler.max_length(),
        utils::format_number(scheduler.packet_count())
    );
    for packet in scheduler.packets(from).take(limit) {
        println!("  {}", packet);
    }

    if let Some(password) = password {
        let located = scheduler
            .keyspace()
            .decode(password)
            .and_then(|position| scheduler.locate(password.len(), position).map(|n| (n, position)));
        match located {
            Some((number, position)) => {
                println!("{:?} is position {} in packet #{}", password, position, number)
            }
            None => println!("{:?} is outside the configured search space", password),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let Cli { options, command } = Cli::parse();

    match command {
        Commands::Hash { text } => {
            println!("{}", md5_hex(text.as_bytes()));
        }
        Commands::Plan { from, limit } => {
            let config = load_config(&options)?;
            print_plan(&config, from, limit, options.password.as_deref())?;
        }
        Commands::Packet { number, count, all } => {
            let Some(first) = parse_packet_number(&number) else {
                warn!("Ignoring malformed packet number {:?}", number);
                return Ok(());
            };
            let target = resolve_target(&options)?;
            let config = load_config(&options)?;
            let count = if all { None } else { Some(count.unwrap_or(1)) };

            info!("Target digest: {}", target);
            run_search(config, target, SearchJob::Packets { first, count }).await?;
        }
        Commands::Node {
            nodes,
            index,
            length,
            sequential,
        } => {
            let target = resolve_target(&options)?;
            let config = load_config(&options)?;
            let mode = if sequential { ScanMode::Sequential } else { ScanMode::Batched };

            info!("Target digest: {}", target);
            run_search(
                config,
                target,
                SearchJob::Node {
                    total_nodes: nodes,
                    node_index: index,
                    length,
                    mode,
                },
            )
            .await?;
        }
    }

    Ok(())
}
