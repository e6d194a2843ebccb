//! Stayframe command line tool.
//!
//! # Usage
//!
//! ```bash
//! # Replay a trace in virtual time, one JSON action per line on stdout
//! stayframe replay traces/booking.json
//!
//! # Replay with the original timing
//! stayframe replay traces/booking.json --realtime
//! ```

use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};
use stayframe_cli::{ReplaySummary, SystemEnv, Trace, replay};
use stayframe_harness::SimEnv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Stayframe host binding tools
#[derive(Parser, Debug)]
#[command(name = "stayframe")]
#[command(about = "Stayframe iframe host binding tools")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded host event trace and print the resulting actions
    Replay {
        /// Path to the trace file (JSON)
        trace: PathBuf,

        /// Wait out recorded delays instead of advancing a virtual clock
        #[arg(long)]
        realtime: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries the replayed actions
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match args.command {
        Command::Replay { trace, realtime } => {
            let loaded = Trace::load(&trace)?;
            tracing::info!(
                "Replaying {} events over {} ms from {}",
                loaded.events.len(),
                loaded.duration_ms(),
                trace.display()
            );

            let mut out = io::stdout().lock();
            let summary = if realtime {
                replay(SystemEnv::new(), &loaded, &mut out).await?
            } else {
                replay(SimEnv::new(), &loaded, &mut out).await?
            };
            log_summary(&summary);
        },
    }

    Ok(())
}

fn log_summary(summary: &ReplaySummary) {
    tracing::info!(
        "Replay finished: {} actions, {} timer ticks, height {}px (min {}px), {}",
        summary.actions,
        summary.ticks,
        summary.height,
        summary.min_height,
        if summary.stable { "stable" } else { "unstable" }
    );
}
