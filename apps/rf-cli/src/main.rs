mod demo;
mod error;

use std::time::Duration;

use clap::{Parser, Subcommand};
use rf_core::RuntimeOptions;

use crate::demo::DemoConfig;
use crate::error::CliResult;

#[derive(Parser)]
#[command(name = "rf-cli")]
#[command(about = "Reflow CLI - live-updatable dataflow graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a producer -> buffer -> consumer pipeline and upgrade its producer live
    Demo {
        /// Buffer capacity
        #[arg(long, default_value_t = 10)]
        capacity: usize,
        /// Producer value ranges, one graph version per entry
        #[arg(long, value_delimiter = ',', default_value = "10,1000,50")]
        ranges: Vec<u32>,
        /// Time between two updates, in milliseconds
        #[arg(long, default_value_t = 3000)]
        interval_ms: u64,
        /// Consumer work time per value, in milliseconds
        #[arg(long, default_value_t = 250)]
        consume_delay_ms: u64,
        /// Bound on blocking port operations (defaults to RF_IO_TIMEOUT_MS, then 2000)
        #[arg(long)]
        io_timeout_ms: Option<u64>,
        /// Print update outcomes as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            capacity,
            ranges,
            interval_ms,
            consume_delay_ms,
            io_timeout_ms,
            json,
        } => {
            let options = match io_timeout_ms {
                Some(ms) => RuntimeOptions::new(Duration::from_millis(ms))?,
                None => RuntimeOptions::from_env()?,
            };
            demo::run(&DemoConfig {
                capacity,
                ranges,
                interval: Duration::from_millis(interval_ms),
                consume_delay: Duration::from_millis(consume_delay_ms),
                options,
                json,
            })
        }
    }
}
