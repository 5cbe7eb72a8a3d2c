//! Random producer -> buffer -> printing consumer, upgraded live.
//!
//! Each version swaps in a producer with a different value range. The
//! buffer and the consumer keep their identity, so they run uninterrupted
//! across every update.

use std::thread;
use std::time::Duration;

use rand::Rng;
use rf_components::Buffer;
use rf_core::{CompId, RuntimeOptions};
use rf_graph::{Active, ComponentError, Graph, GraphBuilder, RunContext};
use rf_update::{DrainOrder, Revision, UpdateError, UpdateOutcome, UpdateReport, UpdateService};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

/// Settings for one demo run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub capacity: usize,
    pub ranges: Vec<u32>,
    pub interval: Duration,
    pub consume_delay: Duration,
    pub options: RuntimeOptions,
    pub json: bool,
}

/// Emits uniformly random integers in `0..range`.
struct RangeProducer {
    range: u32,
}

impl Active<u32> for RangeProducer {
    fn run(&self, ctx: &RunContext<u32>) -> Result<(), ComponentError> {
        let mut rng = rand::rng();
        while ctx.is_running() {
            let value = rng.random_range(0..self.range);
            debug!(component = %ctx.id(), value, "produced");
            ctx.send(0, value)?;
        }
        Ok(())
    }
}

/// Logs every value, then sleeps to simulate work.
struct PrintConsumer {
    delay: Duration,
}

impl Active<u32> for PrintConsumer {
    fn run(&self, ctx: &RunContext<u32>) -> Result<(), ComponentError> {
        while ctx.is_running() {
            if let Some(value) = ctx.recv(0)? {
                info!(component = %ctx.id(), value, "consumed");
                ctx.pause(self.delay);
            }
        }
        Ok(())
    }
}

fn producer_id(range: u32) -> CompId {
    CompId::new("producer", format!("range-{range}"))
}

fn buffer_id() -> CompId {
    CompId::new("buffer", "1")
}

fn consumer_id() -> CompId {
    CompId::new("consumer", "1")
}

/// `producer -a-> buffer -b-> consumer` for one producer range.
fn build_version(config: &DemoConfig, range: u32) -> CliResult<Graph<u32>> {
    let mut b = GraphBuilder::with_options(config.options);
    let a = b.add_port("a")?;
    let c = b.add_port("b")?;
    b.add_active(producer_id(range), RangeProducer { range }, 0, &[a.clone()])?;
    b.add_passive(buffer_id(), Buffer::new(config.capacity)?, 1, &[a, c.clone()])?;
    b.add_active(
        consumer_id(),
        PrintConsumer {
            delay: config.consume_delay,
        },
        1,
        &[c],
    )?;
    Ok(b.build()?)
}

/// Stop the old producer, let the buffer drain, then reconcile downstream.
fn drain_order(previous: CompId, replaced: bool) -> DrainOrder<u32> {
    let order = DrainOrder::new()
        .poll_interval(Duration::from_millis(50))
        .component(previous)
        .port("a");
    // A retained producer keeps filling the buffer, so only wait on a swap.
    let order = if replaced {
        order.wait_until("buffer drained", |g| {
            g.component(&buffer_id()).is_none_or(|c| c.size() == 0)
        })
    } else {
        order
    };
    order
        .component(buffer_id())
        .port("b")
        .component(consumer_id())
}

#[derive(Serialize)]
struct OutcomeLine<'a> {
    label: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a UpdateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn print_outcome(outcome: &UpdateOutcome, json: bool) -> CliResult<()> {
    if json {
        let line = OutcomeLine {
            label: &outcome.label,
            ok: outcome.result.is_ok(),
            report: outcome.result.as_ref().ok(),
            error: outcome.result.as_ref().err().map(ToString::to_string),
        };
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }
    match &outcome.result {
        Ok(report) => {
            println!("✓ {}: {}", outcome.label, report);
            for id in &report.components_retired {
                println!("  retired {id}");
            }
            for id in &report.components_started {
                println!("  started {id}");
            }
        }
        Err(err) => println!("✗ {}: {}", outcome.label, err),
    }
    Ok(())
}

pub fn run(config: &DemoConfig) -> CliResult<()> {
    let (&first, rest) = config.ranges.split_first().ok_or(CliError::InvalidRanges)?;
    if config.ranges.contains(&0) {
        return Err(CliError::InvalidRanges);
    }

    info!(
        capacity = config.capacity,
        versions = config.ranges.len(),
        io_timeout = ?config.options.io_timeout,
        "starting demo"
    );
    let handle = UpdateService::spawn(build_version(config, first)?)?;

    let mut current = producer_id(first);
    for (i, &range) in rest.iter().enumerate() {
        thread::sleep(config.interval);

        let next = producer_id(range);
        let label = format!("v{} ({next})", i + 2);
        let order = drain_order(current.clone(), next != current);
        handle.submit(Revision::new(label, build_version(config, range)?, order))?;

        let outcome = handle
            .outcomes()
            .recv()
            .map_err(|_| UpdateError::ServiceClosed)?;
        print_outcome(&outcome, config.json)?;
        if outcome.result.is_ok() {
            current = next;
        }
    }

    thread::sleep(config.interval);
    let graph = handle.shutdown()?;
    info!(components = graph.component_count(), "demo finished");
    Ok(())
}
