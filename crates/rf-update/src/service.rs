//! Control thread that owns the live graph and applies revisions on demand.
//!
//! The orchestrator never polls for new versions. An application builds a
//! candidate graph and submits it through an [`UpdateHandle`]; passes run one
//! at a time, in submission order, and each produces an [`UpdateOutcome`].

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use rf_graph::Graph;
use tracing::{error, info};

use crate::error::{UpdateError, UpdateResult};
use crate::linearization::Linearization;
use crate::orchestrator::apply_update;
use crate::report::UpdateReport;

const THREAD_NAME: &str = "rf-update";

/// A candidate graph together with the drain order for reaching it.
pub struct Revision<T> {
    pub label: String,
    pub candidate: Graph<T>,
    pub order: Box<dyn Linearization<T> + Send>,
}

impl<T> Revision<T> {
    pub fn new(
        label: impl Into<String>,
        candidate: Graph<T>,
        order: impl Linearization<T> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            candidate,
            order: Box::new(order),
        }
    }
}

/// Result of one submitted revision.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub label: String,
    pub result: UpdateResult<UpdateReport>,
}

enum Command<T> {
    Apply(Revision<T>),
    Shutdown,
}

/// Entry point for running a graph under update control.
pub struct UpdateService;

impl UpdateService {
    /// Start every component of `graph`, then hand the graph to a new control
    /// thread.
    pub fn spawn<T: Send + 'static>(graph: Graph<T>) -> UpdateResult<UpdateHandle<T>> {
        if let Err(err) = graph.start() {
            // Components started before the failing one must not linger.
            graph.shutdown();
            return Err(err.into());
        }

        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (outcome_tx, outcomes) = crossbeam_channel::unbounded();
        let join = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || control_loop(graph, command_rx, outcome_tx));

        match join {
            Ok(join) => Ok(UpdateHandle {
                commands,
                outcomes,
                join: Some(join),
            }),
            Err(err) => Err(UpdateError::ControlThread(err)),
        }
    }
}

/// Handle to a running control thread.
///
/// Dropping the handle shuts the service down and waits for it.
pub struct UpdateHandle<T> {
    commands: Sender<Command<T>>,
    outcomes: Receiver<UpdateOutcome>,
    join: Option<JoinHandle<Graph<T>>>,
}

impl<T> UpdateHandle<T> {
    /// Queue a revision. Returns once it is queued, not once it is applied.
    pub fn submit(&self, revision: Revision<T>) -> UpdateResult<()> {
        self.commands
            .send(Command::Apply(revision))
            .map_err(|_| UpdateError::ServiceClosed)
    }

    /// One outcome per submitted revision, in submission order.
    pub fn outcomes(&self) -> &Receiver<UpdateOutcome> {
        &self.outcomes
    }

    /// Stop every component, wait for the control thread and return the
    /// graph as the last pass left it.
    pub fn shutdown(mut self) -> UpdateResult<Graph<T>> {
        let _ = self.commands.send(Command::Shutdown);
        let join = self.join.take().ok_or(UpdateError::ServiceClosed)?;
        join.join().map_err(|_| UpdateError::ServiceClosed)
    }
}

impl<T> Drop for UpdateHandle<T> {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.commands.send(Command::Shutdown);
            if join.join().is_err() {
                error!("update control thread panicked");
            }
        }
    }
}

fn control_loop<T: Send + 'static>(
    mut graph: Graph<T>,
    commands: Receiver<Command<T>>,
    outcomes: Sender<UpdateOutcome>,
) -> Graph<T> {
    info!(
        components = graph.component_count(),
        ports = graph.port_count(),
        "update service running"
    );
    for command in commands.iter() {
        let revision = match command {
            Command::Apply(revision) => revision,
            Command::Shutdown => break,
        };
        let Revision {
            label,
            candidate,
            order,
        } = revision;
        info!(revision = %label, "applying revision");
        let result = apply_update(&mut graph, candidate, order);
        if let Err(err) = &result {
            error!(revision = %label, error = %err, "revision failed; graph left partially updated");
        }
        // Nobody listening is fine; the outcome is also in the log.
        let _ = outcomes.send(UpdateOutcome { label, result });
    }
    graph.shutdown();
    info!("update service stopped");
    graph
}
