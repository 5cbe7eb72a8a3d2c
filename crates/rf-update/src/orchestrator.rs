//! The update pass: reconcile a running graph with a candidate version.
//!
//! A pass runs in four phases:
//!
//! 1. Reset: every live component is marked unsettled.
//! 2. Creation: ports and components that only exist in the candidate are
//!    inserted into the live graph (not started). For ports present in both,
//!    the candidate copy is marked unsettled so that new components holding
//!    it cannot start before the live port has been rewired.
//! 3. Linearization: each element is either reconciled (port rewired,
//!    component settled in place) or retired (port removed, component
//!    stopped and removed). After every element, startable components are
//!    started.
//! 4. Settle: every remaining component must have been settled.
//!
//! Identity equality is the only criterion for keeping a component: a
//! retained component is never stopped and its live entry never replaced.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use rf_core::{CompId, PortId};
use rf_graph::Graph;
use tracing::{debug, error, info, warn};

use crate::error::{UpdateError, UpdateResult};
use crate::linearization::{Element, Linearization};
use crate::report::UpdateReport;

/// Run one update pass, moving `live` towards `candidate` in the order
/// `order` dictates.
///
/// On error the pass stops where it is. Elements already processed stay
/// processed and nothing is rolled back; the only exception is
/// [`UpdateError::PortLayoutChanged`], which is detected before any
/// mutation.
pub fn apply_update<T, L>(
    live: &mut Graph<T>,
    candidate: Graph<T>,
    mut order: L,
) -> UpdateResult<UpdateReport>
where
    T: Send + 'static,
    L: Linearization<T>,
{
    let started = Instant::now();
    info!(
        live_components = live.component_count(),
        candidate_components = candidate.component_count(),
        "update pass started"
    );

    let result = run_pass(live, &candidate, &mut order, started);
    match &result {
        Ok(report) => info!(
            visited = report.visited.len(),
            started = report.components_started.len(),
            retired = report.components_retired.len(),
            elapsed_s = report.elapsed_s,
            "update pass complete"
        ),
        Err(err) => error!(error = %err, "update pass aborted"),
    }
    result
}

fn run_pass<T, L>(
    live: &mut Graph<T>,
    candidate: &Graph<T>,
    order: &mut L,
    started: Instant,
) -> UpdateResult<UpdateReport>
where
    T: Send + 'static,
    L: Linearization<T>,
{
    preflight(live, candidate)?;

    let mut report = UpdateReport::default();

    for comp in live.components() {
        comp.mark_unsettled();
    }

    for port in candidate.ports() {
        if live.contains_port(port.id()) {
            port.mark_unsettled();
        } else {
            debug!(port = %port.id(), "port created");
            report.ports_created.push(port.id().clone());
            live.insert_port(Arc::clone(port));
        }
    }
    for comp in candidate.components() {
        if !live.contains_component(comp.id()) {
            debug!(component = %comp.id(), "component created");
            report.components_created.push(comp.id().clone());
            live.insert_component(Arc::clone(comp));
        }
    }

    let mut seen = BTreeSet::new();
    while let Some(element) = order.next_element(live)? {
        if !seen.insert(element.clone()) {
            warn!(element = %element, "element visited twice");
            return Err(UpdateError::DuplicateVisit(element));
        }
        match &element {
            Element::Port(id) => visit_port(live, candidate, id, &mut report)?,
            Element::Component(id) => visit_component(live, candidate, id, &mut report)?,
        }
        report.visited.push(element);
        start_startable(live, &mut report)?;
    }

    let unsettled: Vec<CompId> = live
        .components()
        .filter(|comp| comp.settle().is_err())
        .map(|comp| comp.id().clone())
        .collect();
    if !unsettled.is_empty() {
        warn!(count = unsettled.len(), "components left unsettled");
        return Err(UpdateError::Unsettled(unsettled));
    }

    for id in live.port_ids().filter(|id| !candidate.contains_port(id)) {
        warn!(port = %id, "port absent from the candidate was never retired");
    }

    report.elapsed_s = started.elapsed().as_secs_f64();
    Ok(report)
}

/// A retained component runs the same code, so its port wiring cannot change
/// in place. Checking this up front also guarantees that every endpoint a
/// rewire introduces is a component inserted by this pass.
fn preflight<T>(live: &Graph<T>, candidate: &Graph<T>) -> UpdateResult<()> {
    for next in candidate.components() {
        let Some(current) = live.component(next.id()) else {
            continue;
        };
        let (live_ports, candidate_ports) = (current.port_ids(), next.port_ids());
        if live_ports != candidate_ports || current.num_inputs() != next.num_inputs() {
            warn!(component = %next.id(), "retained component changes its port layout");
            return Err(UpdateError::PortLayoutChanged {
                comp: next.id().clone(),
                live: live_ports,
                candidate: candidate_ports,
            });
        }
    }
    Ok(())
}

fn visit_port<T>(
    live: &mut Graph<T>,
    candidate: &Graph<T>,
    id: &PortId,
    report: &mut UpdateReport,
) -> UpdateResult<()> {
    let Some(port) = live.port(id) else {
        return Err(UpdateError::UnknownElement(Element::Port(id.clone())));
    };
    match candidate.port(id) {
        Some(target) => {
            if !Arc::ptr_eq(port, target) && port.rewire(target) {
                debug!(
                    port = %id,
                    producer = ?port.producer_id(),
                    consumer = ?port.consumer_id(),
                    "port rewired"
                );
                report.ports_rewired.push(id.clone());
            }
            port.mark_settled();
        }
        None => {
            debug!(port = %id, "port retired");
            live.remove_port(id);
            report.ports_retired.push(id.clone());
        }
    }
    Ok(())
}

fn visit_component<T>(
    live: &mut Graph<T>,
    candidate: &Graph<T>,
    id: &CompId,
    report: &mut UpdateReport,
) -> UpdateResult<()> {
    let Some(comp) = live.component(id) else {
        return Err(UpdateError::UnknownElement(Element::Component(id.clone())));
    };
    if candidate.contains_component(id) {
        comp.mark_settled();
        if !report.components_created.contains(id) {
            debug!(component = %id, "component settled in place");
            report.components_upgraded.push(id.clone());
        }
    } else {
        comp.stop();
        debug!(component = %id, "component retired");
        live.remove_component(id);
        report.components_retired.push(id.clone());
    }
    Ok(())
}

/// Start every component that is startable, in id order.
fn start_startable<T: Send + 'static>(
    live: &Graph<T>,
    report: &mut UpdateReport,
) -> UpdateResult<()> {
    for comp in live.components().filter(|comp| comp.startable()) {
        comp.start()?;
        info!(component = %comp.id(), "component started");
        report.components_started.push(comp.id().clone());
    }
    Ok(())
}
