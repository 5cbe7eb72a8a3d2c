use core::fmt;

use rf_core::{CompId, PortId};

use crate::linearization::Element;

/// What one successful update pass changed in the live graph.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UpdateReport {
    pub ports_created: Vec<PortId>,
    pub ports_rewired: Vec<PortId>,
    pub ports_retired: Vec<PortId>,
    pub components_created: Vec<CompId>,
    /// Retained by identity and settled in place.
    pub components_upgraded: Vec<CompId>,
    pub components_retired: Vec<CompId>,
    pub components_started: Vec<CompId>,
    /// Elements in the order the linearization yielded them.
    pub visited: Vec<Element>,
    pub elapsed_s: f64,
}

impl UpdateReport {
    /// True when the pass left the graph exactly as it was.
    pub fn is_noop(&self) -> bool {
        self.ports_created.is_empty()
            && self.ports_rewired.is_empty()
            && self.ports_retired.is_empty()
            && self.components_created.is_empty()
            && self.components_retired.is_empty()
            && self.components_started.is_empty()
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visited in {:.3}s; ports +{} ~{} -{}; components +{} ={} -{}; started {}",
            self.visited.len(),
            self.elapsed_s,
            self.ports_created.len(),
            self.ports_rewired.len(),
            self.ports_retired.len(),
            self.components_created.len(),
            self.components_upgraded.len(),
            self.components_retired.len(),
            self.components_started.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let report = UpdateReport {
            ports_rewired: vec![PortId::from("a")],
            components_created: vec![CompId::new("producer", "2")],
            components_retired: vec![CompId::new("producer", "1")],
            components_started: vec![CompId::new("producer", "2")],
            visited: vec![
                Element::component(CompId::new("producer", "1")),
                Element::port("a"),
            ],
            elapsed_s: 0.25,
            ..UpdateReport::default()
        };
        assert!(!report.is_noop());
        assert_eq!(
            report.to_string(),
            "2 visited in 0.250s; ports +0 ~1 -0; components +1 =0 -1; started 1"
        );
        assert!(UpdateReport::default().is_noop());
    }
}
