use crate::feeder::Statement;
use crate::ontology::Ontology;

use super::{Capabilities, Reasoner, ReasonerOutput};

/// Implements every hook and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneReasoner;

impl Reasoner for NoneReasoner {
    fn name(&self) -> &str {
        "none"
    }

    fn description(&self) -> &str {
        "This reasoner is designed to test the plugin lifecycle: it implements every hook and changes nothing."
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn pre_reason(&mut self, _ontology: &Ontology, _statement: &Statement, _out: &mut ReasonerOutput) -> bool {
        true
    }

    fn post_reason(&mut self, _ontology: &Ontology, _out: &mut ReasonerOutput) {}

    fn periodic_reason(&mut self, _ontology: &Ontology, _out: &mut ReasonerOutput) -> bool {
        false
    }
}
