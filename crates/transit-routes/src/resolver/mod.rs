//! Relationship resolution
//!
//! Turns the declared route intents of every entity into a symmetric,
//! deduplicated, precedence-resolved propagation graph, in place.
//!
//! # Stages
//!
//! - **Validation**: every declared inspector must be able to inspect
//! - **Pass 1**: declared propagations get return paths and inspector fan-out
//! - **Pass 2**: default routes get return paths the same way
//! - **Normalization**: dedup, inspection precedence, self-reference removal
//! - **Default precedence**: an inspected propagation supersedes an uninspected
//!   default route to the same target

mod precedence;
mod relationships;

use crate::topology::Topology;
use crate::Result;
use tracing::{debug, instrument, warn};

/// Builds and normalizes the propagation graph
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipResolver;

impl RelationshipResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every entity's relationships in place
    ///
    /// Fails before mutating anything when an inspector is invalid. Running it
    /// again on an already resolved topology changes nothing.
    #[instrument(skip(self, topology), fields(entities = topology.len()))]
    pub fn resolve(&self, topology: &mut Topology) -> Result<()> {
        if let Err(err) = relationships::validate_inspection(topology) {
            warn!(error = %err, "Rejected inspector");
            return Err(err);
        }

        relationships::symmetrize_propagations(topology);
        relationships::symmetrize_defaults(topology);
        self.normalize(topology)?;

        let mut suppressed = 0;
        for id in topology.ids().collect::<Vec<_>>() {
            if precedence::suppress_overridden_default(topology, id)? {
                suppressed += 1;
            }
        }
        debug!(suppressed, "Resolved relationships");
        Ok(())
    }

    /// Dedup, inspection precedence and self-reference removal
    ///
    /// Safe to rerun at any point; the hub planner calls it again after its
    /// static-route stage injects new edges.
    pub fn normalize(&self, topology: &mut Topology) -> Result<()> {
        for id in topology.ids().collect::<Vec<_>>() {
            precedence::collapse_degenerate_inspectors(topology, id);
            precedence::dedup(topology, id);
            precedence::prefer_inspected(topology, id)?;
            precedence::remove_self_references(topology, id);
        }
        Ok(())
    }
}
