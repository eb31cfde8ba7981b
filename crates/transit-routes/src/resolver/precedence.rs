//! Normalization of resolved relationships
//!
//! Every step here is idempotent; the planner reruns them after any stage that
//! injects edges.

use crate::models::{EntityId, RouteTarget};
use crate::topology::Topology;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Collapse inspectors that point back at the entity itself or at the target
///
/// A route inspected by its own source or destination has no third party to
/// transit, so it is the plain route.
pub(crate) fn collapse_degenerate_inspectors(topology: &mut Topology, id: EntityId) -> usize {
    let entity = topology.get_mut(id);
    let mut collapsed = 0;
    let degenerate = |route: &RouteTarget| {
        route
            .inspector
            .is_some_and(|inspector| inspector == id || inspector == route.target)
    };
    for route in entity.propagations.iter_mut() {
        if degenerate(route) {
            route.inspector = None;
            collapsed += 1;
        }
    }
    for route in entity.static_routes.iter_mut() {
        if degenerate(&route.route_target()) {
            route.inspector = None;
            collapsed += 1;
        }
    }
    if let Some(route) = entity.default_route.as_mut() {
        if degenerate(route) {
            route.inspector = None;
            collapsed += 1;
        }
    }
    collapsed
}

/// Remove exact duplicates, keeping first occurrences in order
pub(crate) fn dedup(topology: &mut Topology, id: EntityId) {
    let entity = topology.get_mut(id);

    let mut seen = HashSet::new();
    entity.propagations.retain(|route| seen.insert(*route));

    let mut seen = HashSet::new();
    entity.static_routes.retain(|route| seen.insert(*route));

    let mut seen = HashSet::new();
    entity.blackhole_cidrs.retain(|cidr| seen.insert(*cidr));
}

/// Keep only the inspected variant for targets that have one
///
/// An inspected default route counts as the inspected variant for its target.
/// Two different inspectors for one target cannot be reconciled and are
/// reported instead of picking one.
pub(crate) fn prefer_inspected(topology: &mut Topology, id: EntityId) -> Result<()> {
    let mut inspectors: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();
    let entity = topology.get(id);
    for route in entity.propagations.iter().chain(&entity.default_route) {
        if let Some(inspector) = route.inspector {
            inspectors.entry(route.target).or_default().insert(inspector);
        }
    }

    if let Some((target, declared)) = inspectors.iter().find(|(_, set)| set.len() > 1) {
        let err = ambiguous(topology, id, *target, declared.iter().copied());
        warn!(error = %err, "Conflicting inspectors");
        return Err(err);
    }

    let entity = topology.get_mut(id);
    let before = entity.propagations.len();
    entity
        .propagations
        .retain(|route| route.is_inspected() || !inspectors.contains_key(&route.target));
    let dropped = before - entity.propagations.len();
    if dropped > 0 {
        debug!(entity = %entity.name, dropped, "Preferred inspected propagations");
    }
    Ok(())
}

/// Drop routes whose target is the entity itself
pub(crate) fn remove_self_references(topology: &mut Topology, id: EntityId) -> usize {
    let entity = topology.get_mut(id);
    let before = entity.propagations.len() + entity.static_routes.len();

    entity.propagations.retain(|route| route.target != id);
    entity.static_routes.retain(|route| route.target != id);
    let mut removed = before - entity.propagations.len() - entity.static_routes.len();

    if entity.default_route.is_some_and(|route| route.target == id) {
        entity.default_route = None;
        removed += 1;
    }
    if removed > 0 {
        debug!(entity = %entity.name, removed, "Removed self references");
    }
    removed
}

/// Drop a default route superseded by an inspected propagation to the same target
///
/// Returns whether the default route was removed. An inspected default whose
/// target also has an inspected propagation through a different inspector is
/// ambiguous.
pub(crate) fn suppress_overridden_default(topology: &mut Topology, id: EntityId) -> Result<bool> {
    let entity = topology.get(id);
    let Some(default) = entity.default_route else {
        return Ok(false);
    };
    let competing: BTreeSet<EntityId> = entity
        .propagations
        .iter()
        .filter(|route| route.target == default.target)
        .filter_map(|route| route.inspector)
        .collect();

    if competing.is_empty() {
        return Ok(false);
    }

    match default.inspector {
        None => {
            debug!(
                entity = %entity.name,
                target = %topology.name(default.target),
                "Default route superseded by inspected propagation"
            );
            topology.get_mut(id).default_route = None;
            Ok(true)
        }
        Some(inspector) if competing.len() == 1 && competing.contains(&inspector) => Ok(false),
        Some(inspector) => {
            let mut declared = competing;
            declared.insert(inspector);
            let err = ambiguous(topology, id, default.target, declared.into_iter());
            warn!(error = %err, "Default route and propagation disagree on inspector");
            Err(err)
        }
    }
}

fn ambiguous(
    topology: &Topology,
    id: EntityId,
    target: EntityId,
    inspectors: impl Iterator<Item = EntityId>,
) -> Error {
    let mut names: Vec<String> = inspectors
        .map(|inspector| topology.name(inspector).to_string())
        .collect();
    names.sort();
    Error::AmbiguousInspection {
        entity: topology.name(id).to_string(),
        target: topology.name(target).to_string(),
        inspectors: names,
    }
}
