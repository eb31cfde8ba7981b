//! Relationship building: inspector validation and symmetric closure

use crate::models::{EntityId, EntityStyle, RouteTarget};
use crate::topology::Topology;
use crate::{Error, Result};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Kind of route an inspector was declared on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    Propagation,
    Static,
    Default,
}

/// Check every declared inspector before anything is mutated
///
/// Inspected routes never end at a VPN. An inspected propagation needs address
/// blocks on both ends, since each side ends up with a route to the other's
/// block through the inspector. The source is exempt when the target's own
/// inspected default route already leads back to it. Static and default routes
/// only need a block on the source, which receives the return route.
pub(crate) fn validate_inspection(topology: &Topology) -> Result<()> {
    for (id, entity) in topology.iter() {
        for route in &entity.propagations {
            check_inspected(topology, id, route, RouteKind::Propagation)?;
        }
        for route in &entity.static_routes {
            check_inspected(topology, id, &route.route_target(), RouteKind::Static)?;
        }
        if let Some(route) = &entity.default_route {
            check_inspected(topology, id, route, RouteKind::Default)?;
        }
    }
    Ok(())
}

fn check_inspected(
    topology: &Topology,
    from: EntityId,
    route: &RouteTarget,
    kind: RouteKind,
) -> Result<()> {
    let Some(inspector_id) = route.inspector else {
        return Ok(());
    };
    let source = topology.get(from);
    let target = topology.get(route.target);
    let inspector = topology.get(inspector_id);
    let unsupported = |reason: String| {
        Error::unsupported(&source.name, &target.name, &inspector.name, reason)
    };

    if !inspector.style.is_vpc() {
        return Err(unsupported(format!(
            "inspection by a {} attachment is not supported",
            inspector.style
        )));
    }
    if !inspector.inspects {
        return Err(Error::InspectorNotCapable {
            entity: source.name.clone(),
            target: target.name.clone(),
            inspector: inspector.name.clone(),
        });
    }

    for endpoint in [source, target] {
        if endpoint.style == EntityStyle::Vpn {
            return Err(unsupported(format!(
                "{} is a vpn attachment and cannot be inspected",
                endpoint.name
            )));
        }
    }

    let mut needs_block = Vec::with_capacity(2);
    let returns_by_default =
        target.default_route == Some(RouteTarget::inspected(from, inspector_id));
    if kind != RouteKind::Propagation || !returns_by_default {
        needs_block.push(source);
    }
    if kind == RouteKind::Propagation {
        needs_block.push(target);
    }
    for endpoint in needs_block {
        if endpoint.cidr.is_none() {
            return Err(unsupported(format!(
                "{} is a {} attachment with no address block",
                endpoint.name, endpoint.style
            )));
        }
    }
    Ok(())
}

/// Working copy of every entity's propagations for one pass
///
/// Edges are written here and swapped back into the topology when the pass
/// ends, so no entity's list changes while another pass reads it. An inspected
/// default route stands in for its source's edge to the target, so that edge
/// is never added as a propagation.
pub(crate) struct EdgeSet {
    edges: Vec<Vec<RouteTarget>>,
    defaults: Vec<Option<RouteTarget>>,
    seen: HashSet<(EntityId, RouteTarget)>,
    pending: VecDeque<(EntityId, RouteTarget)>,
    added: usize,
}

impl EdgeSet {
    /// Snapshot the current propagations
    pub(crate) fn snapshot(topology: &Topology) -> Self {
        let mut seen = HashSet::new();
        let defaults = topology
            .iter()
            .map(|(_, entity)| entity.default_route.filter(RouteTarget::is_inspected))
            .collect();
        let edges = topology
            .iter()
            .map(|(id, entity)| {
                for route in &entity.propagations {
                    seen.insert((id, *route));
                }
                entity.propagations.clone()
            })
            .collect();
        Self {
            edges,
            defaults,
            seen,
            pending: VecDeque::new(),
            added: 0,
        }
    }

    /// Insert an edge; new edges are queued so their own mirrors get built
    fn insert(&mut self, from: EntityId, route: RouteTarget) {
        if self.defaults[from.index()] == Some(route) {
            return;
        }
        if self.seen.insert((from, route)) {
            self.edges[from.index()].push(route);
            self.pending.push_back((from, route));
            self.added += 1;
        }
    }

    /// Add the edges a relationship `from -> route` implies
    ///
    /// The target learns a path back with the same inspector, and an inspector
    /// learns both ends.
    pub(crate) fn mirror(&mut self, from: EntityId, route: RouteTarget) {
        self.insert(route.target, RouteTarget::new(from, route.inspector));
        if let Some(inspector) = route.inspector {
            self.insert(inspector, RouteTarget::direct(from));
            self.insert(inspector, RouteTarget::direct(route.target));
        }
    }

    /// Mirror queued edges until nothing new appears
    pub(crate) fn close(&mut self) {
        while let Some((from, route)) = self.pending.pop_front() {
            self.mirror(from, route);
        }
    }

    /// Write the pass result back, returning how many edges were added
    pub(crate) fn commit(self, topology: &mut Topology) -> usize {
        for (index, edges) in self.edges.into_iter().enumerate() {
            topology.get_mut(EntityId(index)).propagations = edges;
        }
        self.added
    }
}

/// Pass 1: symmetrize declared propagations
pub(crate) fn symmetrize_propagations(topology: &mut Topology) -> usize {
    let mut edges = EdgeSet::snapshot(topology);
    let seeds: Vec<(EntityId, RouteTarget)> = topology
        .iter()
        .flat_map(|(id, entity)| entity.propagations.iter().map(move |route| (id, *route)))
        .collect();
    for (from, route) in seeds {
        edges.mirror(from, route);
    }
    edges.close();
    let added = edges.commit(topology);
    debug!(added, "Symmetrized propagations");
    added
}

/// Pass 2: give every default route a path back
///
/// The default route itself stays a default route; only the edges it implies
/// on the target and the inspector are added. An inspected default never comes
/// back to its source as an inspected propagation.
pub(crate) fn symmetrize_defaults(topology: &mut Topology) -> usize {
    let mut edges = EdgeSet::snapshot(topology);
    let seeds: Vec<(EntityId, RouteTarget)> = topology
        .iter()
        .filter_map(|(id, entity)| entity.default_route.map(|route| (id, route)))
        .collect();
    for (from, route) in seeds {
        edges.mirror(from, route);
    }
    edges.close();
    let added = edges.commit(topology);
    debug!(added, "Symmetrized default routes");
    added
}
