//! Hub route planning
//!
//! Phase A realizes declared static routes, default routes and blackholes and
//! injects the return edges they imply. Phase B realizes the propagation graph
//! that survives re-normalization.

use super::ids::ActionIds;
use crate::models::{EntityId, HubAction, RouteOrigin, RouteTarget, DEFAULT_DESTINATION};
use crate::topology::Topology;
use crate::{Error, Result};
use ipnet::Ipv4Net;
use tracing::{debug, instrument, warn};

/// Emits hub route table actions for a resolved topology
#[derive(Debug, Clone, Copy)]
pub(crate) struct HubRoutePlanner {
    ids: ActionIds,
}

impl HubRoutePlanner {
    pub(crate) fn new(ids: ActionIds) -> Self {
        Self { ids }
    }

    /// Phase A: static routes, then the default route, then blackholes
    ///
    /// Return edges are collected while walking every entity and applied once
    /// the walk is done.
    #[instrument(skip(self, topology), fields(entities = topology.len()))]
    pub(crate) fn plan_static(&self, topology: &mut Topology) -> Vec<HubAction> {
        let mut actions = Vec::new();
        let mut injected = Vec::new();

        for (id, entity) in topology.iter() {
            for route in &entity.static_routes {
                let action = self.forward(
                    topology,
                    id,
                    route.cidr,
                    route.route_target(),
                    RouteOrigin::Static,
                );
                actions.push(action);
                injected.extend(return_edges(id, route.route_target()));
            }

            if let Some(route) = entity.default_route {
                actions.push(self.forward(
                    topology,
                    id,
                    DEFAULT_DESTINATION,
                    route,
                    RouteOrigin::Default,
                ));
                injected.extend(return_edges(id, route));
            }

            for cidr in &entity.blackhole_cidrs {
                actions.push(HubAction::Blackhole {
                    id: self.ids.blackhole(&entity.name, cidr),
                    route_table: entity.route_table.clone(),
                    destination: *cidr,
                });
            }
        }

        let edges = injected.len();
        for (from, route) in injected {
            topology.add_propagation(from, route.target, route.inspector);
        }
        debug!(actions = actions.len(), edges, "Planned static hub routes");
        actions
    }

    /// Phase B: one association per direct propagation, one inspection route
    /// per inspected one
    #[instrument(skip(self, topology), fields(entities = topology.len()))]
    pub(crate) fn plan_dynamic(&self, topology: &Topology) -> Result<Vec<HubAction>> {
        let mut actions = Vec::new();

        for (_, entity) in topology.iter() {
            for route in &entity.propagations {
                let target = topology.get(route.target);
                let action = match route.inspector {
                    None => HubAction::Association {
                        id: self.ids.propagation(&entity.name, &target.name),
                        route_table: entity.route_table.clone(),
                        attachment: target.attachment.clone(),
                    },
                    Some(inspector_id) => {
                        let inspector = topology.get(inspector_id);
                        let Some(destination) = target.cidr else {
                            let err = Error::unsupported(
                                &entity.name,
                                &target.name,
                                &inspector.name,
                                format!(
                                    "{} is a {} attachment with no address block",
                                    target.name, target.style
                                ),
                            );
                            warn!(error = %err, "Inspected propagation has no destination");
                            return Err(err);
                        };
                        HubAction::Route {
                            id: self.ids.inspection_route(&entity.name, &target.name),
                            route_table: entity.route_table.clone(),
                            destination,
                            next_hop: inspector.attachment.clone(),
                            origin: RouteOrigin::Inspection,
                        }
                    }
                };
                debug!(
                    entity = %entity.name,
                    route = %topology.describe(route),
                    "Planned propagation"
                );
                actions.push(action);
            }
        }

        Ok(actions)
    }

    fn forward(
        &self,
        topology: &Topology,
        from: EntityId,
        destination: Ipv4Net,
        route: RouteTarget,
        origin: RouteOrigin,
    ) -> HubAction {
        let entity = topology.get(from);
        let target = topology.get(route.target);
        let next_hop = match route.inspector {
            Some(inspector) => topology.get(inspector).attachment.clone(),
            None => target.attachment.clone(),
        };
        let id = match origin {
            RouteOrigin::Default => self.ids.default_route(&entity.route_table),
            _ => self.ids.static_route(&entity.name, &destination, &target.name),
        };
        HubAction::Route {
            id,
            route_table: entity.route_table.clone(),
            destination,
            next_hop,
            origin,
        }
    }
}

/// Edges a forwarding route from `from` implies elsewhere
///
/// The target always learns a path back to `from`. An inspected route also
/// teaches the inspector both ends, and the path back goes through it.
fn return_edges(from: EntityId, route: RouteTarget) -> Vec<(EntityId, RouteTarget)> {
    match route.inspector {
        None => vec![(route.target, RouteTarget::direct(from))],
        Some(inspector) => vec![
            (inspector, RouteTarget::direct(route.target)),
            (route.target, RouteTarget::inspected(from, inspector)),
            (inspector, RouteTarget::direct(from)),
        ],
    }
}
