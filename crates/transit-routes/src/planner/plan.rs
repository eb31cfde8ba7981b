//! Planning output

use crate::models::{
    ActionId, EntityId, EntityStyle, HubAction, HubHandle, RouteOrigin, RouteTableHandle,
    RouteTarget, SubnetRouteAction,
};
use crate::topology::Topology;
use crate::Result;
use ipnet::Ipv4Net;
use serde::Serialize;

/// Complete, ordered result of one planning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingPlan {
    /// Hub the plan applies to
    pub hub: HubHandle,
    /// Hub route table actions: static phase first, then dynamic
    pub hub_actions: Vec<HubAction>,
    /// VPC subnet route table actions
    pub subnet_actions: Vec<SubnetRouteAction>,
    /// Resolved relationships of every entity, in topology order
    pub entities: Vec<EntityReport>,
}

/// Action counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub static_routes: usize,
    pub default_routes: usize,
    pub inspection_routes: usize,
    pub blackholes: usize,
    pub associations: usize,
    pub subnet_routes: usize,
}

impl PlanSummary {
    pub fn hub_total(&self) -> usize {
        self.static_routes
            + self.default_routes
            + self.inspection_routes
            + self.blackholes
            + self.associations
    }
}

/// A resolved route target, by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteReport {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector: Option<String>,
}

impl RouteReport {
    fn new(topology: &Topology, route: &RouteTarget) -> Self {
        Self {
            target: topology.name(route.target).to_string(),
            inspector: route
                .inspector
                .map(|inspector| topology.name(inspector).to_string()),
        }
    }
}

/// Snapshot of one entity after planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub name: String,
    pub style: EntityStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<Ipv4Net>,
    /// Default route left after precedence resolution
    pub default_route: Option<RouteReport>,
    pub propagations: Vec<RouteReport>,
}

impl EntityReport {
    fn new(topology: &Topology, id: EntityId) -> Self {
        let entity = topology.get(id);
        Self {
            name: entity.name.clone(),
            style: entity.style,
            cidr: entity.cidr,
            default_route: entity
                .default_route
                .as_ref()
                .map(|route| RouteReport::new(topology, route)),
            propagations: entity
                .propagations
                .iter()
                .map(|route| RouteReport::new(topology, route))
                .collect(),
        }
    }

    /// Whether this entity propagates to `target`, with or without inspection
    pub fn propagates_to(&self, target: &str) -> bool {
        self.propagations.iter().any(|route| route.target == target)
    }
}

impl RoutingPlan {
    pub(crate) fn new(
        topology: &Topology,
        hub_actions: Vec<HubAction>,
        subnet_actions: Vec<SubnetRouteAction>,
    ) -> Self {
        Self {
            hub: topology.hub().clone(),
            hub_actions,
            subnet_actions,
            entities: topology
                .ids()
                .map(|id| EntityReport::new(topology, id))
                .collect(),
        }
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            subnet_routes: self.subnet_actions.len(),
            ..PlanSummary::default()
        };
        for action in &self.hub_actions {
            match action {
                HubAction::Route { origin, .. } => match origin {
                    RouteOrigin::Static => summary.static_routes += 1,
                    RouteOrigin::Default => summary.default_routes += 1,
                    RouteOrigin::Inspection => summary.inspection_routes += 1,
                },
                HubAction::Blackhole { .. } => summary.blackholes += 1,
                HubAction::Association { .. } => summary.associations += 1,
            }
        }
        summary
    }

    /// Look up a hub action by id
    pub fn action(&self, id: &str) -> Option<&HubAction> {
        self.hub_actions
            .iter()
            .find(|action| action.id().as_str() == id)
    }

    /// Hub actions against one route table, in plan order
    pub fn actions_for<'a>(
        &'a self,
        route_table: &'a RouteTableHandle,
    ) -> impl Iterator<Item = &'a HubAction> + 'a {
        self.hub_actions
            .iter()
            .filter(move |action| action.route_table() == route_table)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityReport> {
        self.entities.iter().find(|report| report.name == name)
    }

    /// Every action id in plan order, hub actions first
    pub fn action_ids(&self) -> Vec<&ActionId> {
        self.hub_actions
            .iter()
            .map(HubAction::id)
            .chain(self.subnet_actions.iter().map(|action| &action.id))
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
