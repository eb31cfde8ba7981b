//! Topology document schema

use crate::models::{
    AttachmentHandle, Entity, EntityId, EntityStyle, HubHandle, RouteTableHandle, Subnet,
    SubnetRole,
};
use crate::planner::{PlannerConfig, RoutePlanner, RoutingPlan};
use crate::telemetry::LoggingConfig;
use crate::topology::Topology;
use crate::{Error, Result};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Everything needed to plan one hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDocument {
    /// Hub every entity attaches to
    pub hub: HubHandle,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub entities: Vec<EntityDocument>,
    #[serde(default)]
    pub routes: RouteGroups,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub name: String,
    pub style: EntityStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<Ipv4Net>,
    pub attachment: AttachmentHandle,
    pub route_table: RouteTableHandle,
    #[serde(default)]
    pub inspects: bool,
    #[serde(default)]
    pub subnets: Vec<SubnetDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetDocument {
    pub group: String,
    pub role: SubnetRole,
    pub availability_zone: String,
    pub cidr: Ipv4Net,
    pub route_table: RouteTableHandle,
}

/// Route intents, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteGroups {
    pub default_routes: Vec<RouteIntent>,
    pub dynamic_routes: Vec<RouteIntent>,
    pub static_routes: Vec<StaticRouteIntent>,
    pub blackhole_routes: Vec<BlackholeIntent>,
}

/// `vpc_name` routes to `routes_to`, optionally through `inspected_by`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteIntent {
    pub vpc_name: String,
    pub routes_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRouteIntent {
    pub vpc_name: String,
    pub routes_to: String,
    pub static_cidr: Ipv4Net,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected_by: Option<String>,
}

/// Destinations to discard; each entry is a CIDR block or an entity name
/// standing for that entity's block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackholeIntent {
    pub vpc_name: String,
    pub blackhole_cidrs: Vec<String>,
}

impl EntityDocument {
    fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(
            self.name.clone(),
            self.style,
            self.attachment.clone(),
            self.route_table.clone(),
        );
        entity.cidr = self.cidr;
        entity.inspects = self.inspects;

        let mut seen = HashSet::new();
        for subnet in &self.subnets {
            if !seen.insert((subnet.group.as_str(), subnet.availability_zone.as_str())) {
                debug!(
                    entity = %self.name,
                    group = %subnet.group,
                    az = %subnet.availability_zone,
                    "Skipping duplicate subnet"
                );
                continue;
            }
            entity.subnets.push(Subnet::new(
                subnet.group.clone(),
                subnet.role,
                subnet.availability_zone.clone(),
                subnet.cidr,
                subnet.route_table.clone(),
            ));
        }
        entity
    }
}

impl TopologyDocument {
    /// Resolve names and assemble the entity arena
    ///
    /// Only references and the inspection flag are checked here; inspector
    /// use is checked when planning starts.
    pub fn build(&self) -> Result<Topology> {
        let mut topology = Topology::new(self.hub.clone());
        for entity in &self.entities {
            if entity.inspects && !entity.style.may_inspect() {
                return Err(Error::Config(format!(
                    "{} is a {} entity and cannot inspect traffic",
                    entity.name, entity.style
                )));
            }
            topology.insert(entity.to_entity())?;
        }

        let mut has_default = HashSet::new();
        for intent in &self.routes.default_routes {
            let (from, target, inspector) = resolve_intent(&topology, intent)?;
            if !has_default.insert(from) {
                return Err(Error::Config(format!(
                    "{} declares more than one default route",
                    intent.vpc_name
                )));
            }
            topology.set_default_route(from, target, inspector);
        }

        for intent in &self.routes.dynamic_routes {
            let (from, target, inspector) = resolve_intent(&topology, intent)?;
            topology.add_propagation(from, target, inspector);
        }

        for intent in &self.routes.static_routes {
            let from = topology.require(&intent.vpc_name)?;
            let target = topology.require(&intent.routes_to)?;
            let inspector = resolve_optional(&topology, intent.inspected_by.as_deref())?;
            topology.add_static_route(from, intent.static_cidr, target, inspector);
        }

        for intent in &self.routes.blackhole_routes {
            let from = topology.require(&intent.vpc_name)?;
            for destination in &intent.blackhole_cidrs {
                let cidr = blackhole_destination(&topology, destination)?;
                topology.add_blackhole(from, cidr);
            }
        }

        Ok(topology)
    }

    /// Build the topology and plan it with this document's planner settings
    pub fn plan(&self) -> Result<RoutingPlan> {
        RoutePlanner::new(self.planner.clone()).plan(self.build()?)
    }
}

fn resolve_intent(
    topology: &Topology,
    intent: &RouteIntent,
) -> Result<(EntityId, EntityId, Option<EntityId>)> {
    Ok((
        topology.require(&intent.vpc_name)?,
        topology.require(&intent.routes_to)?,
        resolve_optional(topology, intent.inspected_by.as_deref())?,
    ))
}

fn resolve_optional(topology: &Topology, name: Option<&str>) -> Result<Option<EntityId>> {
    name.map(|name| topology.require(name)).transpose()
}

fn blackhole_destination(topology: &Topology, destination: &str) -> Result<Ipv4Net> {
    if let Ok(cidr) = destination.parse::<Ipv4Net>() {
        return Ok(cidr);
    }
    let entity = topology.entity(destination).ok_or_else(|| {
        Error::Config(format!(
            "blackhole destination {} is neither a CIDR block nor an entity name",
            destination
        ))
    })?;
    entity.cidr.ok_or_else(|| {
        Error::Config(format!(
            "blackhole destination {} is a {} attachment with no address block",
            destination, entity.style
        ))
    })
}
