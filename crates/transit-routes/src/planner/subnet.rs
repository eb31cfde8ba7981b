//! Local subnet route planning
//!
//! Each entity style maps to one policy function deciding which subnet groups
//! point which destinations at the hub. Styles without local route tables map to
//! no policy.

use super::ids::ActionIds;
use crate::models::{
    Entity, EntityId, EntityStyle, Subnet, SubnetRole, SubnetRouteAction, DEFAULT_DESTINATION,
};
use crate::topology::Topology;
use ipnet::Ipv4Net;
use std::collections::HashSet;
use tracing::{debug, instrument};

type SubnetPolicy = fn(&PolicyContext<'_>) -> Vec<SubnetRouteAction>;

/// Policy applied to the subnets of an entity of the given style
fn policy_for(style: EntityStyle) -> Option<SubnetPolicy> {
    match style {
        EntityStyle::NatEgress => Some(nat_egress),
        EntityStyle::ServiceEndpoint | EntityStyle::DnsResolver => Some(shared_service),
        EntityStyle::Firewall => Some(firewall),
        EntityStyle::WorkloadIsolated => Some(workload_isolated),
        EntityStyle::WorkloadPublic => Some(workload_public),
        EntityStyle::Vpn | EntityStyle::DirectConnectGateway | EntityStyle::TgwPeer => None,
    }
}

/// Emits subnet route actions for a resolved topology
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubnetRoutePlanner {
    ids: ActionIds,
}

impl SubnetRoutePlanner {
    pub(crate) fn new(ids: ActionIds) -> Self {
        Self { ids }
    }

    #[instrument(skip(self, topology), fields(entities = topology.len()))]
    pub(crate) fn plan(&self, topology: &Topology) -> Vec<SubnetRouteAction> {
        let mut seen = HashSet::new();
        let mut actions = Vec::new();

        for (id, entity) in topology.iter() {
            let Some(policy) = policy_for(entity.style) else {
                continue;
            };
            let ctx = PolicyContext {
                topology,
                entity,
                id,
                ids: self.ids,
            };
            for action in policy(&ctx) {
                if seen.insert(action.id.clone()) {
                    actions.push(action);
                }
            }
        }

        debug!(actions = actions.len(), "Planned subnet routes");
        actions
    }
}

struct PolicyContext<'a> {
    topology: &'a Topology,
    entity: &'a Entity,
    id: EntityId,
    ids: ActionIds,
}

impl PolicyContext<'_> {
    fn default_to_hub(&self, subnet: &Subnet) -> SubnetRouteAction {
        SubnetRouteAction {
            id: self.ids.subnet_default(&subnet.route_table),
            entity: self.entity.name.clone(),
            subnet_group: subnet.group.clone(),
            route_table: subnet.route_table.clone(),
            destination: DEFAULT_DESTINATION,
            hub: self.topology.hub().clone(),
        }
    }

    fn cidr_to_hub(&self, subnet: &Subnet, destination: Ipv4Net) -> SubnetRouteAction {
        SubnetRouteAction {
            id: self
                .ids
                .subnet_cidr(&self.entity.name, &subnet.route_table, &destination),
            entity: self.entity.name.clone(),
            subnet_group: subnet.group.clone(),
            route_table: subnet.route_table.clone(),
            destination,
            hub: self.topology.hub().clone(),
        }
    }

    /// Whether the entity's own default route already reaches `target`
    fn covered_by_default(&self, target: EntityId) -> bool {
        self.entity
            .default_route
            .is_some_and(|route| route.target == target || route.inspector == Some(target))
    }

    /// Address blocks of every propagation target not already covered
    fn propagation_destinations(&self) -> Vec<Ipv4Net> {
        let mut seen = HashSet::new();
        self.entity
            .propagations
            .iter()
            .filter(|route| route.target != self.id && !self.covered_by_default(route.target))
            .filter_map(|route| self.topology.get(route.target).cidr)
            .filter(|cidr| seen.insert(*cidr))
            .collect()
    }

    fn static_destinations(&self) -> Vec<Ipv4Net> {
        let mut seen = HashSet::new();
        self.entity
            .static_routes
            .iter()
            .map(|route| route.cidr)
            .filter(|cidr| seen.insert(*cidr))
            .collect()
    }

    fn defaults_where(&self, predicate: impl FnMut(SubnetRole) -> bool) -> Vec<SubnetRouteAction> {
        self.entity
            .subnets_where(predicate)
            .map(|subnet| self.default_to_hub(subnet))
            .collect()
    }

    fn cidrs_where(
        &self,
        predicate: impl FnMut(SubnetRole) -> bool,
        destinations: &[Ipv4Net],
    ) -> Vec<SubnetRouteAction> {
        self.entity
            .subnets_where(predicate)
            .flat_map(|subnet| {
                destinations
                    .iter()
                    .map(move |destination| self.cidr_to_hub(subnet, *destination))
            })
            .collect()
    }
}

/// Public subnets route every peer block back through the hub; the internet
/// default stays on the gateway
fn nat_egress(ctx: &PolicyContext<'_>) -> Vec<SubnetRouteAction> {
    ctx.cidrs_where(|role| role == SubnetRole::Public, &ctx.propagation_destinations())
}

fn shared_service(ctx: &PolicyContext<'_>) -> Vec<SubnetRouteAction> {
    ctx.defaults_where(|role| role.is_private())
}

/// Only the inspection-facing group; the transit group keeps the firewall
/// endpoint as its next hop
fn firewall(ctx: &PolicyContext<'_>) -> Vec<SubnetRouteAction> {
    ctx.defaults_where(|role| role == SubnetRole::Inspection)
}

fn workload_isolated(ctx: &PolicyContext<'_>) -> Vec<SubnetRouteAction> {
    ctx.defaults_where(|role| role != SubnetRole::Transit)
}

fn workload_public(ctx: &PolicyContext<'_>) -> Vec<SubnetRouteAction> {
    let mut destinations = ctx.propagation_destinations();
    for cidr in ctx.static_destinations() {
        if !destinations.contains(&cidr) {
            destinations.push(cidr);
        }
    }

    let mut actions = ctx.cidrs_where(|role| role == SubnetRole::Public, &destinations);
    actions.extend(ctx.defaults_where(|role| role.is_private()));
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttachmentHandle, HubHandle, RouteTableHandle};

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    fn subnet(entity: &str, group: &str, role: SubnetRole, az: &str, cidr: &str) -> Subnet {
        Subnet::new(
            group,
            role,
            az,
            net(cidr),
            RouteTableHandle::new(format!("rtb-{}-{}-{}", entity, group, az)),
        )
    }

    fn entity(name: &str, style: EntityStyle, cidr: &str) -> Entity {
        Entity::new(
            name,
            style,
            AttachmentHandle::new(format!("tgw-attach-{}", name)),
            RouteTableHandle::new(format!("tgw-rtb-{}", name)),
        )
        .with_cidr(net(cidr))
    }

    fn planner() -> SubnetRoutePlanner {
        SubnetRoutePlanner::new(ActionIds::new(16))
    }

    #[test]
    fn test_isolated_workload_defaults_to_hub() {
        let mut topology = Topology::new(HubHandle::new("tgw-1"));
        topology
            .insert(
                entity("a", EntityStyle::WorkloadIsolated, "10.1.0.0/16")
                    .with_subnet(subnet("a", "app", SubnetRole::Isolated, "az1", "10.1.0.0/24"))
                    .with_subnet(subnet("a", "app", SubnetRole::Isolated, "az2", "10.1.1.0/24"))
                    .with_subnet(subnet("a", "tgw", SubnetRole::Transit, "az1", "10.1.9.0/28")),
            )
            .unwrap();

        let actions = planner().plan(&topology);

        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.is_default()));
        assert!(actions.iter().all(|a| a.subnet_group == "app"));
        assert_eq!(actions[0].hub.as_str(), "tgw-1");
    }

    #[test]
    fn test_nat_egress_routes_peers_from_public_subnets() {
        let mut topology = Topology::new(HubHandle::new("tgw-1"));
        let public = subnet("nat", "public", SubnetRole::Public, "az1", "10.50.0.0/24");
        let private = subnet("nat", "private", SubnetRole::Private, "az1", "10.50.1.0/24");
        let nat = topology
            .insert(
                entity("nat", EntityStyle::NatEgress, "10.50.0.0/16")
                    .with_subnet(public)
                    .with_subnet(private),
            )
            .unwrap();
        let a = topology
            .insert(entity("a", EntityStyle::WorkloadIsolated, "10.1.0.0/16"))
            .unwrap();
        let b = topology
            .insert(entity("b", EntityStyle::WorkloadIsolated, "10.2.0.0/16"))
            .unwrap();
        topology.add_propagation(nat, a, None);
        topology.add_propagation(nat, b, None);

        let actions = planner().plan(&topology);

        let destinations: Vec<_> = actions.iter().map(|a| a.destination).collect();
        assert_eq!(destinations, vec![net("10.1.0.0/16"), net("10.2.0.0/16")]);
        assert!(actions.iter().all(|a| a.subnet_group == "public"));
    }

    #[test]
    fn test_firewall_routes_only_inspection_subnets() {
        let mut topology = Topology::new(HubHandle::new("tgw-1"));
        let inspect = subnet("fw", "inspect", SubnetRole::Inspection, "az1", "100.64.0.0/24");
        let transit = subnet("fw", "tgw", SubnetRole::Transit, "az1", "100.64.1.0/24");
        topology
            .insert(
                entity("fw", EntityStyle::Firewall, "100.64.0.0/16")
                    .with_subnet(inspect)
                    .with_subnet(transit)
                    .inspecting(),
            )
            .unwrap();

        let actions = planner().plan(&topology);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].subnet_group, "inspect");
    }

    #[test]
    fn test_public_workload_keeps_internet_default() {
        let mut topology = Topology::new(HubHandle::new("tgw-1"));
        let a = topology
            .insert(
                entity("a", EntityStyle::WorkloadPublic, "10.1.0.0/16")
                    .with_subnet(subnet("a", "web", SubnetRole::Public, "az1", "10.1.0.0/24"))
                    .with_subnet(subnet("a", "app", SubnetRole::Private, "az1", "10.1.1.0/24")),
            )
            .unwrap();
        let b = topology
            .insert(entity("b", EntityStyle::WorkloadIsolated, "10.2.0.0/16"))
            .unwrap();
        topology.add_propagation(a, b, None);
        topology.add_static_route(a, net("172.16.0.0/12"), b, None);

        let actions = planner().plan(&topology);

        let public: Vec<_> = actions.iter().filter(|a| a.subnet_group == "web").collect();
        assert_eq!(public.len(), 2);
        assert!(public.iter().all(|a| !a.is_default()));

        let private: Vec<_> = actions.iter().filter(|a| a.subnet_group == "app").collect();
        assert_eq!(private.len(), 1);
        assert!(private[0].is_default());
    }

    #[test]
    fn test_target_covered_by_default_skipped() {
        let mut topology = Topology::new(HubHandle::new("tgw-1"));
        let public = subnet("nat", "public", SubnetRole::Public, "az1", "10.50.0.0/24");
        let nat = topology
            .insert(entity("nat", EntityStyle::NatEgress, "10.50.0.0/16").with_subnet(public))
            .unwrap();
        let a = topology
            .insert(entity("a", EntityStyle::WorkloadIsolated, "10.1.0.0/16"))
            .unwrap();
        let fw = topology
            .insert(entity("fw", EntityStyle::Firewall, "100.64.0.0/16").inspecting())
            .unwrap();
        topology.set_default_route(nat, fw, None);
        topology.add_propagation(nat, fw, None);
        topology.add_propagation(nat, a, None);

        let actions = planner().plan(&topology);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].destination, net("10.1.0.0/16"));
    }

    #[test]
    fn test_endpoints_without_subnets_skipped() {
        let mut topology = Topology::new(HubHandle::new("tgw-1"));
        let vpn = topology
            .insert(Entity::new(
                "vpn",
                EntityStyle::Vpn,
                AttachmentHandle::new("tgw-attach-vpn"),
                RouteTableHandle::new("tgw-rtb-vpn"),
            ))
            .unwrap();
        let a = topology
            .insert(entity("a", EntityStyle::WorkloadIsolated, "10.1.0.0/16"))
            .unwrap();
        topology.add_propagation(vpn, a, None);

        assert!(planner().plan(&topology).is_empty());
        assert!(policy_for(EntityStyle::TgwPeer).is_none());
    }
}
