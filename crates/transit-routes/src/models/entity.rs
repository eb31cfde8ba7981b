//! Attachable network entities and their subnets

use super::route::{RouteTarget, StaticRoute};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topology role of an entity
///
/// The style decides which local subnet routes an entity receives and whether it
/// carries an address block the hub can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStyle {
    /// Workload VPC with no internet path; everything leaves via the hub
    WorkloadIsolated,
    /// Workload VPC whose public subnets keep their internet gateway default
    WorkloadPublic,
    /// Shared internet egress VPC (NAT gateways)
    NatEgress,
    /// Shared interface endpoint VPC
    ServiceEndpoint,
    /// Shared DNS resolver endpoint VPC
    DnsResolver,
    /// Inspection VPC hosting a network firewall
    Firewall,
    /// Site-to-site VPN attachment
    Vpn,
    /// Direct Connect gateway attachment
    DirectConnectGateway,
    /// Cross-region transit gateway peering attachment
    TgwPeer,
}

impl EntityStyle {
    /// Whether this style is backed by a VPC with a known address block
    pub fn is_vpc(&self) -> bool {
        !matches!(
            self,
            EntityStyle::Vpn | EntityStyle::DirectConnectGateway | EntityStyle::TgwPeer
        )
    }

    /// Whether this style is allowed to act as an inspector
    pub fn may_inspect(&self) -> bool {
        matches!(self, EntityStyle::Firewall)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStyle::WorkloadIsolated => "workload_isolated",
            EntityStyle::WorkloadPublic => "workload_public",
            EntityStyle::NatEgress => "nat_egress",
            EntityStyle::ServiceEndpoint => "service_endpoint",
            EntityStyle::DnsResolver => "dns_resolver",
            EntityStyle::Firewall => "firewall",
            EntityStyle::Vpn => "vpn",
            EntityStyle::DirectConnectGateway => "direct_connect_gateway",
            EntityStyle::TgwPeer => "tgw_peer",
        }
    }
}

impl fmt::Display for EntityStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to an entity's hub attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentHandle(String);

impl AttachmentHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a route table, either on the hub or inside a VPC
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTableHandle(String);

impl RouteTableHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteTableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the hub itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubHandle(String);

impl HubHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HubHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a subnet group plays inside its VPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetRole {
    /// Default route points at an internet gateway
    Public,
    /// Private with NAT egress
    Private,
    /// Private without any egress of its own
    Isolated,
    /// Hosts the hub attachment interfaces
    Transit,
    /// Hosts inspection endpoints (firewall VPCs only)
    Inspection,
}

impl SubnetRole {
    /// Private and isolated subnets
    pub fn is_private(&self) -> bool {
        matches!(self, SubnetRole::Private | SubnetRole::Isolated)
    }
}

/// One subnet of a named group, in a single availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// Subnet group name (shared across availability zones)
    pub group: String,
    /// Role of the group
    pub role: SubnetRole,
    /// Availability zone
    pub availability_zone: String,
    /// Subnet CIDR block
    pub cidr: Ipv4Net,
    /// Local route table of this subnet
    pub route_table: RouteTableHandle,
}

impl Subnet {
    pub fn new(
        group: impl Into<String>,
        role: SubnetRole,
        availability_zone: impl Into<String>,
        cidr: Ipv4Net,
        route_table: RouteTableHandle,
    ) -> Self {
        Self {
            group: group.into(),
            role,
            availability_zone: availability_zone.into(),
            cidr,
            route_table,
        }
    }
}

/// An attachable network participating in hub routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Unique name across the whole topology
    pub name: String,
    /// Topology role
    pub style: EntityStyle,
    /// Address block, known for VPC-backed styles only
    pub cidr: Option<Ipv4Net>,
    /// Hub attachment
    pub attachment: AttachmentHandle,
    /// Private hub route table of this attachment
    pub route_table: RouteTableHandle,
    /// Whether this entity may inspect traffic for others
    pub inspects: bool,
    /// Destinations discarded from this entity's hub route table
    pub blackhole_cidrs: Vec<Ipv4Net>,
    /// Explicit routes, independent of graph resolution
    pub static_routes: Vec<StaticRoute>,
    /// Single all-traffic route
    pub default_route: Option<RouteTarget>,
    /// Dynamic relationships; grown and pruned by the resolver
    pub propagations: Vec<RouteTarget>,
    /// Local subnets (empty for VPN, DX gateway and peer attachments)
    pub subnets: Vec<Subnet>,
}

impl Entity {
    /// Create an entity with no routes and no subnets
    pub fn new(
        name: impl Into<String>,
        style: EntityStyle,
        attachment: AttachmentHandle,
        route_table: RouteTableHandle,
    ) -> Self {
        Self {
            name: name.into(),
            style,
            cidr: None,
            attachment,
            route_table,
            inspects: false,
            blackhole_cidrs: Vec::new(),
            static_routes: Vec::new(),
            default_route: None,
            propagations: Vec::new(),
            subnets: Vec::new(),
        }
    }

    /// Set the address block
    pub fn with_cidr(mut self, cidr: Ipv4Net) -> Self {
        self.cidr = Some(cidr);
        self
    }

    /// Add a subnet
    pub fn with_subnet(mut self, subnet: Subnet) -> Self {
        self.subnets.push(subnet);
        self
    }

    /// Advertise inspection capability
    pub fn inspecting(mut self) -> Self {
        self.inspects = true;
        self
    }

    /// Subnets matching a role predicate, in declaration order
    pub fn subnets_where<F>(&self, mut predicate: F) -> impl Iterator<Item = &Subnet>
    where
        F: FnMut(SubnetRole) -> bool,
    {
        self.subnets.iter().filter(move |s| predicate(s.role))
    }
}
