//! Routing actions emitted by the planners

use super::entity::{AttachmentHandle, HubHandle, RouteTableHandle};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic identifier of a routing action
///
/// Derived only from stable inputs, so re-planning an unchanged topology yields
/// the same identifiers and a provisioning layer can diff plans by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a forwarding route exists on the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOrigin {
    /// Declared static route
    Static,
    /// Declared default route
    Default,
    /// Realization of an inspected propagation
    Inspection,
}

/// An action against a hub route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HubAction {
    /// Forward `destination` to `next_hop`
    Route {
        id: ActionId,
        route_table: RouteTableHandle,
        destination: Ipv4Net,
        next_hop: AttachmentHandle,
        origin: RouteOrigin,
    },
    /// Discard traffic to `destination`
    Blackhole {
        id: ActionId,
        route_table: RouteTableHandle,
        destination: Ipv4Net,
    },
    /// Let `attachment` propagate its routes into `route_table`
    Association {
        id: ActionId,
        route_table: RouteTableHandle,
        attachment: AttachmentHandle,
    },
}

impl HubAction {
    pub fn id(&self) -> &ActionId {
        match self {
            HubAction::Route { id, .. }
            | HubAction::Blackhole { id, .. }
            | HubAction::Association { id, .. } => id,
        }
    }

    pub fn route_table(&self) -> &RouteTableHandle {
        match self {
            HubAction::Route { route_table, .. }
            | HubAction::Blackhole { route_table, .. }
            | HubAction::Association { route_table, .. } => route_table,
        }
    }

    /// Destination block, for routes and blackholes
    pub fn destination(&self) -> Option<Ipv4Net> {
        match self {
            HubAction::Route { destination, .. } | HubAction::Blackhole { destination, .. } => {
                Some(*destination)
            }
            HubAction::Association { .. } => None,
        }
    }

    /// Attachment the action points at; blackholes have none
    pub fn attachment(&self) -> Option<&AttachmentHandle> {
        match self {
            HubAction::Route { next_hop, .. } => Some(next_hop),
            HubAction::Association { attachment, .. } => Some(attachment),
            HubAction::Blackhole { .. } => None,
        }
    }

    pub fn is_association(&self) -> bool {
        matches!(self, HubAction::Association { .. })
    }

    pub fn is_blackhole(&self) -> bool {
        matches!(self, HubAction::Blackhole { .. })
    }

    pub fn origin(&self) -> Option<RouteOrigin> {
        match self {
            HubAction::Route { origin, .. } => Some(*origin),
            _ => None,
        }
    }
}

/// A route in a VPC subnet route table pointing at the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRouteAction {
    pub id: ActionId,
    /// Entity owning the subnet
    pub entity: String,
    /// Subnet group the route table belongs to
    pub subnet_group: String,
    pub route_table: RouteTableHandle,
    pub destination: Ipv4Net,
    pub hub: HubHandle,
}

impl SubnetRouteAction {
    pub fn is_default(&self) -> bool {
        self.destination.prefix_len() == 0
    }
}
