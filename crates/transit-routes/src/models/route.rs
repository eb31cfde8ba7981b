//! Route intents between entities

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// All-traffic destination used by default routes
pub const DEFAULT_DESTINATION: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::UNSPECIFIED, 0);

/// Index of an entity inside its topology arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    /// Position in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a route leads, optionally through an inspector
///
/// Used for propagations and default routes alike. Two targets are the same
/// relationship when both the target and the inspector match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteTarget {
    /// Final destination entity
    pub target: EntityId,
    /// Entity that inspects the traffic on the way
    pub inspector: Option<EntityId>,
}

impl RouteTarget {
    /// Uninspected route to `target`
    pub fn direct(target: EntityId) -> Self {
        Self {
            target,
            inspector: None,
        }
    }

    /// Route to `target` through `inspector`
    pub fn inspected(target: EntityId, inspector: EntityId) -> Self {
        Self {
            target,
            inspector: Some(inspector),
        }
    }

    pub fn new(target: EntityId, inspector: Option<EntityId>) -> Self {
        Self { target, inspector }
    }

    pub fn is_inspected(&self) -> bool {
        self.inspector.is_some()
    }
}

/// Explicit route for a destination block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticRoute {
    /// Destination block
    pub cidr: Ipv4Net,
    /// Entity the traffic is sent to
    pub target: EntityId,
    /// Entity that inspects the traffic on the way
    pub inspector: Option<EntityId>,
}

impl StaticRoute {
    pub fn new(cidr: Ipv4Net, target: EntityId, inspector: Option<EntityId>) -> Self {
        Self {
            cidr,
            target,
            inspector,
        }
    }

    /// The relationship part of this route, without the destination block
    pub fn route_target(&self) -> RouteTarget {
        RouteTarget::new(self.target, self.inspector)
    }
}
