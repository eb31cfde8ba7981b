//! Entity arena for one planning run
//!
//! Entities are stored in insertion order and addressed by [`EntityId`]. Routes
//! refer to each other by id, so the propagation graph carries no ownership cycles
//! and lookups by name stay O(1).
//!
//! An [`EntityId`] is only meaningful for the topology that issued it. Methods
//! taking ids index the arena directly and panic on an id from elsewhere; use
//! [`Topology::require`] to translate names when ids cross topologies.

use crate::models::{Entity, EntityId, HubHandle, RouteTarget, StaticRoute};
use crate::{Error, Result};
use ipnet::Ipv4Net;
use std::collections::HashMap;

/// The full entity set attached to one hub
#[derive(Debug, Clone)]
pub struct Topology {
    hub: HubHandle,
    entities: Vec<Entity>,
    by_name: HashMap<String, EntityId>,
}

impl Topology {
    /// Create an empty topology for a hub
    pub fn new(hub: HubHandle) -> Self {
        Self {
            hub,
            entities: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Register an entity, returning its id
    pub fn insert(&mut self, entity: Entity) -> Result<EntityId> {
        if self.by_name.contains_key(&entity.name) {
            return Err(Error::DuplicateEntity { name: entity.name });
        }
        let id = EntityId(self.entities.len());
        self.by_name.insert(entity.name.clone(), id);
        self.entities.push(entity);
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    /// Look up an id, failing with [`Error::UnknownEntity`]
    pub fn require(&self, name: &str) -> Result<EntityId> {
        self.id(name).ok_or_else(|| Error::UnknownEntity {
            name: name.to_string(),
        })
    }

    /// Entity by id
    ///
    /// Ids are only handed out by [`Topology::insert`], so an id from this
    /// topology is always in range.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a topology with fewer entities.
    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.id(name).map(|id| self.get(id))
    }

    pub fn name(&self, id: EntityId) -> &str {
        &self.get(id).name
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> {
        (0..self.entities.len()).map(EntityId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(index, entity)| (EntityId(index), entity))
    }

    /// Declare a dynamic relationship from `from` to `target`
    ///
    /// All ids must come from this topology; see [`Topology::get`].
    pub fn add_propagation(
        &mut self,
        from: EntityId,
        target: EntityId,
        inspector: Option<EntityId>,
    ) {
        self.get_mut(from)
            .propagations
            .push(RouteTarget::new(target, inspector));
    }

    /// Declare a static route on `from` for `cidr`
    pub fn add_static_route(
        &mut self,
        from: EntityId,
        cidr: Ipv4Net,
        target: EntityId,
        inspector: Option<EntityId>,
    ) {
        self.get_mut(from)
            .static_routes
            .push(StaticRoute::new(cidr, target, inspector));
    }

    /// Declare the default route of `from`, replacing any earlier one
    pub fn set_default_route(
        &mut self,
        from: EntityId,
        target: EntityId,
        inspector: Option<EntityId>,
    ) {
        self.get_mut(from).default_route = Some(RouteTarget::new(target, inspector));
    }

    /// Discard traffic for `cidr` in the hub route table of `from`
    pub fn add_blackhole(&mut self, from: EntityId, cidr: Ipv4Net) {
        self.get_mut(from).blackhole_cidrs.push(cidr);
    }

    /// Human-readable form of a route target, for logs and reports
    pub fn describe(&self, route: &RouteTarget) -> String {
        match route.inspector {
            Some(inspector) => format!("{} via {}", self.name(route.target), self.name(inspector)),
            None => self.name(route.target).to_string(),
        }
    }
}
