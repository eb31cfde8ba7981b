//! Route planning
//!
//! [`RoutePlanner`] drives one planning run over a [`Topology`]:
//!
//! 1. Relationship resolution (both symmetrization passes, normalization,
//!    default-route precedence)
//! 2. Hub static phase, which injects return edges
//! 3. Re-normalization
//! 4. Hub dynamic phase
//! 5. Subnet route planning
//!
//! Any error aborts the run; a [`RoutingPlan`] is only returned whole.

mod hub;
mod ids;
mod plan;
mod subnet;

pub use plan::{EntityReport, PlanSummary, RouteReport, RoutingPlan};

use crate::resolver::RelationshipResolver;
use crate::topology::Topology;
use crate::Result;
use hub::HubRoutePlanner;
use ids::ActionIds;
use serde::{Deserialize, Serialize};
use subnet::SubnetRoutePlanner;
use tracing::{info, instrument};

/// Planner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Hex characters kept from action id digests (clamped to 8..=64)
    pub id_digest_len: usize,
    /// Whether subnet route tables are planned
    pub subnet_routes: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            id_digest_len: 16,
            subnet_routes: true,
        }
    }
}

/// Turns a topology into a routing plan
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    config: PlannerConfig,
    resolver: RelationshipResolver,
    hub: HubRoutePlanner,
    subnets: SubnetRoutePlanner,
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let ids = ActionIds::new(config.id_digest_len);
        Self {
            config,
            resolver: RelationshipResolver::new(),
            hub: HubRoutePlanner::new(ids),
            subnets: SubnetRoutePlanner::new(ids),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Run every planning phase in order
    #[instrument(skip_all, fields(hub = %topology.hub(), entities = topology.len()))]
    pub fn plan(&self, mut topology: Topology) -> Result<RoutingPlan> {
        self.resolver.resolve(&mut topology)?;

        let mut hub_actions = self.hub.plan_static(&mut topology);
        self.resolver.normalize(&mut topology)?;
        hub_actions.extend(self.hub.plan_dynamic(&topology)?);

        let subnet_actions = if self.config.subnet_routes {
            self.subnets.plan(&topology)
        } else {
            Vec::new()
        };

        let plan = RoutingPlan::new(&topology, hub_actions, subnet_actions);
        let summary = plan.summary();
        info!(
            hub_actions = summary.hub_total(),
            associations = summary.associations,
            inspection_routes = summary.inspection_routes,
            subnet_routes = summary.subnet_routes,
            "Routing plan ready"
        );
        Ok(plan)
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}
