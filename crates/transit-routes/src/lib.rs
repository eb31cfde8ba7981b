//! Transit Route Planner
//!
//! Plans routing for hub-and-spoke transit gateway topologies:
//! - Symmetric relationship resolution (every route gets its return path)
//! - Inspection steering through firewall entities
//! - Hub route table actions (static, default, blackhole, association)
//! - VPC subnet route table actions, by entity style
//!
//! Planning is a pure, deterministic batch computation. The same topology always
//! yields the same actions with the same ids, so a provisioning layer can diff
//! plans by id.
//!
//! ```no_run
//! use transit_routes::config;
//!
//! let document = config::load_from_file("topology.yaml")?;
//! let plan = document.plan()?;
//! println!("{}", plan.to_json_pretty()?);
//! # Ok::<(), transit_routes::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod planner;
pub mod resolver;
pub mod telemetry;
pub mod topology;

// Re-export core types
pub use config::TopologyDocument;
pub use error::{Error, Result};
pub use models::{
    ActionId, AttachmentHandle, Entity, EntityId, EntityStyle, HubAction, HubHandle, RouteOrigin,
    RouteTableHandle, RouteTarget, StaticRoute, Subnet, SubnetRole, SubnetRouteAction,
    DEFAULT_DESTINATION,
};
pub use planner::{EntityReport, PlanSummary, PlannerConfig, RouteReport, RoutePlanner, RoutingPlan};
pub use resolver::RelationshipResolver;
pub use telemetry::{init_tracing, LoggingConfig};
pub use topology::Topology;
