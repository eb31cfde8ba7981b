//! Topology documents
//!
//! A topology document names every entity attached to one hub and the route
//! intents between them, in YAML, TOML or JSON. `${VAR}` references are
//! substituted from the environment before parsing.
//!
//! ```yaml
//! hub: tgw-0123
//! entities:
//!   - name: dev
//!     style: workload_isolated
//!     cidr: 10.11.0.0/16
//!     attachment: tgw-attach-dev
//!     route_table: tgw-rtb-dev
//! routes:
//!   dynamic_routes:
//!     - vpc_name: dev
//!       routes_to: prod
//!       inspected_by: firewall
//! ```

mod loader;
mod schema;

pub use loader::{from_str, load_from_file, ConfigFormat};
pub use schema::{
    BlackholeIntent, EntityDocument, RouteGroups, RouteIntent, StaticRouteIntent, SubnetDocument,
    TopologyDocument,
};
