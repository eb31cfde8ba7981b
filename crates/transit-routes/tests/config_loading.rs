//! Topology document loading and end-to-end planning from files

use pretty_assertions::assert_eq;
use std::env;
use std::fs;
use tempfile::TempDir;
use transit_routes::config::{self, ConfigFormat};
use transit_routes::{EntityStyle, Error, RouteOrigin, SubnetRole};

const YAML_TOPOLOGY: &str = r#"
hub: ${TRANSIT_ROUTES_IT_HUB}
planner:
  id_digest_len: 12
logging:
  level: debug
entities:
  - name: dev
    style: workload_isolated
    cidr: 10.11.0.0/16
    attachment: tgw-attach-dev
    route_table: tgw-rtb-dev
    subnets:
      - group: app
        role: isolated
        availability_zone: us-east-1a
        cidr: 10.11.0.0/24
        route_table: rtb-dev-app-a
      - group: app
        role: isolated
        availability_zone: us-east-1b
        cidr: 10.11.1.0/24
        route_table: rtb-dev-app-b
  - name: prod
    style: workload_isolated
    cidr: 10.12.0.0/16
    attachment: tgw-attach-prod
    route_table: tgw-rtb-prod
  - name: firewall
    style: firewall
    cidr: 100.64.0.0/16
    attachment: tgw-attach-firewall
    route_table: tgw-rtb-firewall
    inspects: true
  - name: egress
    style: nat_egress
    cidr: 10.50.0.0/16
    attachment: tgw-attach-egress
    route_table: tgw-rtb-egress
    subnets:
      - group: public
        role: public
        availability_zone: us-east-1a
        cidr: 10.50.0.0/24
        route_table: rtb-egress-public-a
  - name: onprem
    style: vpn
    attachment: tgw-attach-onprem
    route_table: tgw-rtb-onprem
routes:
  default_routes:
    - vpc_name: dev
      routes_to: egress
  dynamic_routes:
    - vpc_name: dev
      routes_to: prod
      inspected_by: firewall
    - vpc_name: onprem
      routes_to: dev
  blackhole_routes:
    - vpc_name: prod
      blackhole_cidrs:
        - 192.168.100.0/24
"#;

// ============================================================================
// Format Tests
// ============================================================================

#[test]
fn test_load_from_yaml() {
    env::set_var("TRANSIT_ROUTES_IT_HUB", "tgw-0123456789");
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("topology.yaml");
    fs::write(&path, YAML_TOPOLOGY).unwrap();

    let document = config::load_from_file(&path).unwrap();

    assert_eq!(document.hub.as_str(), "tgw-0123456789");
    assert_eq!(document.planner.id_digest_len, 12);
    assert!(document.planner.subnet_routes);
    assert_eq!(document.logging.level, "debug");
    assert_eq!(document.entities.len(), 5);
    assert_eq!(document.entities[4].style, EntityStyle::Vpn);
    assert!(document.entities[4].cidr.is_none());
    assert_eq!(document.entities[0].subnets[1].role, SubnetRole::Isolated);
    assert_eq!(
        document.routes.dynamic_routes[0].inspected_by.as_deref(),
        Some("firewall")
    );
}

#[test]
fn test_load_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("topology.toml");
    let toml_content = r#"
hub = "tgw-toml"

[[entities]]
name = "a"
style = "workload_public"
cidr = "10.1.0.0/16"
attachment = "tgw-attach-a"
route_table = "tgw-rtb-a"

[[entities.subnets]]
group = "web"
role = "public"
availability_zone = "az1"
cidr = "10.1.0.0/24"
route_table = "rtb-a-web"

[[entities]]
name = "b"
style = "workload_isolated"
cidr = "10.2.0.0/16"
attachment = "tgw-attach-b"
route_table = "tgw-rtb-b"

[[routes.static_routes]]
vpc_name = "a"
routes_to = "b"
static_cidr = "172.16.0.0/12"
"#;
    fs::write(&path, toml_content).unwrap();

    let document = config::load_from_file(&path).unwrap();
    assert_eq!(document.hub.as_str(), "tgw-toml");
    assert_eq!(document.planner.id_digest_len, 16);
    assert_eq!(document.routes.static_routes.len(), 1);

    let plan = document.plan().unwrap();
    assert_eq!(plan.summary().static_routes, 1);
    let web: Vec<String> = plan
        .subnet_actions
        .iter()
        .filter(|action| action.subnet_group == "web")
        .map(|action| action.destination.to_string())
        .collect();
    assert_eq!(web, vec!["172.16.0.0/12".to_string()]);
}

#[test]
fn test_load_from_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("topology.json");
    let json_content = r#"{
        "hub": "tgw-json",
        "planner": {"subnet_routes": false},
        "entities": [
            {"name": "a", "style": "workload_isolated", "cidr": "10.1.0.0/16",
             "attachment": "tgw-attach-a", "route_table": "tgw-rtb-a"},
            {"name": "b", "style": "workload_isolated", "cidr": "10.2.0.0/16",
             "attachment": "tgw-attach-b", "route_table": "tgw-rtb-b"}
        ],
        "routes": {
            "dynamic_routes": [{"vpc_name": "a", "routes_to": "b"}]
        }
    }"#;
    fs::write(&path, json_content).unwrap();

    let plan = config::load_from_file(&path).unwrap().plan().unwrap();

    assert_eq!(plan.summary().associations, 2);
    assert!(plan.subnet_actions.is_empty());
}

// ============================================================================
// Planning From Documents
// ============================================================================

#[test]
fn test_yaml_topology_plan() {
    let contents = YAML_TOPOLOGY.replace("${TRANSIT_ROUTES_IT_HUB}", "tgw-inline");
    let document = config::from_str(&contents, ConfigFormat::Yaml).unwrap();

    let plan = document.plan().unwrap();
    let summary = plan.summary();

    assert_eq!(summary.default_routes, 1);
    assert_eq!(summary.inspection_routes, 2);
    assert_eq!(summary.blackholes, 1);

    let default = plan
        .hub_actions
        .iter()
        .find(|action| action.origin() == Some(RouteOrigin::Default))
        .unwrap();
    assert_eq!(default.route_table().as_str(), "tgw-rtb-dev");
    assert_eq!(default.attachment().unwrap().as_str(), "tgw-attach-egress");
    assert_eq!(default.id().as_str().len(), "DefaultRoute-".len() + 12);

    // The VPN learns dev and dev learns the VPN
    assert!(plan.action("Propagation-onprem-to-dev").is_some());
    assert!(plan.action("Propagation-dev-to-onprem").is_some());

    // Dev's app subnets leave through the hub, egress' public subnet routes dev back
    let mut subnet_routes: Vec<(String, String)> = plan
        .subnet_actions
        .iter()
        .map(|action| (action.route_table.to_string(), action.destination.to_string()))
        .collect();
    subnet_routes.sort();
    assert_eq!(
        subnet_routes,
        vec![
            ("rtb-dev-app-a".to_string(), "0.0.0.0/0".to_string()),
            ("rtb-dev-app-b".to_string(), "0.0.0.0/0".to_string()),
            ("rtb-egress-public-a".to_string(), "10.11.0.0/16".to_string()),
        ]
    );
}

#[test]
fn test_replanning_yields_identical_json() {
    let contents = YAML_TOPOLOGY.replace("${TRANSIT_ROUTES_IT_HUB}", "tgw-inline");
    let document = config::from_str(&contents, ConfigFormat::Yaml).unwrap();

    let first = document.plan().unwrap().to_json_pretty().unwrap();
    let second = document.plan().unwrap().to_json_pretty().unwrap();

    assert_eq!(first, second);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_unknown_route_target() {
    let contents = r#"
hub: tgw-1
entities:
  - name: dev
    style: workload_isolated
    cidr: 10.11.0.0/16
    attachment: tgw-attach-dev
    route_table: tgw-rtb-dev
routes:
  dynamic_routes:
    - vpc_name: dev
      routes_to: staging
"#;
    let document = config::from_str(contents, ConfigFormat::Yaml).unwrap();

    assert_eq!(
        document.build().unwrap_err(),
        Error::UnknownEntity {
            name: "staging".to_string()
        }
    );
}

#[test]
fn test_missing_env_var() {
    let err = config::from_str(
        "hub: ${TRANSIT_ROUTES_IT_DEFINITELY_UNSET}\nentities: []\n",
        ConfigFormat::Yaml,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = config::load_from_file(temp_dir.path().join("absent.yaml")).unwrap_err();

    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("topology.ini");
    fs::write(&path, "hub = tgw").unwrap();

    assert!(matches!(
        config::load_from_file(&path),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_invalid_cidr_rejected() {
    let contents = r#"
hub: tgw-1
entities:
  - name: dev
    style: workload_isolated
    cidr: 10.11.0.0/33
    attachment: tgw-attach-dev
    route_table: tgw-rtb-dev
"#;
    assert!(matches!(
        config::from_str(contents, ConfigFormat::Yaml),
        Err(Error::Config(_))
    ));
}
