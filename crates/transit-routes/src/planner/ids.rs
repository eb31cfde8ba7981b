//! Deterministic action identifiers

use crate::models::{ActionId, RouteTableHandle};
use ipnet::Ipv4Net;
use sha2::{Digest, Sha256};

const MIN_DIGEST_LEN: usize = 8;
const MAX_DIGEST_LEN: usize = 64;

/// Builds action ids from stable planning inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActionIds {
    digest_len: usize,
}

impl ActionIds {
    pub(crate) fn new(digest_len: usize) -> Self {
        Self {
            digest_len: digest_len.clamp(MIN_DIGEST_LEN, MAX_DIGEST_LEN),
        }
    }

    fn digest(&self, parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for (index, part) in parts.iter().enumerate() {
            if index > 0 {
                hasher.update(b"-");
            }
            hasher.update(part.as_bytes());
        }
        let mut encoded = hex::encode(hasher.finalize());
        encoded.truncate(self.digest_len);
        encoded
    }

    pub(crate) fn static_route(&self, entity: &str, cidr: &Ipv4Net, target: &str) -> ActionId {
        let digest = self.digest(&[entity, &cidr.to_string(), target]);
        ActionId::new(format!("StaticRoute-{}", digest))
    }

    /// Keyed by route table only: one hub route table holds one default route
    pub(crate) fn default_route(&self, route_table: &RouteTableHandle) -> ActionId {
        ActionId::new(format!("DefaultRoute-{}", self.digest(&[route_table.as_str()])))
    }

    pub(crate) fn blackhole(&self, entity: &str, cidr: &Ipv4Net) -> ActionId {
        let digest = self.digest(&[entity, &cidr.to_string()]);
        ActionId::new(format!("Blackhole-{}", digest))
    }

    pub(crate) fn propagation(&self, entity: &str, target: &str) -> ActionId {
        ActionId::new(format!("Propagation-{}-to-{}", entity, target))
    }

    pub(crate) fn inspection_route(&self, entity: &str, target: &str) -> ActionId {
        ActionId::new(format!("InspectionRoute-{}-to-{}", entity, target))
    }

    pub(crate) fn subnet_default(&self, route_table: &RouteTableHandle) -> ActionId {
        ActionId::new(format!("SubnetDefault-{}", self.digest(&[route_table.as_str()])))
    }

    pub(crate) fn subnet_cidr(
        &self,
        entity: &str,
        route_table: &RouteTableHandle,
        destination: &Ipv4Net,
    ) -> ActionId {
        let digest = self.digest(&[entity, route_table.as_str(), &destination.to_string()]);
        ActionId::new(format!("SubnetCidr-{}", digest))
    }
}
