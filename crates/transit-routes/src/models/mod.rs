//! Data models for route planning

mod action;
mod entity;
mod route;

pub use action::{ActionId, HubAction, RouteOrigin, SubnetRouteAction};
pub use entity::{
    AttachmentHandle, Entity, EntityStyle, HubHandle, RouteTableHandle, Subnet, SubnetRole,
};
pub use route::{EntityId, RouteTarget, StaticRoute, DEFAULT_DESTINATION};
