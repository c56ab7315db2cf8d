//! Remote services.
//!
//! This module provides:
//! - Service traits the reconciler depends on
//! - AWS SDK clients implementing them
//! - A paginated mirror of the remote resource tree

mod api;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod mirror;
mod types;

pub use api::{AlarmApi, Backends, FunctionApi, GatewayApi};
#[cfg(test)]
pub(crate) use api::{MockAlarmApi, MockFunctionApi, MockGatewayApi};
pub use client::{AwsAlarms, AwsFunctions, AwsGateway, connect};
pub use mirror::{RemoteMirror, normalize_resource};
pub use types::{
    DeploymentRequest, InvokePermission, KeyPage, NewApiKey, RESOURCE_PAGE_SIZE, RemoteAuthorizer,
    RemoteMethod, RemoteResource, ResourcePage, RestApiInfo,
};
