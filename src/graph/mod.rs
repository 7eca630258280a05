//! Service dependency graph
//!
//! Infers external resources from service dependencies and records which
//! service needs which resource.

mod builder;

pub use builder::GraphBuilder;

use crate::stack::{ResourceKind, ServiceDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// An external resource (database, cache, queue) needed by one or more services
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// Compose service name
    pub name: String,
    pub kind: ResourceKind,
    pub image: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    /// Variable dependent services receive
    pub env_var: String,
    pub connection_url: String,
    /// Environment of the resource container itself
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub project_name: String,
    pub services: Vec<ServiceDescriptor>,
    pub external_resources: Vec<ResourceDescriptor>,
    /// Service name to the names of the resources it depends on, in discovery order
    pub edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.external_resources.iter().find(|r| r.name == name)
    }

    /// Resources a service depends on, in discovery order
    pub fn resources_for<'a>(&'a self, service: &str) -> impl Iterator<Item = &'a ResourceDescriptor> + 'a {
        self.edges
            .get(service)
            .into_iter()
            .flatten()
            .filter_map(move |name| self.resource(name))
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate service name '{name}' ({} and {})", first.display(), second.display())]
    DuplicateService {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}
