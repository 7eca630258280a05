//! Service descriptor types shared by classification, graph building and generation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Deployable role of a detected service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    WebFrontend,
    ApiBackend,
    Worker,
    Unknown,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::WebFrontend => "web-frontend",
            ServiceKind::ApiBackend => "api-backend",
            ServiceKind::Worker => "worker",
            ServiceKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of external resource a service talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Database,
    Cache,
    Queue,
}

/// Datastores declared by a service are expressed with the same kinds as graph resources
pub type DatastoreKind = ResourceKind;

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Database => "database",
            ResourceKind::Cache => "cache",
            ResourceKind::Queue => "queue",
        }
    }

    /// Stateful kinds get a named volume in the orchestration descriptor
    pub fn is_stateful(&self) -> bool {
        matches!(self, ResourceKind::Database | ResourceKind::Queue)
    }

    pub(crate) fn name_suffix(&self) -> &'static str {
        match self {
            ResourceKind::Database => "db",
            ResourceKind::Cache => "cache",
            ResourceKind::Queue => "queue",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language ecosystem a manifest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Node,
    Python,
    Go,
    Rust,
    Java,
    Ruby,
    Php,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Node => "node",
            Ecosystem::Python => "python",
            Ecosystem::Go => "go",
            Ecosystem::Rust => "rust",
            Ecosystem::Java => "java",
            Ecosystem::Ruby => "ruby",
            Ecosystem::Php => "php",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency manager used to install a service's dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
    Pip,
    Poetry,
    GoModules,
    Cargo,
    Maven,
    Gradle,
    Bundler,
    Composer,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
            PackageManager::Pip => "pip",
            PackageManager::Poetry => "poetry",
            PackageManager::GoModules => "go",
            PackageManager::Cargo => "cargo",
            PackageManager::Maven => "maven",
            PackageManager::Gradle => "gradle",
            PackageManager::Bundler => "bundler",
            PackageManager::Composer => "composer",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared dependency; ordering is by name so descriptor dependency lists form an ordered set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dev: bool,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            dev: false,
        }
    }

    pub fn dev(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            dev: true,
        }
    }
}

/// Hints picked up from the manifest that the fallback Dockerfile templates need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeHints {
    pub has_build_script: bool,
    pub has_start_script: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_name: Option<String>,
}

/// One deployable unit detected in the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub kind: ServiceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub dependencies: Vec<Dependency>,
    pub declared_datastores: BTreeSet<DatastoreKind>,
    /// Service root relative to the scanned repository root (empty for the root itself)
    pub relative_root: PathBuf,
    pub manifest_path: PathBuf,
    pub ecosystem: Ecosystem,
    pub package_manager: PackageManager,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub hints: RuntimeHints,
}

impl ServiceDescriptor {
    /// Forward-slash path of the service root, "." for the repository root
    pub fn context_path(&self) -> String {
        let parts: Vec<String> = self
            .relative_root
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }

    /// Runtime (non-dev) dependencies in name order
    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| !d.dev)
    }
}
