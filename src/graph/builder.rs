use super::{DependencyGraph, GraphError, ResourceDescriptor};
use crate::stack::{LexiconEntry, ServiceDescriptor, LEXICON};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

pub struct GraphBuilder {
    lexicon: &'static [LexiconEntry],
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { lexicon: LEXICON }
    }

    pub fn with_lexicon(lexicon: &'static [LexiconEntry]) -> Self {
        Self { lexicon }
    }

    pub fn build(
        &self,
        project_name: impl Into<String>,
        services: Vec<ServiceDescriptor>,
    ) -> Result<DependencyGraph, GraphError> {
        let mut seen: HashMap<&str, &ServiceDescriptor> = HashMap::new();
        for service in &services {
            if let Some(first) = seen.insert(service.name.as_str(), service) {
                return Err(GraphError::DuplicateService {
                    name: service.name.clone(),
                    first: first.manifest_path.clone(),
                    second: service.manifest_path.clone(),
                });
            }
        }

        // (kind, image) of each discovered resource, in first-discovery order
        let mut discovered: Vec<&'static LexiconEntry> = Vec::new();
        let mut service_entries: Vec<(String, Vec<usize>)> = Vec::with_capacity(services.len());

        for service in &services {
            let mut indices = Vec::new();
            for dep in service.runtime_dependencies() {
                let Some(entry) = self.lexicon.iter().find(|e| e.matches(dep)) else {
                    continue;
                };
                let index = match discovered
                    .iter()
                    .position(|d| d.kind == entry.kind && d.image == entry.image)
                {
                    Some(index) => index,
                    None => {
                        debug!(
                            service = %service.name,
                            dependency = %dep.name,
                            image = entry.image,
                            "Discovered external resource"
                        );
                        discovered.push(entry);
                        discovered.len() - 1
                    }
                };
                if !indices.contains(&index) {
                    indices.push(index);
                }
            }
            service_entries.push((service.name.clone(), indices));
        }

        let mut taken: HashSet<String> = seen.keys().map(|name| name.to_string()).collect();
        let external_resources: Vec<ResourceDescriptor> = discovered
            .iter()
            .map(|entry| {
                let name = resource_name(entry, &taken);
                taken.insert(name.clone());
                resource_descriptor(entry, name)
            })
            .collect();

        let edges: BTreeMap<String, Vec<String>> = service_entries
            .into_iter()
            .filter(|(_, indices)| !indices.is_empty())
            .map(|(name, indices)| {
                let names = indices
                    .into_iter()
                    .map(|i| external_resources[i].name.clone())
                    .collect();
                (name, names)
            })
            .collect();

        let project_name = project_name.into();
        info!(
            project = %project_name,
            services = services.len(),
            resources = external_resources.len(),
            "Dependency graph built"
        );

        Ok(DependencyGraph {
            project_name,
            services,
            external_resources,
            edges,
        })
    }
}

/// Compose name for a resource: the product name, else `<product>-<kind>`, else numbered
fn resource_name(entry: &LexiconEntry, taken: &HashSet<String>) -> String {
    if !taken.contains(entry.product) {
        return entry.product.to_string();
    }
    let suffixed = format!("{}-{}", entry.product, entry.kind.name_suffix());
    if !taken.contains(&suffixed) {
        return suffixed;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", suffixed, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn resource_descriptor(entry: &LexiconEntry, name: String) -> ResourceDescriptor {
    ResourceDescriptor {
        connection_url: entry.connection_url(&name),
        name,
        kind: entry.kind,
        image: entry.image.to_string(),
        port: entry.port,
        data_path: entry.data_path.map(String::from),
        env_var: entry.env_var.to_string(),
        environment: entry
            .image_env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{
        Dependency, Ecosystem, PackageManager, ResourceKind, RuntimeHints, ServiceKind,
    };
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn service(name: &str, deps: &[&str]) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            kind: ServiceKind::ApiBackend,
            port: Some(3000),
            dependencies: deps.iter().map(|d| Dependency::new(*d, None)).collect(),
            declared_datastores: BTreeSet::new(),
            relative_root: PathBuf::from(name),
            manifest_path: PathBuf::from(name).join("package.json"),
            ecosystem: Ecosystem::Node,
            package_manager: PackageManager::Npm,
            framework: None,
            hints: RuntimeHints::default(),
        }
    }

    #[test]
    fn test_shared_cache_yields_one_resource() {
        let graph = GraphBuilder::new()
            .build(
                "demo",
                vec![service("api", &["express", "ioredis"]), service("worker", &["redis"])],
            )
            .unwrap();

        assert_eq!(graph.external_resources.len(), 1);
        let redis = &graph.external_resources[0];
        assert_eq!(redis.name, "redis");
        assert_eq!(redis.kind, ResourceKind::Cache);
        assert_eq!(redis.port, 6379);
        assert_eq!(graph.edges["api"], vec!["redis"]);
        assert_eq!(graph.edges["worker"], vec!["redis"]);
    }

    #[test]
    fn test_resources_follow_discovery_order() {
        let graph = GraphBuilder::new()
            .build(
                "demo",
                vec![service("api", &["pg", "redis"]), service("jobs", &["amqplib", "mongoose"])],
            )
            .unwrap();
        let names: Vec<_> = graph.external_resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["postgres", "redis", "rabbitmq", "mongo"]);
        let jobs: Vec<_> = graph.resources_for("jobs").map(|r| r.name.as_str()).collect();
        assert_eq!(jobs, vec!["rabbitmq", "mongo"]);
    }

    #[test]
    fn test_dev_dependencies_do_not_create_resources() {
        let mut api = service("api", &["express"]);
        api.dependencies.push(Dependency::dev("pg", None));
        let graph = GraphBuilder::new().build("demo", vec![api]).unwrap();
        assert!(graph.external_resources.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_duplicate_service_name_is_fatal() {
        let err = GraphBuilder::new()
            .build("demo", vec![service("api", &[]), service("api", &[])])
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateService { ref name, .. } if name == "api"));
    }

    #[test]
    fn test_resource_name_collision_with_service() {
        let graph = GraphBuilder::new()
            .build("demo", vec![service("redis", &["express"]), service("api", &["redis"])])
            .unwrap();
        assert_eq!(graph.external_resources[0].name, "redis-cache");
        assert_eq!(
            graph.external_resources[0].connection_url,
            "redis://redis-cache:6379"
        );
    }

    #[test]
    fn test_suffixed_resource_name_skips_taken_names() {
        let graph = GraphBuilder::new()
            .build(
                "demo",
                vec![
                    service("redis", &["express"]),
                    service("redis-cache", &["express"]),
                    service("api", &["ioredis"]),
                ],
            )
            .unwrap();
        assert_eq!(graph.external_resources[0].name, "redis-cache-2");
        assert_eq!(graph.edges["api"], vec!["redis-cache-2"]);
        assert_eq!(
            graph.external_resources[0].connection_url,
            "redis://redis-cache-2:6379"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let services = vec![service("web", &["next"]), service("api", &["mysql2", "kafkajs"])];
        let a = GraphBuilder::new().build("demo", services.clone()).unwrap();
        let b = GraphBuilder::new().build("demo", services).unwrap();
        assert_eq!(a, b);
    }
}
