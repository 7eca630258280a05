//! Orchestration descriptor synthesis

use super::GenerationError;
use crate::graph::{DependencyGraph, ResourceDescriptor};
use crate::stack::ServiceDescriptor;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;

fn key(s: &str) -> Value {
    Value::String(s.to_string())
}

fn string_seq<I: IntoIterator<Item = String>>(items: I) -> Value {
    Value::Sequence(items.into_iter().map(Value::String).collect())
}

/// Hands out host ports, bumping past ones already published
#[derive(Default)]
struct HostPorts {
    used: BTreeSet<u16>,
}

impl HostPorts {
    fn allocate(&mut self, preferred: u16) -> u16 {
        let mut port = preferred;
        while self.used.contains(&port) {
            port = port.checked_add(1).unwrap_or(1024);
        }
        self.used.insert(port);
        port
    }
}

/// Variable name a resource is exposed under, falling back to `{NAME}_URL` when taken
fn connection_var(resource: &ResourceDescriptor, taken: &BTreeSet<String>) -> String {
    if !taken.contains(&resource.env_var) {
        return resource.env_var.clone();
    }
    format!("{}_URL", resource.name.to_ascii_uppercase().replace('-', "_"))
}

fn service_entry(graph: &DependencyGraph, service: &ServiceDescriptor, ports: &mut HostPorts) -> Mapping {
    let mut entry = Mapping::new();

    let mut build = Mapping::new();
    let context = service.context_path();
    let context = if context == "." {
        context
    } else {
        format!("./{}", context)
    };
    build.insert(key("context"), Value::String(context));
    build.insert(key("dockerfile"), key("Dockerfile"));
    entry.insert(key("build"), Value::Mapping(build));

    if let Some(port) = service.port {
        let host = ports.allocate(port);
        entry.insert(key("ports"), string_seq([format!("{}:{}", host, port)]));
    }

    let mut environment = Mapping::new();
    let mut taken = BTreeSet::new();
    if let Some(port) = service.port {
        environment.insert(key("PORT"), Value::String(port.to_string()));
        taken.insert("PORT".to_string());
    }
    let resources: Vec<&ResourceDescriptor> = graph.resources_for(&service.name).collect();
    for resource in &resources {
        let var = connection_var(resource, &taken);
        environment.insert(key(&var), Value::String(resource.connection_url.clone()));
        taken.insert(var);
    }
    if !environment.is_empty() {
        entry.insert(key("environment"), Value::Mapping(environment));
    }

    if !resources.is_empty() {
        entry.insert(
            key("depends_on"),
            string_seq(resources.iter().map(|r| r.name.clone())),
        );
    }

    entry.insert(key("restart"), key("unless-stopped"));
    entry
}

fn resource_entry(resource: &ResourceDescriptor, ports: &mut HostPorts) -> Mapping {
    let mut entry = Mapping::new();
    entry.insert(key("image"), Value::String(resource.image.clone()));

    let host = ports.allocate(resource.port);
    entry.insert(key("ports"), string_seq([format!("{}:{}", host, resource.port)]));

    if !resource.environment.is_empty() {
        let environment: Mapping = resource
            .environment
            .iter()
            .map(|(k, v)| (key(k), Value::String(v.clone())))
            .collect();
        entry.insert(key("environment"), Value::Mapping(environment));
    }

    if let (true, Some(path)) = (resource.kind.is_stateful(), &resource.data_path) {
        entry.insert(
            key("volumes"),
            string_seq([format!("{}-data:{}", resource.name, path)]),
        );
    }

    entry.insert(key("restart"), key("unless-stopped"));
    entry
}

/// Renders docker-compose YAML for the whole graph
pub fn render_compose(graph: &DependencyGraph) -> Result<String, GenerationError> {
    let mut ports = HostPorts::default();
    let mut services = Mapping::new();

    for service in &graph.services {
        services.insert(
            key(&service.name),
            Value::Mapping(service_entry(graph, service, &mut ports)),
        );
    }

    let mut volumes = Mapping::new();
    for resource in &graph.external_resources {
        services.insert(
            key(&resource.name),
            Value::Mapping(resource_entry(resource, &mut ports)),
        );
        if resource.kind.is_stateful() && resource.data_path.is_some() {
            volumes.insert(key(&format!("{}-data", resource.name)), Value::Mapping(Mapping::new()));
        }
    }

    let mut root = Mapping::new();
    root.insert(key("name"), Value::String(graph.project_name.clone()));
    root.insert(key("services"), Value::Mapping(services));
    if !volumes.is_empty() {
        root.insert(key("volumes"), Value::Mapping(volumes));
    }

    serde_yaml::to_string(&Value::Mapping(root)).map_err(|e| GenerationError::Serialization {
        what: "compose".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::stack::{Dependency, Ecosystem, PackageManager, RuntimeHints, ServiceKind};
    use std::path::PathBuf;

    fn svc(name: &str, port: Option<u16>, deps: &[&str]) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            kind: ServiceKind::ApiBackend,
            port,
            dependencies: deps.iter().map(|d| Dependency::new(*d, None)).collect(),
            declared_datastores: Default::default(),
            relative_root: PathBuf::from(name),
            manifest_path: PathBuf::from(name).join("package.json"),
            ecosystem: Ecosystem::Node,
            package_manager: PackageManager::Npm,
            framework: None,
            hints: RuntimeHints::default(),
        }
    }

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_services_and_resources() {
        let graph = GraphBuilder::new()
            .build(
                "shop",
                vec![
                    svc("web", Some(3000), &[]),
                    svc("api", Some(8080), &["pg", "ioredis"]),
                ],
            )
            .unwrap();
        let compose = parse(&render_compose(&graph).unwrap());

        assert_eq!(compose["name"], "shop");
        let api = &compose["services"]["api"];
        assert_eq!(api["build"]["context"], "./api");
        assert_eq!(api["ports"][0], "8080:8080");
        assert_eq!(api["environment"]["REDIS_URL"], "redis://redis:6379");
        assert_eq!(api["depends_on"][0], "postgres");
        assert_eq!(api["depends_on"][1], "redis");
        assert!(compose["services"]["web"].get("depends_on").is_none());

        let postgres = &compose["services"]["postgres"];
        assert_eq!(postgres["image"], "postgres:16-alpine");
        assert_eq!(postgres["volumes"][0], "postgres-data:/var/lib/postgresql/data");
        assert!(compose["services"]["redis"].get("volumes").is_none());
        assert!(compose["volumes"].get("postgres-data").is_some());
        assert!(compose["volumes"].get("redis-data").is_none());
    }

    #[test]
    fn test_resource_never_replaces_a_service_entry() {
        let graph = GraphBuilder::new()
            .build(
                "shop",
                vec![
                    svc("redis", Some(3000), &["express"]),
                    svc("redis-cache", Some(3001), &["express"]),
                    svc("api", Some(8080), &["ioredis"]),
                ],
            )
            .unwrap();
        let compose = parse(&render_compose(&graph).unwrap());

        let services = compose["services"].as_mapping().unwrap();
        assert_eq!(services.len(), 4);
        assert_eq!(compose["services"]["redis-cache"]["build"]["context"], "./redis-cache");
        assert_eq!(compose["services"]["redis-cache-2"]["image"], "redis:7-alpine");
        assert_eq!(compose["services"]["api"]["depends_on"][0], "redis-cache-2");
    }

    #[test]
    fn test_host_ports_are_unique() {
        let graph = GraphBuilder::new()
            .build("p", vec![svc("a", Some(3000), &[]), svc("b", Some(3000), &[])])
            .unwrap();
        let compose = parse(&render_compose(&graph).unwrap());
        assert_eq!(compose["services"]["a"]["ports"][0], "3000:3000");
        assert_eq!(compose["services"]["b"]["ports"][0], "3001:3000");
    }

    #[test]
    fn test_second_database_gets_named_variable() {
        let graph = GraphBuilder::new()
            .build("p", vec![svc("api", None, &["mysql2", "pg"])])
            .unwrap();
        let compose = parse(&render_compose(&graph).unwrap());
        let env = &compose["services"]["api"]["environment"];
        assert!(env.get("DATABASE_URL").is_some());
        let names: Vec<&str> = env
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("_URL") && *n != "DATABASE_URL"));
    }

    #[test]
    fn test_root_service_context() {
        let mut root = svc("app", Some(8000), &[]);
        root.relative_root = PathBuf::new();
        let graph = GraphBuilder::new().build("p", vec![root]).unwrap();
        let compose = parse(&render_compose(&graph).unwrap());
        assert_eq!(compose["services"]["app"]["build"]["context"], ".");
        assert!(compose.get("volumes").is_none());
    }
}
