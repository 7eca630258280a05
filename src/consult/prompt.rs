//! Prompt composition
//!
//! The graph is rendered as plain-text blocks, one per service (or service
//! group) followed by one per external resource, and packed into fragments
//! of at most `max_fragment_size` bytes. When the packed prompt needs more
//! than `max_fragments` fragments the composer summarizes progressively:
//! identical services collapse into groups, then services of the same kind
//! and ecosystem, then dependency lists get shorter.

use super::response::answer_schema;
use crate::graph::DependencyGraph;
use crate::stack::{Ecosystem, ServiceDescriptor, ServiceKind};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

const BLOCK_SEPARATOR: &str = "\n\n";
const MIN_FRAGMENT_SIZE: usize = 64;
const DEPENDENCY_LIMITS: &[usize] = &[8, 3, 0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFragment {
    pub index: usize,
    pub text: String,
}

/// How far the composer had to summarize to fit the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SummaryLevel {
    Full,
    /// Services with identical signatures collapsed
    IdenticalGroups,
    /// Services of the same kind and ecosystem collapsed
    KindGroups,
    /// Kind groups with dependency lists cut to the given length
    ShortenedDependencies(usize),
}

impl fmt::Display for SummaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLevel::Full => f.write_str("full"),
            SummaryLevel::IdenticalGroups => f.write_str("identical services grouped"),
            SummaryLevel::KindGroups => f.write_str("services grouped by kind"),
            SummaryLevel::ShortenedDependencies(n) => {
                write!(f, "services grouped by kind, dependency lists cut to {}", n)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub fragments: Vec<PromptFragment>,
    pub level: SummaryLevel,
}

impl Composition {
    pub fn total_bytes(&self) -> usize {
        self.fragments.iter().map(|f| f.text.len()).sum()
    }

    pub fn is_summarized(&self) -> bool {
        self.level != SummaryLevel::Full
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Project description needs {required} fragments even fully summarized, limit is {limit}")]
    BudgetExceeded { required: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    None,
    Identical,
    Kind,
}

pub struct PromptComposer {
    max_fragment_size: usize,
    max_fragments: usize,
}

impl PromptComposer {
    pub fn new(max_fragment_size: usize, max_fragments: usize) -> Self {
        Self {
            max_fragment_size: max_fragment_size.max(MIN_FRAGMENT_SIZE),
            max_fragments: max_fragments.max(1),
        }
    }

    pub fn budget(&self) -> usize {
        self.max_fragment_size * self.max_fragments
    }

    pub fn compose(&self, graph: &DependencyGraph) -> Result<Composition, PromptError> {
        let mut levels = vec![
            (SummaryLevel::Full, Grouping::None, None),
            (SummaryLevel::IdenticalGroups, Grouping::Identical, None),
            (SummaryLevel::KindGroups, Grouping::Kind, None),
        ];
        levels.extend(
            DEPENDENCY_LIMITS
                .iter()
                .map(|&n| (SummaryLevel::ShortenedDependencies(n), Grouping::Kind, Some(n))),
        );

        let mut required = 0;
        for (level, grouping, dep_limit) in levels {
            let blocks = render_blocks(graph, grouping, dep_limit);
            let packed = self.pack(&blocks);
            debug!(level = %level, fragments = packed.len(), "Packed prompt");

            if packed.len() <= self.max_fragments {
                if level != SummaryLevel::Full {
                    info!(level = %level, "Project description summarized to fit the prompt budget");
                }
                let fragments = packed
                    .into_iter()
                    .enumerate()
                    .map(|(index, text)| PromptFragment { index, text })
                    .collect();
                return Ok(Composition { fragments, level });
            }
            required = packed.len();
        }

        Err(PromptError::BudgetExceeded {
            required,
            limit: self.max_fragments,
        })
    }

    fn pack(&self, blocks: &[String]) -> Vec<String> {
        let limit = self.max_fragment_size;
        let mut fragments = Vec::new();
        let mut current = String::new();

        for block in blocks {
            let needed = if current.is_empty() {
                block.len()
            } else {
                current.len() + BLOCK_SEPARATOR.len() + block.len()
            };
            if needed <= limit {
                if !current.is_empty() {
                    current.push_str(BLOCK_SEPARATOR);
                }
                current.push_str(block);
                continue;
            }

            if !current.is_empty() {
                fragments.push(std::mem::take(&mut current));
            }

            let mut rest = block.as_str();
            while rest.len() > limit {
                let mut cut = limit;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                fragments.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
        }

        if !current.is_empty() {
            fragments.push(current);
        }
        fragments
    }
}

/// Instruction sent ahead of the fragments
pub fn system_prompt(project_name: &str) -> String {
    format!(
        "You are a container build expert. The user describes the services of the \
project '{project}' in one or more parts. Write a production-ready Dockerfile for \
every service you can, using the service name exactly as given. Build context is the \
service directory. Optionally add a CI pipeline definition as YAML. Respond with a \
single JSON object and nothing else. The object must validate against this JSON \
schema, additional fields are rejected:\n{schema}\n",
        project = project_name,
        schema = answer_schema()
    )
}

type Signature<'a> = (ServiceKind, Ecosystem, Option<&'a str>, Option<u16>, Vec<&'a str>);

fn signature(service: &ServiceDescriptor) -> Signature<'_> {
    (
        service.kind,
        service.ecosystem,
        service.framework.as_deref(),
        service.port,
        service.dependencies.iter().map(|d| d.name.as_str()).collect(),
    )
}

/// Groups services preserving first-member order
fn group_services(services: &[ServiceDescriptor], grouping: Grouping) -> Vec<Vec<&ServiceDescriptor>> {
    match grouping {
        Grouping::None => services.iter().map(|s| vec![s]).collect(),
        Grouping::Identical => group_by(services, signature),
        Grouping::Kind => group_by(services, |s| (s.kind, s.ecosystem)),
    }
}

fn group_by<'a, K: PartialEq>(
    services: &'a [ServiceDescriptor],
    key: impl Fn(&'a ServiceDescriptor) -> K,
) -> Vec<Vec<&'a ServiceDescriptor>> {
    let mut groups: Vec<(K, Vec<&ServiceDescriptor>)> = Vec::new();
    for service in services {
        let k = key(service);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(service),
            None => groups.push((k, vec![service])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn render_blocks(graph: &DependencyGraph, grouping: Grouping, dep_limit: Option<usize>) -> Vec<String> {
    let mut blocks: Vec<String> = group_services(&graph.services, grouping)
        .iter()
        .map(|members| render_service_group(graph, members, dep_limit))
        .collect();
    blocks.extend(graph.external_resources.iter().map(|resource| {
        let users: Vec<&str> = graph
            .edges
            .iter()
            .filter(|(_, names)| names.contains(&resource.name))
            .map(|(service, _)| service.as_str())
            .collect();
        let mut block = format!(
            "resource {}\n  kind: {}\n  image: {}\n  port: {}\n  connection: {}={}",
            resource.name,
            resource.kind,
            resource.image,
            resource.port,
            resource.env_var,
            resource.connection_url
        );
        if !users.is_empty() {
            block.push_str(&format!("\n  used by: {}", users.join(", ")));
        }
        block
    }));
    blocks
}

fn distinct<T: Ord>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn limit_list(items: Vec<String>, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if items.len() > limit => {
            let more = items.len() - limit;
            let shown = &items[..limit];
            if shown.is_empty() {
                format!("(+{} more)", more)
            } else {
                format!("{} (+{} more)", shown.join(", "), more)
            }
        }
        _ => items.join(", "),
    }
}

fn render_service_group(
    graph: &DependencyGraph,
    members: &[&ServiceDescriptor],
    dep_limit: Option<usize>,
) -> String {
    let mut lines = Vec::new();
    let single = members.len() == 1;

    if single {
        lines.push(format!("service {}", members[0].name));
    } else {
        let names: Vec<&str> = members.iter().map(|s| s.name.as_str()).collect();
        lines.push(format!(
            "service group ({} services): {}",
            members.len(),
            names.join(", ")
        ));
    }

    let kinds = distinct(members.iter().map(|s| s.kind.as_str()));
    lines.push(format!("  kind: {}", kinds.join(", ")));

    let ecosystems = distinct(
        members
            .iter()
            .map(|s| format!("{} ({})", s.ecosystem, s.package_manager)),
    );
    lines.push(format!("  ecosystem: {}", ecosystems.join(", ")));

    let frameworks = distinct(members.iter().filter_map(|s| s.framework.as_deref()));
    if !frameworks.is_empty() {
        lines.push(format!("  framework: {}", frameworks.join(", ")));
    }

    if single {
        lines.push(format!("  path: {}", members[0].context_path()));
    }

    let ports = distinct(members.iter().filter_map(|s| s.port));
    if !ports.is_empty() {
        let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
        lines.push(format!("  port: {}", ports.join(", ")));
    }

    let render_deps = |dev: bool| -> Vec<String> {
        if single {
            members[0]
                .dependencies
                .iter()
                .filter(|d| d.dev == dev)
                .map(|d| match &d.version {
                    Some(v) => format!("{}@{}", d.name, v),
                    None => d.name.clone(),
                })
                .collect()
        } else {
            distinct(
                members
                    .iter()
                    .flat_map(|s| s.dependencies.iter())
                    .filter(|d| d.dev == dev)
                    .map(|d| d.name.clone()),
            )
        }
    };
    let deps = render_deps(false);
    if !deps.is_empty() {
        lines.push(format!("  dependencies: {}", limit_list(deps, dep_limit)));
    }
    let dev_deps = render_deps(true);
    if !dev_deps.is_empty() {
        lines.push(format!("  dev-dependencies: {}", limit_list(dev_deps, dep_limit)));
    }

    if single {
        let hints = &members[0].hints;
        let scripts: Vec<&str> = [("build", hints.has_build_script), ("start", hints.has_start_script)]
            .iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| *name)
            .collect();
        if !scripts.is_empty() {
            lines.push(format!("  scripts: {}", scripts.join(", ")));
        }
        if let Some(entry) = hints.entrypoint.as_ref().or(hints.binary_name.as_ref()) {
            lines.push(format!("  entrypoint: {}", entry));
        }
    }

    let resources = distinct(
        members
            .iter()
            .flat_map(|s| graph.resources_for(&s.name))
            .map(|r| r.name.as_str()),
    );
    if !resources.is_empty() {
        lines.push(format!("  uses: {}", resources.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::stack::{Dependency, PackageManager, RuntimeHints};
    use std::path::PathBuf;

    fn service(name: &str, deps: &[&str]) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            kind: ServiceKind::ApiBackend,
            port: Some(3000),
            dependencies: deps.iter().map(|d| Dependency::new(*d, Some("1.0".to_string()))).collect(),
            declared_datastores: Default::default(),
            relative_root: PathBuf::from("services").join(name),
            manifest_path: PathBuf::from("services").join(name).join("package.json"),
            ecosystem: Ecosystem::Node,
            package_manager: PackageManager::Npm,
            framework: Some("express".to_string()),
            hints: RuntimeHints::default(),
        }
    }

    fn graph(services: Vec<ServiceDescriptor>) -> DependencyGraph {
        GraphBuilder::new().build("demo", services).unwrap()
    }

    fn assert_within_budget(composer: &PromptComposer, composition: &Composition, size: usize, count: usize) {
        assert!(composition.fragments.len() <= count);
        assert!(composition.fragments.iter().all(|f| f.text.len() <= size));
        assert!(composition.total_bytes() <= composer.budget());
    }

    #[test]
    fn test_small_graph_is_not_summarized() {
        let graph = graph(vec![service("api", &["express", "ioredis"]), service("web", &["next"])]);
        let composer = PromptComposer::new(4096, 4);
        let composition = composer.compose(&graph).unwrap();

        assert_eq!(composition.level, SummaryLevel::Full);
        assert_eq!(composition.fragments.len(), 1);
        let text = &composition.fragments[0].text;
        assert!(text.starts_with("service api"));
        assert!(text.contains("dependencies: express@1.0, ioredis@1.0"));
        assert!(text.contains("uses: redis"));
        let api_pos = text.find("service api").unwrap();
        let web_pos = text.find("service web").unwrap();
        let redis_pos = text.find("resource redis").unwrap();
        assert!(api_pos < web_pos && web_pos < redis_pos);
    }

    #[test]
    fn test_identical_services_collapse() {
        let services: Vec<_> = (0..20)
            .map(|i| service(&format!("svc{:02}", i), &["express", "pg"]))
            .collect();
        let graph = graph(services);
        let composer = PromptComposer::new(512, 2);
        let composition = composer.compose(&graph).unwrap();

        assert_eq!(composition.level, SummaryLevel::IdenticalGroups);
        let text: String = composition.fragments.iter().map(|f| f.text.as_str()).collect();
        assert!(text.contains("service group (20 services): svc00, svc01"));
        assert!(text.contains("resource postgres"));
        assert_within_budget(&composer, &composition, 512, 2);
    }

    #[test]
    fn test_dependency_lists_are_shortened() {
        let many: Vec<String> = (0..40).map(|i| format!("library-number-{:02}", i)).collect();
        let mut services = Vec::new();
        for i in 0..6 {
            let names: Vec<&str> = many.iter().skip(i).map(String::as_str).collect();
            services.push(service(&format!("svc{}", i), &names));
        }
        let graph = graph(services);
        let composer = PromptComposer::new(256, 2);
        let composition = composer.compose(&graph).unwrap();

        assert!(matches!(composition.level, SummaryLevel::ShortenedDependencies(_)));
        let text: String = composition.fragments.iter().map(|f| f.text.as_str()).collect();
        assert!(text.contains("more)"));
        assert_within_budget(&composer, &composition, 256, 2);
    }

    #[test]
    fn test_oversized_block_is_split() {
        let long_names: Vec<String> = (0..30).map(|i| format!("dependency-{:03}-é", i)).collect();
        let names: Vec<&str> = long_names.iter().map(String::as_str).collect();
        let graph = graph(vec![service("api", &names)]);
        let composer = PromptComposer::new(128, 10);
        let composition = composer.compose(&graph).unwrap();

        assert_eq!(composition.level, SummaryLevel::Full);
        assert!(composition.fragments.len() > 1);
        assert_within_budget(&composer, &composition, 128, 10);
        let joined: String = composition.fragments.iter().map(|f| f.text.as_str()).collect();
        assert!(joined.contains("dependency-029-é"));
    }

    #[test]
    fn test_budget_exceeded() {
        let services: Vec<_> = (0..200)
            .map(|i| {
                let mut s = service(&format!("service-with-a-long-name-{:03}", i), &[]);
                s.ecosystem = if i % 2 == 0 { Ecosystem::Go } else { Ecosystem::Node };
                s.kind = if i % 3 == 0 { ServiceKind::Worker } else { ServiceKind::ApiBackend };
                s
            })
            .collect();
        let graph = graph(services);
        let composer = PromptComposer::new(64, 1);
        assert!(matches!(
            composer.compose(&graph),
            Err(PromptError::BudgetExceeded { limit: 1, .. })
        ));
    }

    #[test]
    fn test_system_prompt_embeds_schema() {
        let prompt = system_prompt("demo");
        assert!(prompt.contains("'demo'"));
        assert!(prompt.contains("\"services\""));
    }
}
