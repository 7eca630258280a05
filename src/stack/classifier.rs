//! Candidate classification
//!
//! Turns a scanned manifest into a [`ServiceDescriptor`] using the matcher
//! table. A manifest with no runtime signal and no matching framework is not
//! a service (workspace roots, shared libraries).

use super::lexicon;
use super::manifest::{parse_manifest, ClassificationError, ManifestKind, ParsedManifest};
use super::matcher::find_matcher;
use super::types::{
    Ecosystem, PackageManager, RuntimeHints, ServiceDescriptor, ServiceKind,
};
use crate::scan::ServiceCandidate;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Scripts inspected for an explicit port, in priority order
const PORT_SCRIPTS: &[&str] = &["start", "dev", "serve", "preview"];

/// Outcome of classifying one candidate
#[derive(Debug, Clone)]
pub struct Classification {
    pub descriptor: ServiceDescriptor,
    /// Set when the manifest could not be parsed; the descriptor is then `unknown`
    pub error: Option<ClassificationError>,
}

pub struct ServiceClassifier {
    root_name: String,
}

impl ServiceClassifier {
    /// `scan_root` names services whose manifest sits at the repository root
    pub fn new(scan_root: &Path) -> Self {
        let root_name = scan_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { root_name }
    }

    pub fn classify(&self, candidate: &ServiceCandidate) -> Option<Classification> {
        let ecosystem = candidate.kind.ecosystem();

        let parsed = match parse_manifest(candidate.kind, &candidate.raw_manifest) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    manifest = %candidate.manifest_path.display(),
                    error = %error,
                    "Manifest could not be parsed, classifying as unknown"
                );
                let descriptor = ServiceDescriptor {
                    name: self.service_name(candidate, None),
                    kind: ServiceKind::Unknown,
                    port: None,
                    dependencies: Vec::new(),
                    declared_datastores: BTreeSet::new(),
                    relative_root: candidate.relative_root.clone(),
                    manifest_path: candidate.manifest_path.clone(),
                    ecosystem,
                    package_manager: package_manager(candidate, None),
                    framework: None,
                    hints: RuntimeHints::default(),
                };
                return Some(Classification {
                    descriptor,
                    error: Some(error),
                });
            }
        };

        let matcher = find_matcher(ecosystem, &parsed.dependencies);
        let script_port = script_port(&parsed);

        let (kind, port, framework) = match matcher {
            Some(m) => (m.kind, script_port.or(m.default_port), Some(m.id.to_string())),
            None if script_port.is_some() => (ServiceKind::ApiBackend, script_port, None),
            None if parsed.runtime_signal => (ServiceKind::Worker, None, None),
            None => {
                debug!(
                    manifest = %candidate.manifest_path.display(),
                    "No runtime signal, not a service"
                );
                return None;
            }
        };

        let declared_datastores = parsed
            .dependencies
            .iter()
            .filter(|d| !d.dev)
            .filter_map(lexicon::lookup)
            .map(|entry| entry.kind)
            .collect();

        let descriptor = ServiceDescriptor {
            name: self.service_name(candidate, parsed.name.as_deref()),
            kind,
            port,
            declared_datastores,
            relative_root: candidate.relative_root.clone(),
            manifest_path: candidate.manifest_path.clone(),
            ecosystem,
            package_manager: package_manager(candidate, Some(&parsed)),
            framework,
            hints: runtime_hints(ecosystem, &parsed),
            dependencies: parsed.dependencies,
        };

        debug!(
            service = %descriptor.name,
            kind = %descriptor.kind,
            port = ?descriptor.port,
            framework = ?descriptor.framework,
            "Classified service"
        );

        Some(Classification {
            descriptor,
            error: None,
        })
    }

    fn service_name(&self, candidate: &ServiceCandidate, manifest_name: Option<&str>) -> String {
        let raw = if candidate.relative_root.as_os_str().is_empty() {
            manifest_name
                .map(String::from)
                .unwrap_or_else(|| self.root_name.clone())
        } else {
            candidate
                .relative_root
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("-")
        };
        sanitize_name(&raw)
    }
}

/// Lowercases and restricts to `[a-z0-9_-]`, collapsing runs of separators
///
/// The result starts with a letter or digit, as compose project names require.
pub fn sanitize_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' };
        if c == '-' && (name.is_empty() || name.ends_with('-')) {
            continue;
        }
        name.push(c);
    }
    let name = name
        .trim_start_matches(|c: char| c == '-' || c == '_')
        .trim_end_matches('-');
    if name.is_empty() {
        "app".to_string()
    } else {
        name.to_string()
    }
}

fn port_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:--port[= ]|-p\s+|PORT=)(\d{2,5})\b").expect("port regex is valid")
    })
}

fn script_port(parsed: &ParsedManifest) -> Option<u16> {
    PORT_SCRIPTS
        .iter()
        .filter_map(|name| parsed.scripts.get(*name))
        .find_map(|script| {
            port_regex()
                .captures(script)
                .and_then(|caps| caps[1].parse::<u16>().ok())
                .filter(|port| *port > 0)
        })
}

fn package_manager(candidate: &ServiceCandidate, parsed: Option<&ParsedManifest>) -> PackageManager {
    match candidate.kind {
        ManifestKind::PackageJson => {
            if candidate.has_lockfile("bun.lockb") || candidate.has_lockfile("bun.lock") {
                PackageManager::Bun
            } else if candidate.has_lockfile("pnpm-lock.yaml") {
                PackageManager::Pnpm
            } else if candidate.has_lockfile("yarn.lock") {
                PackageManager::Yarn
            } else {
                PackageManager::Npm
            }
        }
        ManifestKind::RequirementsTxt | ManifestKind::Pyproject => {
            if parsed.is_some_and(|p| p.uses_poetry) || candidate.has_lockfile("poetry.lock") {
                PackageManager::Poetry
            } else {
                PackageManager::Pip
            }
        }
        ManifestKind::GoMod => PackageManager::GoModules,
        ManifestKind::CargoToml => PackageManager::Cargo,
        ManifestKind::PomXml => PackageManager::Maven,
        ManifestKind::Gradle => PackageManager::Gradle,
        ManifestKind::Gemfile => PackageManager::Bundler,
        ManifestKind::ComposerJson => PackageManager::Composer,
    }
}

fn runtime_hints(ecosystem: Ecosystem, parsed: &ParsedManifest) -> RuntimeHints {
    let mut hints = RuntimeHints {
        has_build_script: parsed.has_script("build"),
        has_start_script: parsed.has_script("start"),
        ..Default::default()
    };
    match ecosystem {
        Ecosystem::Rust => hints.binary_name = parsed.entrypoint.clone(),
        Ecosystem::Go => hints.binary_name = parsed.name.clone(),
        Ecosystem::Python => {
            hints.entrypoint = parsed.scripts.keys().next().cloned();
        }
        _ => hints.entrypoint = parsed.entrypoint.clone(),
    }
    hints
}

/// Settles descriptors sharing a service root
///
/// A second descriptor of the same ecosystem in one directory is dropped; one
/// of a different ecosystem is renamed `<name>-<ecosystem>`. Returns the kept
/// descriptors and a message per adjustment.
pub fn resolve_siblings(descriptors: Vec<ServiceDescriptor>) -> (Vec<ServiceDescriptor>, Vec<String>) {
    let mut kept: Vec<ServiceDescriptor> = Vec::with_capacity(descriptors.len());
    let mut messages = Vec::new();

    for mut descriptor in descriptors {
        let siblings: Vec<&ServiceDescriptor> = kept
            .iter()
            .filter(|k| k.relative_root == descriptor.relative_root)
            .collect();
        if siblings.is_empty() {
            kept.push(descriptor);
            continue;
        }

        if let Some(existing) = siblings.iter().find(|k| k.ecosystem == descriptor.ecosystem) {
            messages.push(format!(
                "{} ignored, {} already describes service '{}'",
                descriptor.manifest_path.display(),
                existing.manifest_path.display(),
                existing.name
            ));
            continue;
        }

        let renamed = format!("{}-{}", descriptor.name, descriptor.ecosystem);
        messages.push(format!(
            "service '{}' from {} renamed to '{}'",
            descriptor.name,
            descriptor.manifest_path.display(),
            renamed
        ));
        descriptor.name = renamed;
        kept.push(descriptor);
    }

    (kept, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::types::ResourceKind;
    use std::path::PathBuf;

    fn candidate(rel: &str, kind: ManifestKind, content: &str, lockfiles: &[&str]) -> ServiceCandidate {
        let root = PathBuf::from("/repo").join(rel);
        ServiceCandidate {
            manifest_path: root.join(kind.as_str()),
            root_path: root,
            raw_manifest: content.to_string(),
            kind,
            relative_root: PathBuf::from(rel),
            lockfiles: lockfiles.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn classifier() -> ServiceClassifier {
        ServiceClassifier::new(Path::new("/repo"))
    }

    #[test]
    fn test_express_api_with_redis() {
        let c = candidate(
            "services/api",
            ManifestKind::PackageJson,
            r#"{"name":"api","scripts":{"start":"node index.js"},"dependencies":{"express":"4","ioredis":"5"}}"#,
            &["yarn.lock"],
        );
        let d = classifier().classify(&c).unwrap().descriptor;
        assert_eq!(d.name, "services-api");
        assert_eq!(d.kind, ServiceKind::ApiBackend);
        assert_eq!(d.port, Some(3000));
        assert_eq!(d.framework.as_deref(), Some("express"));
        assert_eq!(d.package_manager, PackageManager::Yarn);
        assert!(d.declared_datastores.contains(&ResourceKind::Cache));
    }

    #[test]
    fn test_dev_pin_does_not_hide_runtime_dependencies() {
        let c = candidate(
            "api",
            ManifestKind::PackageJson,
            r#"{"scripts":{"start":"node index.js"},
                "dependencies":{"express":"^4.18.2","ioredis":"^5.3.2"},
                "devDependencies":{"express":"^4.17.0","ioredis":"^4.0.0"}}"#,
            &[],
        );
        let d = classifier().classify(&c).unwrap().descriptor;
        assert_eq!(d.kind, ServiceKind::ApiBackend);
        assert_eq!(d.framework.as_deref(), Some("express"));
        assert!(d.declared_datastores.contains(&ResourceKind::Cache));
    }

    #[test]
    fn test_script_port_overrides_default() {
        let c = candidate(
            "web",
            ManifestKind::PackageJson,
            r#"{"scripts":{"dev":"next dev -p 4100","build":"next build"},"dependencies":{"next":"14","react":"18"}}"#,
            &[],
        );
        let d = classifier().classify(&c).unwrap().descriptor;
        assert_eq!(d.kind, ServiceKind::WebFrontend);
        assert_eq!(d.port, Some(4100));
        assert!(d.hints.has_build_script);
        assert!(!d.hints.has_start_script);
    }

    #[test]
    fn test_workspace_root_is_not_a_service() {
        let c = candidate(
            "",
            ManifestKind::PackageJson,
            r#"{"name":"monorepo","private":true,"workspaces":["apps/*"],"devDependencies":{"turbo":"1"}}"#,
            &[],
        );
        assert!(classifier().classify(&c).is_none());
    }

    #[test]
    fn test_runtime_signal_without_framework_is_worker() {
        let c = candidate(
            "jobs",
            ManifestKind::PackageJson,
            r#"{"scripts":{"start":"node worker.js"},"dependencies":{"amqplib":"0.10"}}"#,
            &[],
        );
        let d = classifier().classify(&c).unwrap().descriptor;
        assert_eq!(d.kind, ServiceKind::Worker);
        assert_eq!(d.port, None);
        assert!(d.declared_datastores.contains(&ResourceKind::Queue));
    }

    #[test]
    fn test_malformed_manifest_is_unknown() {
        let c = candidate("broken", ManifestKind::PackageJson, "{ nope", &[]);
        let classification = classifier().classify(&c).unwrap();
        assert_eq!(classification.descriptor.kind, ServiceKind::Unknown);
        assert_eq!(classification.descriptor.name, "broken");
        assert!(classification.error.is_some());
    }

    #[test]
    fn test_root_manifest_uses_manifest_name() {
        let c = candidate(
            "",
            ManifestKind::CargoToml,
            "[package]\nname = \"Edge_Proxy\"\n\n[dependencies]\naxum = \"0.7\"\n",
            &["Cargo.lock"],
        );
        let d = classifier().classify(&c).unwrap().descriptor;
        assert_eq!(d.name, "edge_proxy");
        assert_eq!(d.hints.binary_name.as_deref(), Some("Edge_Proxy"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("@acme/Web App"), "acme-web-app");
        assert_eq!(sanitize_name("--"), "app");
        assert_eq!(sanitize_name("api_v2"), "api_v2");
    }

    #[test]
    fn test_sanitize_name_starts_alphanumeric() {
        assert_eq!(sanitize_name("_internal"), "internal");
        assert_eq!(sanitize_name("__-Shop"), "shop");
        assert_eq!(sanitize_name(".tmpAb_1"), "tmpab_1");
        assert_eq!(sanitize_name("___"), "app");
    }

    #[test]
    fn test_poetry_detection() {
        let c = candidate(
            "worker",
            ManifestKind::Pyproject,
            "[tool.poetry]\nname = \"worker\"\n\n[tool.poetry.dependencies]\ncelery = \"5\"\n",
            &[],
        );
        let d = classifier().classify(&c).unwrap().descriptor;
        assert_eq!(d.package_manager, PackageManager::Poetry);
        assert_eq!(d.kind, ServiceKind::Worker);
    }

    #[test]
    fn test_resolve_siblings() {
        let classifier = classifier();
        let py = candidate("api", ManifestKind::Pyproject, "[project]\nname=\"api\"\ndependencies=[\"flask\"]\n", &[]);
        let req = candidate("api", ManifestKind::RequirementsTxt, "flask\n", &[]);
        let node = candidate(
            "api",
            ManifestKind::PackageJson,
            r#"{"dependencies":{"vite":"5"}}"#,
            &[],
        );
        let descriptors: Vec<_> = [node, py, req]
            .iter()
            .filter_map(|c| classifier.classify(c))
            .map(|c| c.descriptor)
            .collect();
        assert_eq!(descriptors.len(), 3);

        let (kept, messages) = resolve_siblings(descriptors);
        let names: Vec<_> = kept.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["api", "api-python"]);
        assert_eq!(messages.len(), 2);
    }
}
