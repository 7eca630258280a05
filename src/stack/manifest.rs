//! Manifest recognition and parsing
//!
//! Each supported ecosystem contributes one or more manifest file names. Parsing
//! extracts the dependency list plus the few script and entrypoint details the
//! classifier and fallback templates need. Parsers are strict about structure
//! (invalid JSON/TOML/XML is an error) and lenient about missing sections.

use super::types::{Dependency, Ecosystem};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Recognized project manifest files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestKind {
    PackageJson,
    RequirementsTxt,
    Pyproject,
    GoMod,
    CargoToml,
    PomXml,
    Gradle,
    Gemfile,
    ComposerJson,
}

impl ManifestKind {
    pub fn from_filename(name: &str) -> Option<Self> {
        match name {
            "package.json" => Some(ManifestKind::PackageJson),
            "requirements.txt" => Some(ManifestKind::RequirementsTxt),
            "pyproject.toml" => Some(ManifestKind::Pyproject),
            "go.mod" => Some(ManifestKind::GoMod),
            "Cargo.toml" => Some(ManifestKind::CargoToml),
            "pom.xml" => Some(ManifestKind::PomXml),
            "build.gradle" | "build.gradle.kts" => Some(ManifestKind::Gradle),
            "Gemfile" => Some(ManifestKind::Gemfile),
            "composer.json" => Some(ManifestKind::ComposerJson),
            _ => None,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            ManifestKind::PackageJson => Ecosystem::Node,
            ManifestKind::RequirementsTxt | ManifestKind::Pyproject => Ecosystem::Python,
            ManifestKind::GoMod => Ecosystem::Go,
            ManifestKind::CargoToml => Ecosystem::Rust,
            ManifestKind::PomXml | ManifestKind::Gradle => Ecosystem::Java,
            ManifestKind::Gemfile => Ecosystem::Ruby,
            ManifestKind::ComposerJson => Ecosystem::Php,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::RequirementsTxt => "requirements.txt",
            ManifestKind::Pyproject => "pyproject.toml",
            ManifestKind::GoMod => "go.mod",
            ManifestKind::CargoToml => "Cargo.toml",
            ManifestKind::PomXml => "pom.xml",
            ManifestKind::Gradle => "build.gradle",
            ManifestKind::Gemfile => "Gemfile",
            ManifestKind::ComposerJson => "composer.json",
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lockfiles looked up next to a manifest to infer the dependency manager
pub const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "bun.lock",
    "poetry.lock",
    "Cargo.lock",
    "go.sum",
    "Gemfile.lock",
    "composer.lock",
];

/// Error raised when a manifest cannot be parsed; never fatal to a run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Malformed {kind}: {message}")]
pub struct ClassificationError {
    pub kind: ManifestKind,
    pub message: String,
}

impl ClassificationError {
    fn new(kind: ManifestKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// Structured view of a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedManifest {
    pub name: Option<String>,
    /// Sorted by name, one entry per name
    pub dependencies: Vec<Dependency>,
    pub scripts: BTreeMap<String, String>,
    pub entrypoint: Option<String>,
    /// The manifest itself says it runs something (start script, binary target, ...)
    pub runtime_signal: bool,
    pub uses_poetry: bool,
}

impl ParsedManifest {
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    fn push(&mut self, dep: Dependency) {
        self.dependencies.push(dep);
    }

    fn finish(mut self) -> Self {
        // Runtime before dev within a name, whatever the versions; dedup keeps the first
        self.dependencies
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.dev.cmp(&b.dev)));
        self.dependencies.dedup_by(|b, a| a.name == b.name);
        self
    }
}

pub fn parse_manifest(kind: ManifestKind, content: &str) -> Result<ParsedManifest, ClassificationError> {
    let parsed = match kind {
        ManifestKind::PackageJson => parse_package_json(content),
        ManifestKind::RequirementsTxt => Ok(parse_requirements(content)),
        ManifestKind::Pyproject => parse_pyproject(content),
        ManifestKind::GoMod => Ok(parse_go_mod(content)),
        ManifestKind::CargoToml => parse_cargo_toml(content),
        ManifestKind::PomXml => parse_pom_xml(content),
        ManifestKind::Gradle => Ok(parse_gradle(content)),
        ManifestKind::Gemfile => Ok(parse_gemfile(content)),
        ManifestKind::ComposerJson => parse_composer_json(content),
    }
    .map_err(|message| ClassificationError::new(kind, message))?;

    Ok(parsed.finish())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    main: Option<String>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
}

fn parse_package_json(content: &str) -> Result<ParsedManifest, String> {
    let pkg: PackageJson = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let mut parsed = ParsedManifest {
        name: pkg.name,
        entrypoint: pkg.main,
        runtime_signal: pkg.scripts.contains_key("start"),
        scripts: pkg.scripts,
        ..Default::default()
    };
    for (name, version) in pkg.dependencies {
        parsed.push(Dependency::new(name, Some(version)));
    }
    for (name, version) in pkg.dev_dependencies {
        parsed.push(Dependency::dev(name, Some(version)));
    }
    Ok(parsed)
}

#[derive(Deserialize)]
struct ComposerJson {
    name: Option<String>,
    #[serde(default)]
    require: BTreeMap<String, String>,
    #[serde(default, rename = "require-dev")]
    require_dev: BTreeMap<String, String>,
}

fn is_php_platform_package(name: &str) -> bool {
    name == "php" || name.starts_with("ext-")
}

fn parse_composer_json(content: &str) -> Result<ParsedManifest, String> {
    let composer: ComposerJson = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let mut parsed = ParsedManifest {
        name: composer.name,
        ..Default::default()
    };
    for (name, version) in composer.require {
        if !is_php_platform_package(&name) {
            parsed.push(Dependency::new(name, Some(version)));
        }
    }
    for (name, version) in composer.require_dev {
        if !is_php_platform_package(&name) {
            parsed.push(Dependency::dev(name, Some(version)));
        }
    }
    Ok(parsed)
}

/// Splits a PEP 508 requirement into a normalized name and an optional pinned version
fn parse_requirement(spec: &str) -> Option<Dependency> {
    let spec = spec.split(';').next()?.trim();
    let name: String = spec
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        return None;
    }
    let version = spec
        .find("==")
        .map(|pos| spec[pos + 2..].trim().to_string())
        .filter(|v| !v.is_empty());
    Some(Dependency::new(normalize_python_name(&name), version))
}

/// PEP 503 style: lowercase, `_` and `-` equivalent
fn normalize_python_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

fn parse_requirements(content: &str) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();
    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        if let Some(dep) = parse_requirement(line) {
            parsed.push(dep);
        }
    }
    parsed.runtime_signal = !parsed.dependencies.is_empty();
    parsed
}

fn toml_version(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Table(t) => t.get("version").and_then(|v| v.as_str()).map(String::from),
        _ => None,
    }
}

fn parse_pyproject(content: &str) -> Result<ParsedManifest, String> {
    let doc: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut parsed = ParsedManifest::default();

    if let Some(project) = doc.get("project") {
        parsed.name = project.get("name").and_then(|v| v.as_str()).map(String::from);
        if let Some(deps) = project.get("dependencies").and_then(|v| v.as_array()) {
            for dep in deps.iter().filter_map(|d| d.as_str()) {
                if let Some(dep) = parse_requirement(dep) {
                    parsed.push(dep);
                }
            }
        }
        if let Some(scripts) = project.get("scripts").and_then(|v| v.as_table()) {
            for (name, target) in scripts {
                if let Some(target) = target.as_str() {
                    parsed.scripts.insert(name.clone(), target.to_string());
                }
            }
        }
    }

    if let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")) {
        parsed.uses_poetry = true;
        if parsed.name.is_none() {
            parsed.name = poetry.get("name").and_then(|v| v.as_str()).map(String::from);
        }
        if let Some(deps) = poetry.get("dependencies").and_then(|v| v.as_table()) {
            for (name, spec) in deps.iter().filter(|(name, _)| name.as_str() != "python") {
                parsed.push(Dependency::new(normalize_python_name(name), toml_version(spec)));
            }
        }
        let dev_tables = [
            poetry.get("dev-dependencies"),
            poetry
                .get("group")
                .and_then(|g| g.get("dev"))
                .and_then(|d| d.get("dependencies")),
        ];
        for table in dev_tables.into_iter().flatten().filter_map(|t| t.as_table()) {
            for (name, spec) in table {
                parsed.push(Dependency::dev(normalize_python_name(name), toml_version(spec)));
            }
        }
        if let Some(scripts) = poetry.get("scripts").and_then(|v| v.as_table()) {
            for (name, target) in scripts {
                if let Some(target) = target.as_str() {
                    parsed.scripts.insert(name.clone(), target.to_string());
                }
            }
        }
    }

    parsed.runtime_signal = !parsed.scripts.is_empty();
    Ok(parsed)
}

fn parse_go_mod(content: &str) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();
    let mut in_require = false;

    for line in content.lines() {
        let line = line.trim();
        if let Some(module) = line.strip_prefix("module ") {
            parsed.name = module.trim().rsplit('/').next().map(String::from);
            continue;
        }
        if line.starts_with("require (") || line == "require(" {
            in_require = true;
            continue;
        }
        if in_require && line == ")" {
            in_require = false;
            continue;
        }
        let spec = if in_require {
            Some(line)
        } else {
            line.strip_prefix("require ")
        };
        if let Some(spec) = spec {
            let indirect = spec.contains("// indirect");
            let mut parts = spec.split_whitespace();
            if let (Some(path), version) = (parts.next(), parts.next()) {
                if path.starts_with("//") {
                    continue;
                }
                let version = version.map(String::from);
                parsed.push(if indirect {
                    Dependency::dev(path, version)
                } else {
                    Dependency::new(path, version)
                });
            }
        }
    }

    // Every module can be built into a binary; library-only modules are not distinguishable here
    parsed.runtime_signal = true;
    parsed
}

fn parse_cargo_toml(content: &str) -> Result<ParsedManifest, String> {
    let doc: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut parsed = ParsedManifest::default();

    let package = doc.get("package");
    parsed.name = package
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .map(String::from);

    for (section, dev) in [("dependencies", false), ("dev-dependencies", true)] {
        if let Some(table) = doc.get(section).and_then(|v| v.as_table()) {
            for (name, spec) in table {
                parsed.push(Dependency {
                    name: name.clone(),
                    version: toml_version(spec),
                    dev,
                });
            }
        }
    }

    let bin_name = doc
        .get("bin")
        .and_then(|b| b.as_array())
        .and_then(|bins| bins.first())
        .and_then(|b| b.get("name"))
        .and_then(|n| n.as_str())
        .map(String::from);
    let has_lib = doc.get("lib").is_some();

    parsed.entrypoint = bin_name.or_else(|| parsed.name.clone());
    parsed.runtime_signal = package.is_some() && (doc.get("bin").is_some() || !has_lib);
    Ok(parsed)
}

fn child_text<'a>(node: roxmltree::Node<'a, 'a>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
        .map(str::trim)
}

fn parse_pom_xml(content: &str) -> Result<ParsedManifest, String> {
    let doc = roxmltree::Document::parse(content).map_err(|e| e.to_string())?;
    let project = doc.root_element();
    if !project.has_tag_name("project") {
        return Err("root element is not <project>".to_string());
    }

    let mut parsed = ParsedManifest {
        name: child_text(project, "artifactId").map(String::from),
        ..Default::default()
    };

    if let Some(deps) = project.children().find(|c| c.has_tag_name("dependencies")) {
        for dep in deps.children().filter(|c| c.has_tag_name("dependency")) {
            let group = child_text(dep, "groupId").unwrap_or_default();
            let Some(artifact) = child_text(dep, "artifactId") else {
                continue;
            };
            let version = child_text(dep, "version").map(String::from);
            let dev = child_text(dep, "scope") == Some("test");
            parsed.push(Dependency {
                name: format!("{}:{}", group, artifact),
                version,
                dev,
            });
        }
    }

    let packaging = child_text(project, "packaging").unwrap_or("jar");
    parsed.runtime_signal = packaging != "pom";
    Ok(parsed)
}

fn gradle_dependency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^\s*(implementation|api|compileOnly|runtimeOnly|testImplementation|testRuntimeOnly)\s*\(?\s*["']([^:"']+):([^:"']+)(?::([^"']+))?["']"#,
        )
        .expect("gradle dependency regex is valid")
    })
}

fn parse_gradle(content: &str) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();
    for caps in gradle_dependency_regex().captures_iter(content) {
        let configuration = &caps[1];
        let name = format!("{}:{}", &caps[2], &caps[3]);
        let version = caps.get(4).map(|m| m.as_str().to_string());
        parsed.push(Dependency {
            name,
            version,
            dev: configuration.starts_with("test"),
        });
    }
    parsed.runtime_signal =
        content.contains("application") || content.contains("org.springframework.boot");
    parsed
}

fn gem_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*gem\s+["']([^"']+)["'](?:\s*,\s*["']([^"']+)["'])?"#)
            .expect("gem regex is valid")
    })
}

fn parse_gemfile(content: &str) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();
    let mut in_dev_group = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("group ") {
            in_dev_group = trimmed.contains(":test") || trimmed.contains(":development");
            continue;
        }
        if trimmed == "end" {
            in_dev_group = false;
            continue;
        }
        if let Some(caps) = gem_regex().captures(line) {
            parsed.push(Dependency {
                name: caps[1].to_string(),
                version: caps.get(2).map(|m| m.as_str().to_string()),
                dev: in_dev_group,
            });
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(parsed: &ParsedManifest) -> Vec<&str> {
        parsed.dependencies.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_manifest_kind_from_filename() {
        assert_eq!(ManifestKind::from_filename("package.json"), Some(ManifestKind::PackageJson));
        assert_eq!(ManifestKind::from_filename("build.gradle.kts"), Some(ManifestKind::Gradle));
        assert_eq!(ManifestKind::from_filename("README.md"), None);
        assert_eq!(ManifestKind::GoMod.ecosystem(), Ecosystem::Go);
    }

    #[test]
    fn test_package_json() {
        let content = r#"{
            "name": "api",
            "main": "server.js",
            "scripts": {"start": "node server.js"},
            "dependencies": {"express": "^4.18.2", "ioredis": "^5.3.0"},
            "devDependencies": {"jest": "^29.0.0"}
        }"#;
        let parsed = parse_manifest(ManifestKind::PackageJson, content).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("api"));
        assert_eq!(parsed.entrypoint.as_deref(), Some("server.js"));
        assert_eq!(names(&parsed), vec!["express", "ioredis", "jest"]);
        assert!(parsed.dependencies[2].dev);
        assert!(parsed.runtime_signal);
    }

    #[test]
    fn test_package_json_malformed() {
        let err = parse_manifest(ManifestKind::PackageJson, "{ not json").unwrap_err();
        assert_eq!(err.kind, ManifestKind::PackageJson);
        assert!(err.to_string().contains("Malformed package.json"));
    }

    #[test]
    fn test_dependency_in_both_sections_keeps_runtime_entry() {
        let content = r#"{"dependencies": {"redis": "4"}, "devDependencies": {"redis": "4"}}"#;
        let parsed = parse_manifest(ManifestKind::PackageJson, content).unwrap();
        assert_eq!(parsed.dependencies.len(), 1);
        assert!(!parsed.dependencies[0].dev);
    }

    #[test]
    fn test_runtime_entry_wins_over_older_dev_pin() {
        let content = r#"{
  "dependencies": {"express": "^4.18.2", "ioredis": "^5.3.2"},
  "devDependencies": {"express": "^4.17.0", "ioredis": "^4.0.0"}
}"#;
        let parsed = parse_manifest(ManifestKind::PackageJson, content).unwrap();
        assert_eq!(names(&parsed), vec!["express", "ioredis"]);
        assert!(parsed.dependencies.iter().all(|d| !d.dev));
        assert_eq!(parsed.dependencies[0].version.as_deref(), Some("^4.18.2"));
        assert_eq!(parsed.dependencies[1].version.as_deref(), Some("^5.3.2"));
    }

    #[test]
    fn test_requirements_txt() {
        let content = "# web\nFlask==3.0.0\nredis>=5\n-r base.txt\npsycopg2_binary ; python_version > '3'\n";
        let parsed = parse_manifest(ManifestKind::RequirementsTxt, content).unwrap();
        assert_eq!(names(&parsed), vec!["flask", "psycopg2-binary", "redis"]);
        assert_eq!(parsed.dependencies[0].version.as_deref(), Some("3.0.0"));
        assert!(parsed.runtime_signal);
    }

    #[test]
    fn test_pyproject_poetry() {
        let content = r#"
[tool.poetry]
name = "worker"

[tool.poetry.dependencies]
python = "^3.11"
celery = "^5.3"
redis = { version = "^5.0" }

[tool.poetry.group.dev.dependencies]
pytest = "^8"
"#;
        let parsed = parse_manifest(ManifestKind::Pyproject, content).unwrap();
        assert!(parsed.uses_poetry);
        assert_eq!(parsed.name.as_deref(), Some("worker"));
        assert_eq!(names(&parsed), vec!["celery", "pytest", "redis"]);
        assert_eq!(parsed.dependencies[2].version.as_deref(), Some("^5.0"));
    }

    #[test]
    fn test_poetry_names_are_normalized() {
        let content = r#"
[tool.poetry]
name = "reports"

[tool.poetry.dependencies]
Psycopg2_Binary = "^2.9"

[tool.poetry.dev-dependencies]
pytest_asyncio = "^0.23"
"#;
        let parsed = parse_manifest(ManifestKind::Pyproject, content).unwrap();
        assert_eq!(names(&parsed), vec!["psycopg2-binary", "pytest-asyncio"]);
    }

    #[test]
    fn test_go_mod() {
        let content = "module github.com/acme/gateway\n\ngo 1.22\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\tgolang.org/x/net v0.20.0 // indirect\n)\n\nrequire github.com/redis/go-redis/v9 v9.4.0\n";
        let parsed = parse_manifest(ManifestKind::GoMod, content).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("gateway"));
        assert_eq!(
            names(&parsed),
            vec!["github.com/gin-gonic/gin", "github.com/redis/go-redis/v9", "golang.org/x/net"]
        );
        assert!(parsed.dependencies[2].dev);
    }

    #[test]
    fn test_cargo_toml() {
        let content = "[package]\nname = \"edge\"\n\n[dependencies]\naxum = \"0.7\"\ntokio = { version = \"1\", features = [\"full\"] }\n";
        let parsed = parse_manifest(ManifestKind::CargoToml, content).unwrap();
        assert_eq!(names(&parsed), vec!["axum", "tokio"]);
        assert_eq!(parsed.entrypoint.as_deref(), Some("edge"));
        assert!(parsed.runtime_signal);

        let workspace = parse_manifest(ManifestKind::CargoToml, "[workspace]\nmembers = [\"a\"]\n").unwrap();
        assert!(!workspace.runtime_signal);
    }

    #[test]
    fn test_pom_xml() {
        let content = r#"<project>
  <artifactId>orders</artifactId>
  <dependencies>
    <dependency><groupId>org.springframework.boot</groupId><artifactId>spring-boot-starter-web</artifactId></dependency>
    <dependency><groupId>org.postgresql</groupId><artifactId>postgresql</artifactId><version>42.7.1</version></dependency>
    <dependency><groupId>junit</groupId><artifactId>junit</artifactId><scope>test</scope></dependency>
  </dependencies>
</project>"#;
        let parsed = parse_manifest(ManifestKind::PomXml, content).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("orders"));
        assert_eq!(
            names(&parsed),
            vec![
                "junit:junit",
                "org.postgresql:postgresql",
                "org.springframework.boot:spring-boot-starter-web"
            ]
        );
        assert!(parsed.dependencies[0].dev);
        assert!(parsed.runtime_signal);
    }

    #[test]
    fn test_gradle() {
        let content = "plugins { id 'org.springframework.boot' version '3.2.0' }\ndependencies {\n    implementation 'org.springframework.boot:spring-boot-starter-web'\n    implementation(\"org.apache.kafka:kafka-clients:3.6.0\")\n    testImplementation 'org.junit.jupiter:junit-jupiter:5.10.0'\n}\n";
        let parsed = parse_manifest(ManifestKind::Gradle, content).unwrap();
        assert_eq!(parsed.dependencies.len(), 3);
        assert!(parsed.runtime_signal);
        let kafka = parsed
            .dependencies
            .iter()
            .find(|d| d.name == "org.apache.kafka:kafka-clients")
            .unwrap();
        assert_eq!(kafka.version.as_deref(), Some("3.6.0"));
    }

    #[test]
    fn test_gemfile() {
        let content = "source 'https://rubygems.org'\ngem 'rails', '~> 7.1'\ngem \"pg\"\ngroup :development, :test do\n  gem 'rspec-rails'\nend\ngem 'sidekiq'\n";
        let parsed = parse_manifest(ManifestKind::Gemfile, content).unwrap();
        assert_eq!(names(&parsed), vec!["pg", "rails", "rspec-rails", "sidekiq"]);
        assert!(parsed.dependencies[2].dev);
        assert!(!parsed.dependencies[3].dev);
    }

    #[test]
    fn test_composer_json_skips_platform_packages() {
        let content = r#"{"require": {"php": "^8.2", "ext-json": "*", "laravel/framework": "^11.0"}}"#;
        let parsed = parse_manifest(ManifestKind::ComposerJson, content).unwrap();
        assert_eq!(names(&parsed), vec!["laravel/framework"]);
    }
}
