//! Deterministic fallback Dockerfiles and the well-formedness check applied
//! to AI-written ones

use super::template::render;
use super::GenerationError;
use crate::stack::{Ecosystem, PackageManager, ServiceDescriptor};
use std::collections::BTreeMap;

const NODE_TEMPLATE: &str = r#"# {{ header }}
FROM {{ base_image }}
WORKDIR /app
{{ port_env }}
COPY {{ manifest_files }} ./
RUN {{ install }}
COPY . .
{{ build }}
{{ expose }}
CMD {{ cmd }}
"#;

const PYTHON_TEMPLATE: &str = r#"# {{ header }}
FROM python:3.12-slim
ENV PYTHONDONTWRITEBYTECODE=1 PYTHONUNBUFFERED=1
WORKDIR /app
{{ port_env }}
{{ install }}
COPY . .
{{ expose }}
CMD {{ cmd }}
"#;

const GO_TEMPLATE: &str = r#"# {{ header }}
FROM golang:1.22-alpine AS build
WORKDIR /src
COPY go.mod go.sum* ./
RUN go mod download
COPY . .
RUN CGO_ENABLED=0 go build -o /out/{{ binary }} .

FROM alpine:3.20
WORKDIR /app
COPY --from=build /out/{{ binary }} /app/{{ binary }}
{{ port_env }}
{{ expose }}
ENTRYPOINT ["/app/{{ binary }}"]
"#;

const RUST_TEMPLATE: &str = r#"# {{ header }}
FROM rust:1-slim AS build
WORKDIR /src
COPY . .
RUN cargo build --release --bin {{ binary }}

FROM debian:bookworm-slim
RUN apt-get update && apt-get install -y --no-install-recommends ca-certificates && rm -rf /var/lib/apt/lists/*
COPY --from=build /src/target/release/{{ binary }} /usr/local/bin/{{ binary }}
{{ port_env }}
{{ expose }}
CMD ["{{ binary }}"]
"#;

const MAVEN_TEMPLATE: &str = r#"# {{ header }}
FROM maven:3.9-eclipse-temurin-21 AS build
WORKDIR /src
COPY pom.xml ./
RUN mvn -q -B dependency:go-offline
COPY . .
RUN mvn -q -B package -DskipTests && cp target/*.jar /app.jar

FROM eclipse-temurin:21-jre
WORKDIR /app
COPY --from=build /app.jar /app/app.jar
{{ port_env }}
{{ expose }}
CMD ["java", "-jar", "/app/app.jar"]
"#;

const GRADLE_TEMPLATE: &str = r#"# {{ header }}
FROM gradle:8-jdk21 AS build
WORKDIR /src
COPY . .
RUN gradle --no-daemon build -x test && find build/libs -name '*.jar' ! -name '*-plain.jar' -exec cp {} /app.jar \;

FROM eclipse-temurin:21-jre
WORKDIR /app
COPY --from=build /app.jar /app/app.jar
{{ port_env }}
{{ expose }}
CMD ["java", "-jar", "/app/app.jar"]
"#;

const RUBY_TEMPLATE: &str = r#"# {{ header }}
FROM ruby:3.3-slim
RUN apt-get update && apt-get install -y --no-install-recommends build-essential libpq-dev && rm -rf /var/lib/apt/lists/*
WORKDIR /app
COPY Gemfile Gemfile.lock* ./
RUN bundle install
COPY . .
{{ port_env }}
{{ expose }}
CMD {{ cmd }}
"#;

const PHP_TEMPLATE: &str = r#"# {{ header }}
FROM composer:2 AS vendor
WORKDIR /app
COPY composer.json composer.lock* ./
RUN composer install --no-dev --no-scripts --prefer-dist --no-interaction

FROM php:8.3-cli
WORKDIR /app
COPY . .
COPY --from=vendor /app/vendor ./vendor
{{ port_env }}
{{ expose }}
CMD {{ cmd }}
"#;

fn exec_form(args: &[String]) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string())
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn manifest_file_name(service: &ServiceDescriptor) -> &str {
    service
        .manifest_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
}

fn node_vars(service: &ServiceDescriptor, port: &str, vars: &mut BTreeMap<&'static str, String>) {
    let (base_image, manifest_files, install, runner) = match service.package_manager {
        PackageManager::Yarn => (
            "node:20-alpine",
            "package.json yarn.lock",
            "corepack enable && yarn install --frozen-lockfile",
            "yarn",
        ),
        PackageManager::Pnpm => (
            "node:20-alpine",
            "package.json pnpm-lock.yaml",
            "corepack enable && pnpm install --frozen-lockfile",
            "pnpm",
        ),
        PackageManager::Bun => ("oven/bun:1", "package.json bun.lock*", "bun install", "bun"),
        _ => ("node:20-alpine", "package*.json", "npm install", "npm"),
    };

    let hints = &service.hints;
    let cmd = if hints.has_start_script {
        if runner == "bun" {
            args(&["bun", "run", "start"])
        } else {
            args(&[runner, "start"])
        }
    } else {
        match service.framework.as_deref() {
            Some("nextjs") => args(&["npx", "next", "start", "-p", port]),
            Some("vite") | Some("svelte") | Some("sveltekit") | Some("vue") | Some("react") => {
                args(&["npx", "vite", "preview", "--host", "0.0.0.0", "--port", port])
            }
            Some("angular") => args(&["npx", "ng", "serve", "--host", "0.0.0.0", "--port", port]),
            Some("nuxt") => args(&["npx", "nuxt", "start"]),
            Some("gatsby") => args(&["npx", "gatsby", "serve", "-H", "0.0.0.0", "-p", port]),
            Some("create-react-app") => args(&["npx", "serve", "-s", "build", "-l", port]),
            _ => {
                let entry = hints.entrypoint.as_deref().unwrap_or("index.js");
                args(&["node", entry])
            }
        }
    };

    let build = if hints.has_build_script {
        if runner == "npm" {
            "RUN npm run build".to_string()
        } else {
            format!("RUN {} run build", runner)
        }
    } else {
        String::new()
    };

    vars.insert("base_image", base_image.to_string());
    vars.insert("manifest_files", manifest_files.to_string());
    vars.insert("install", install.to_string());
    vars.insert("build", build);
    vars.insert("cmd", exec_form(&cmd));
}

fn python_vars(service: &ServiceDescriptor, port: &str, vars: &mut BTreeMap<&'static str, String>) {
    let install = match (service.package_manager, manifest_file_name(service)) {
        (PackageManager::Poetry, _) => "RUN pip install --no-cache-dir poetry && poetry config virtualenvs.create false\n\
COPY pyproject.toml poetry.lock* ./\n\
RUN poetry install --no-root --only main"
            .to_string(),
        (_, "requirements.txt") => {
            "COPY requirements.txt ./\nRUN pip install --no-cache-dir -r requirements.txt".to_string()
        }
        _ => "COPY pyproject.toml ./\nCOPY . .\nRUN pip install --no-cache-dir .".to_string(),
    };

    let bind = format!("0.0.0.0:{}", port);
    let cmd = match service.framework.as_deref() {
        Some("django") => args(&["python", "manage.py", "runserver", &bind]),
        Some("fastapi") => args(&["uvicorn", "main:app", "--host", "0.0.0.0", "--port", port]),
        Some("flask") => args(&["flask", "run", "--host", "0.0.0.0", "--port", port]),
        Some("celery") => args(&["celery", "-A", "tasks", "worker", "--loglevel=info"]),
        Some("rq") => args(&["rq", "worker"]),
        _ => match service.hints.entrypoint.as_deref() {
            Some(script) => args(&[script]),
            None => args(&["python", "main.py"]),
        },
    };

    vars.insert("install", install);
    vars.insert("cmd", exec_form(&cmd));
}

fn ruby_cmd(service: &ServiceDescriptor, port: &str) -> Vec<String> {
    match service.framework.as_deref() {
        Some("rails") => args(&["bundle", "exec", "rails", "server", "-b", "0.0.0.0", "-p", port]),
        Some("sinatra") => args(&["bundle", "exec", "ruby", "app.rb", "-o", "0.0.0.0", "-p", port]),
        Some("sidekiq") => args(&["bundle", "exec", "sidekiq"]),
        _ => args(&["bundle", "exec", "ruby", "main.rb"]),
    }
}

fn php_cmd(service: &ServiceDescriptor, port: &str) -> Vec<String> {
    let bind = format!("0.0.0.0:{}", port);
    match service.framework.as_deref() {
        Some("laravel") => args(&["php", "artisan", "serve", "--host=0.0.0.0", &format!("--port={}", port)]),
        Some("symfony") => args(&["php", "-S", &bind, "-t", "public"]),
        _ if service.port.is_some() => args(&["php", "-S", &bind, "-t", "."]),
        _ => args(&["php", "index.php"]),
    }
}

/// Renders the fallback Dockerfile for a service
pub fn fallback_dockerfile(service: &ServiceDescriptor) -> Result<String, GenerationError> {
    let port = service.port.map(|p| p.to_string()).unwrap_or_default();
    let mut vars: BTreeMap<&'static str, String> = BTreeMap::new();

    vars.insert(
        "header",
        format!(
            "{} ({}, {}) fallback template",
            service.name, service.ecosystem, service.kind
        ),
    );
    vars.insert(
        "expose",
        service.port.map(|p| format!("EXPOSE {}", p)).unwrap_or_default(),
    );
    vars.insert(
        "port_env",
        service.port.map(|p| format!("ENV PORT={}", p)).unwrap_or_default(),
    );
    let binary = service
        .hints
        .binary_name
        .clone()
        .unwrap_or_else(|| service.name.clone());
    vars.insert("binary", binary);

    let (template_name, template) = match (service.ecosystem, service.package_manager) {
        (Ecosystem::Node, _) => {
            node_vars(service, &port, &mut vars);
            ("node", NODE_TEMPLATE)
        }
        (Ecosystem::Python, _) => {
            python_vars(service, &port, &mut vars);
            ("python", PYTHON_TEMPLATE)
        }
        (Ecosystem::Go, _) => ("go", GO_TEMPLATE),
        (Ecosystem::Rust, _) => ("rust", RUST_TEMPLATE),
        (Ecosystem::Java, PackageManager::Gradle) => ("gradle", GRADLE_TEMPLATE),
        (Ecosystem::Java, _) => ("maven", MAVEN_TEMPLATE),
        (Ecosystem::Ruby, _) => {
            vars.insert("cmd", exec_form(&ruby_cmd(service, &port)));
            ("ruby", RUBY_TEMPLATE)
        }
        (Ecosystem::Php, _) => {
            vars.insert("cmd", exec_form(&php_cmd(service, &port)));
            ("php", PHP_TEMPLATE)
        }
    };

    render(template_name, template, &vars)
}

/// Non-empty, and the first instruction after comments and ARGs is FROM
pub fn is_well_formed(content: &str) -> bool {
    let mut lines = content.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let instruction = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match instruction.as_str() {
            "FROM" => return line.split_whitespace().nth(1).is_some(),
            "ARG" => {
                let mut current = line;
                while current.ends_with('\\') {
                    match lines.next() {
                        Some(next) => current = next,
                        None => return false,
                    }
                }
            }
            _ => return false,
        }
    }
    false
}
