//! Framework matcher table
//!
//! Matchers are evaluated in table order and the first one whose ecosystem
//! matches and whose pattern hits a runtime dependency wins. Frontend
//! frameworks come before web servers, web servers before workers.

use super::types::{Dependency, Ecosystem, ServiceKind};

/// Dependency pattern for framework detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPattern {
    /// Dependency name equals the pattern
    Exact(&'static str),
    /// Dependency name starts with the pattern (Go module paths, scoped npm packages)
    Prefix(&'static str),
}

impl DependencyPattern {
    pub fn matches(&self, dep: &Dependency) -> bool {
        match self {
            DependencyPattern::Exact(name) => dep.name == *name,
            DependencyPattern::Prefix(prefix) => dep.name.starts_with(prefix),
        }
    }
}

#[derive(Debug)]
pub struct ServiceMatcher {
    pub id: &'static str,
    pub ecosystem: Ecosystem,
    pub patterns: &'static [DependencyPattern],
    pub kind: ServiceKind,
    pub default_port: Option<u16>,
}

impl ServiceMatcher {
    pub fn matches(&self, ecosystem: Ecosystem, dependencies: &[Dependency]) -> bool {
        self.ecosystem == ecosystem
            && dependencies
                .iter()
                .filter(|d| !d.dev)
                .any(|d| self.patterns.iter().any(|p| p.matches(d)))
    }
}

use DependencyPattern::{Exact, Prefix};

macro_rules! matcher {
    ($id:literal, $eco:ident, $kind:ident, $port:expr, [$($pat:expr),+ $(,)?]) => {
        ServiceMatcher {
            id: $id,
            ecosystem: Ecosystem::$eco,
            patterns: &[$($pat),+],
            kind: ServiceKind::$kind,
            default_port: $port,
        }
    };
}

pub static MATCHERS: &[ServiceMatcher] = &[
    // Frontend frameworks
    matcher!("nextjs", Node, WebFrontend, Some(3000), [Exact("next")]),
    matcher!("nuxt", Node, WebFrontend, Some(3000), [Exact("nuxt")]),
    matcher!("sveltekit", Node, WebFrontend, Some(5173), [Exact("@sveltejs/kit")]),
    matcher!("angular", Node, WebFrontend, Some(4200), [Exact("@angular/core")]),
    matcher!("gatsby", Node, WebFrontend, Some(8000), [Exact("gatsby")]),
    matcher!("create-react-app", Node, WebFrontend, Some(3000), [Exact("react-scripts")]),
    matcher!("vite", Node, WebFrontend, Some(5173), [Exact("vite")]),
    matcher!("vue", Node, WebFrontend, Some(8080), [Exact("vue"), Exact("@vue/cli-service")]),
    matcher!("svelte", Node, WebFrontend, Some(5173), [Exact("svelte")]),
    matcher!("react", Node, WebFrontend, Some(3000), [Exact("react")]),
    // Web servers
    matcher!("nestjs", Node, ApiBackend, Some(3000), [Exact("@nestjs/core")]),
    matcher!("express", Node, ApiBackend, Some(3000), [Exact("express")]),
    matcher!("fastify", Node, ApiBackend, Some(3000), [Exact("fastify")]),
    matcher!("koa", Node, ApiBackend, Some(3000), [Exact("koa")]),
    matcher!("hapi", Node, ApiBackend, Some(3000), [Exact("@hapi/hapi")]),
    matcher!("django", Python, ApiBackend, Some(8000), [Exact("django")]),
    matcher!("fastapi", Python, ApiBackend, Some(8000), [Exact("fastapi")]),
    matcher!("flask", Python, ApiBackend, Some(5000), [Exact("flask")]),
    matcher!("gin", Go, ApiBackend, Some(8080), [Prefix("github.com/gin-gonic/gin")]),
    matcher!("echo", Go, ApiBackend, Some(8080), [Prefix("github.com/labstack/echo")]),
    matcher!("fiber", Go, ApiBackend, Some(3000), [Prefix("github.com/gofiber/fiber")]),
    matcher!("chi", Go, ApiBackend, Some(8080), [Prefix("github.com/go-chi/chi")]),
    matcher!("axum", Rust, ApiBackend, Some(3000), [Exact("axum")]),
    matcher!("actix-web", Rust, ApiBackend, Some(8080), [Exact("actix-web")]),
    matcher!("rocket", Rust, ApiBackend, Some(8000), [Exact("rocket")]),
    matcher!("warp", Rust, ApiBackend, Some(3030), [Exact("warp")]),
    matcher!(
        "spring-boot",
        Java,
        ApiBackend,
        Some(8080),
        [
            Exact("org.springframework.boot:spring-boot-starter-web"),
            Exact("org.springframework.boot:spring-boot-starter-webflux"),
        ]
    ),
    matcher!("quarkus", Java, ApiBackend, Some(8080), [Prefix("io.quarkus:quarkus-resteasy")]),
    matcher!("micronaut", Java, ApiBackend, Some(8080), [Exact("io.micronaut:micronaut-http-server-netty")]),
    matcher!("rails", Ruby, ApiBackend, Some(3000), [Exact("rails")]),
    matcher!("sinatra", Ruby, ApiBackend, Some(4567), [Exact("sinatra")]),
    matcher!("laravel", Php, ApiBackend, Some(8000), [Exact("laravel/framework")]),
    matcher!("symfony", Php, ApiBackend, Some(8000), [Exact("symfony/framework-bundle")]),
    // Workers
    matcher!("bullmq", Node, Worker, None, [Exact("bullmq"), Exact("bull")]),
    matcher!("celery", Python, Worker, None, [Exact("celery")]),
    matcher!("rq", Python, Worker, None, [Exact("rq")]),
    matcher!("sidekiq", Ruby, Worker, None, [Exact("sidekiq")]),
    matcher!("spring-boot-worker", Java, Worker, None, [Exact("org.springframework.boot:spring-boot-starter")]),
];

/// First matcher in table order that fires for these dependencies
pub fn find_matcher(ecosystem: Ecosystem, dependencies: &[Dependency]) -> Option<&'static ServiceMatcher> {
    MATCHERS.iter().find(|m| m.matches(ecosystem, dependencies))
}
