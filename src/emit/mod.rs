//! Platform-specific command emission

use crate::output::{GenerationResult, COMPOSE_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unsupported target OS '{0}' (expected 'posix' or 'windows')")]
    UnsupportedTarget(String),
}

/// Shell dialect the commands are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    #[default]
    Posix,
    Windows,
}

impl FromStr for TargetOs {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "posix" | "linux" | "macos" | "darwin" | "unix" => Ok(TargetOs::Posix),
            "windows" | "win" | "win32" => Ok(TargetOs::Windows),
            _ => Err(CommandError::UnsupportedTarget(s.to_string())),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOs::Posix => f.write_str("posix"),
            TargetOs::Windows => f.write_str("windows"),
        }
    }
}

fn is_plain(arg: &str) -> bool {
    !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '\\' | ':' | '='))
}

impl TargetOs {
    /// Quotes one argument for this dialect, leaving plain words alone
    pub fn quote(&self, arg: &str) -> String {
        if is_plain(arg) {
            return arg.to_string();
        }
        match self {
            TargetOs::Posix => format!("'{}'", arg.replace('\'', r"'\''")),
            TargetOs::Windows => format!("\"{}\"", arg.replace('"', "\\\"")),
        }
    }

    /// Converts a forward-slash repository path to this dialect
    pub fn path(&self, path: &str) -> String {
        match self {
            TargetOs::Posix => path.to_string(),
            TargetOs::Windows => path.replace('/', "\\"),
        }
    }

    fn join(&self, args: &[&str]) -> String {
        args.iter().map(|a| self.quote(a)).collect::<Vec<_>>().join(" ")
    }
}

/// Build, start and stop commands for the generated artifacts, in run order
pub fn emit_commands(target: TargetOs, result: &GenerationResult) -> Vec<String> {
    let mut commands = Vec::with_capacity(result.services.len() + 2);

    for (name, artifact) in &result.services {
        let tag = format!("{}-{}", result.project_name, name);
        let dockerfile = target.path(&artifact.dockerfile_path);
        let context = target.path(&artifact.context);
        commands.push(target.join(&[
            "docker",
            "build",
            "-t",
            tag.as_str(),
            "-f",
            dockerfile.as_str(),
            context.as_str(),
        ]));
    }

    let compose_file = target.path(COMPOSE_FILE_NAME);
    for action in [&["up", "-d"][..], &["down"][..]] {
        let mut args = vec![
            "docker",
            "compose",
            "-p",
            result.project_name.as_str(),
            "-f",
            compose_file.as_str(),
        ];
        args.extend_from_slice(action);
        commands.push(target.join(&args));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ArtifactSource, ServiceArtifact};
    use std::collections::BTreeMap;
    use yare::parameterized;

    fn result(project: &str, services: &[(&str, &str)]) -> GenerationResult {
        let services: BTreeMap<String, ServiceArtifact> = services
            .iter()
            .map(|(name, context)| {
                let dockerfile_path = if *context == "." {
                    "Dockerfile".to_string()
                } else {
                    format!("{}/Dockerfile", context)
                };
                (
                    name.to_string(),
                    ServiceArtifact {
                        dockerfile_content: "FROM alpine\n".to_string(),
                        dockerfile_path,
                        context: context.to_string(),
                        source: ArtifactSource::Fallback,
                    },
                )
            })
            .collect();
        GenerationResult {
            project_name: project.to_string(),
            services,
            compose_content: String::new(),
            ci_content: None,
            commands: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_posix_commands() {
        let commands = emit_commands(
            TargetOs::Posix,
            &result("shop", &[("web", "apps/web"), ("api", "services/api")]),
        );
        assert_eq!(
            commands,
            vec![
                "docker build -t shop-api -f services/api/Dockerfile services/api",
                "docker build -t shop-web -f apps/web/Dockerfile apps/web",
                "docker compose -p shop -f docker-compose.yml up -d",
                "docker compose -p shop -f docker-compose.yml down",
            ]
        );
    }

    #[test]
    fn test_windows_commands() {
        let commands = emit_commands(TargetOs::Windows, &result("shop", &[("api", "services/api")]));
        assert_eq!(commands[0], r"docker build -t shop-api -f services\api\Dockerfile services\api");
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn test_root_service() {
        let commands = emit_commands(TargetOs::Posix, &result("app", &[("app", ".")]));
        assert_eq!(commands[0], "docker build -t app-app -f Dockerfile .");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(TargetOs::Posix.quote("my dir"), "'my dir'");
        assert_eq!(TargetOs::Posix.quote("it's"), r"'it'\''s'");
        assert_eq!(TargetOs::Windows.quote("my dir"), "\"my dir\"");
        assert_eq!(TargetOs::Posix.quote("plain/path"), "plain/path");

        let commands = emit_commands(TargetOs::Posix, &result("shop", &[("api", "my services/api")]));
        assert_eq!(
            commands[0],
            "docker build -t shop-api -f 'my services/api/Dockerfile' 'my services/api'"
        );
    }

    #[parameterized(
        posix = { "posix", TargetOs::Posix },
        linux = { "Linux", TargetOs::Posix },
        windows = { "windows", TargetOs::Windows },
        win = { "WIN", TargetOs::Windows },
    )]
    fn test_target_parsing(input: &str, expected: TargetOs) {
        assert_eq!(input.parse::<TargetOs>().unwrap(), expected);
    }

    #[test]
    fn test_unsupported_target() {
        let err = "amiga".parse::<TargetOs>().unwrap_err();
        assert_eq!(err, CommandError::UnsupportedTarget("amiga".to_string()));
        assert!(err.to_string().contains("amiga"));
    }
}
