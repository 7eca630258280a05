//! Output formatting and artifact writing for the CLI

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MonodockConfig;
use crate::output::{ArtifactSource, GenerationResult, CI_FILE_PATH, COMPOSE_FILE_NAME};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Summary plus every artifact, for terminals
    Human,
    Json,
    Yaml,
    /// Single markdown bundle of every artifact
    Markdown,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, result: &GenerationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("Failed to serialize generation result to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize generation result to YAML")
            }
            OutputFormat::Markdown => Ok(result.to_markdown_bundle()),
            OutputFormat::Human => Ok(self.format_human(result)),
        }
    }

    pub fn format_config(&self, config: &MonodockConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human | OutputFormat::Markdown => Ok(config.to_string()),
        }
    }

    fn format_human(&self, result: &GenerationResult) -> String {
        let mut output = String::new();

        if result.warnings.is_empty() {
            output.push_str(&format!("\u{2713} Container artifacts for {}\n", result.project_name));
        } else {
            output.push_str(&format!(
                "\u{26A0} Container artifacts for {} ({} warning(s))\n",
                result.project_name,
                result.warnings.len()
            ));
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str("Services:\n");
        let count = result.services.len();
        for (i, (name, artifact)) in result.services.iter().enumerate() {
            let connector = if i + 1 == count { "\u{2514}" } else { "\u{251C}" };
            let source = match artifact.source {
                ArtifactSource::Ai => "AI",
                ArtifactSource::Fallback => "template",
            };
            output.push_str(&format!(
                "{}\u{2500} {:<20} {} ({})\n",
                connector, name, artifact.dockerfile_path, source
            ));
        }
        if count == 0 {
            output.push_str("\u{2514}\u{2500} (no services detected)\n");
        }

        for artifact in result.services.values() {
            output.push_str(&format!("\n--- {} ---\n", artifact.dockerfile_path));
            output.push_str(artifact.dockerfile_content.trim_end());
            output.push('\n');
        }

        output.push_str(&format!("\n--- {} ---\n", COMPOSE_FILE_NAME));
        output.push_str(result.compose_content.trim_end());
        output.push('\n');

        if let Some(ci) = &result.ci_content {
            output.push_str(&format!("\n--- {} ---\n", CI_FILE_PATH));
            output.push_str(ci.trim_end());
            output.push('\n');
        }

        if !result.commands.is_empty() {
            output.push_str("\nCommands:\n");
            for command in &result.commands {
                output.push_str(&format!("  {}\n", command));
            }
        }

        if !result.notes.is_empty() {
            output.push_str("\nNotes:\n");
            for note in &result.notes {
                output.push_str(&format!("  - {}\n", note));
            }
        }

        if !result.warnings.is_empty() {
            output.push_str("\n\u{26A0} Warnings:\n");
            for warning in &result.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }
}

/// Writes every artifact under `dir`, mirroring repository-relative paths
pub fn write_artifacts(dir: &Path, result: &GenerationResult) -> Result<Vec<PathBuf>> {
    let mut files: Vec<(String, &str)> = result
        .services
        .values()
        .map(|a| (a.dockerfile_path.clone(), a.dockerfile_content.as_str()))
        .collect();
    files.push((COMPOSE_FILE_NAME.to_string(), result.compose_content.as_str()));
    if let Some(ci) = &result.ci_content {
        files.push((CI_FILE_PATH.to_string(), ci.as_str()));
    }

    let mut written = Vec::with_capacity(files.len());
    for (relative, content) in files {
        let path = relative
            .split('/')
            .fold(dir.to_path_buf(), |path, segment| path.join(segment));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
