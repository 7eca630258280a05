//! Minimal `{{ placeholder }}` substitution

use super::GenerationError;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("placeholder regex is valid"))
}

fn blank_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank line regex is valid"))
}

/// Substitutes every placeholder; an unknown placeholder is an error
///
/// Lines left empty by blank substitutions collapse so that at most one
/// blank line separates instructions.
pub fn render(
    template_name: &str,
    template: &str,
    vars: &BTreeMap<&str, String>,
) -> Result<String, GenerationError> {
    let mut missing = None;
    let rendered = placeholder_regex().replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        match vars.get(key) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| key.to_string());
                String::new()
            }
        }
    });

    if let Some(placeholder) = missing {
        return Err(GenerationError::UnresolvedPlaceholder {
            template: template_name.to_string(),
            placeholder,
        });
    }

    let collapsed = blank_run_regex().replace_all(&rendered, "\n\n");
    Ok(format!("{}\n", collapsed.trim()))
}
