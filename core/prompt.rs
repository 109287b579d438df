//! Prompt template resolution and composition.
//!
//! Templates are system/user pairs with `{{placeholder}}` slots. The
//! resolved set merges three sources under namespaced keys, mirroring how
//! the config file layers them: embedded defaults (`static:`), files listed
//! under `[prompt].import` (`imported:`), and inline `[prompt.<name>]`
//! tables (`custom:`).

use crate::config::{DEFAULT_CONFIG_DIR, PromptConfig};
use crate::error::{AppError, Result};
use crate::output_formats::get_builtin_templates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

/// A fully substituted system/user prompt pair, ready to send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedPrompt {
    /// Stable identifier derived from the composed system prompt.
    pub id: String,
    /// Namespaced key of the template this was composed from.
    pub template: String,
    pub system: String,
    pub user: String,
    pub generated_at: DateTime<Utc>,
    /// Placeholder names that had no value and were left verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

pub fn resolve_templates(
    prompt_config: &PromptConfig,
    project_root: &Path,
) -> Result<HashMap<String, PromptTemplate>> {
    let mut resolved: HashMap<String, PromptTemplate> = get_builtin_templates()
        .iter()
        .map(|(name, template)| (format!("static:{}", name), template.clone()))
        .collect();

    if !prompt_config.import.is_empty() {
        log::debug!("Loading imported templates from: {:?}", prompt_config.import);
    }
    for import_path_rel in &prompt_config.import {
        let mut import_path = project_root.join(import_path_rel);
        if !import_path.exists() {
            import_path = project_root.join(DEFAULT_CONFIG_DIR).join(import_path_rel);
            if !import_path.exists() {
                log::warn!(
                    "Could not find imported template file '{}' relative to project root or config dir. Skipping.",
                    import_path_rel.display()
                );
                continue;
            }
        }

        let stem = import_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("imported_template");
        let key = format!("imported:{}", stem);
        match fs::read_to_string(&import_path) {
            Ok(content) => match serde_yml::from_str::<PromptTemplate>(&content) {
                Ok(template) => {
                    resolved.insert(key, template);
                    log::trace!("Loaded imported template: {}", import_path.display());
                }
                Err(e) => {
                    log::warn!(
                        "Imported template file '{}' is not a valid system/user document: {}",
                        import_path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                log::warn!(
                    "Failed to read imported template file '{}': {}",
                    import_path.display(),
                    e
                );
            }
        }
    }

    if !prompt_config.custom.is_empty() {
        log::debug!(
            "Loading custom templates defined in config: {:?}",
            prompt_config.custom.keys()
        );
    }
    for (name, template) in &prompt_config.custom {
        resolved.insert(format!("custom:{}", name), template.clone());
    }

    log::info!("Resolved {} prompt templates.", resolved.len());
    Ok(resolved)
}

/// Looks up `name` either as a full namespaced key or, for bare names, in
/// `custom:` → `imported:` → `static:` precedence order.
pub fn lookup_template<'a>(
    templates: &'a HashMap<String, PromptTemplate>,
    name: &str,
) -> Result<(&'a str, &'a PromptTemplate)> {
    if let Some((key, template)) = templates.get_key_value(name) {
        return Ok((key.as_str(), template));
    }
    for namespace in ["custom", "imported", "static"] {
        let key = format!("{}:{}", namespace, name);
        if let Some((key, template)) = templates.get_key_value(&key) {
            return Ok((key.as_str(), template));
        }
    }
    Err(AppError::Prompt(format!(
        "No prompt template named '{}'. Known templates: {}",
        name,
        sorted_keys(templates).join(", ")
    )))
}

fn sorted_keys(templates: &HashMap<String, PromptTemplate>) -> Vec<String> {
    let mut keys: Vec<String> = templates.keys().cloned().collect();
    keys.sort_unstable();
    keys
}

/// Replaces every `{{key}}` occurrence with its value. Unknown placeholders
/// are left verbatim and reported in the returned list (deduplicated, in
/// first-seen order).
pub fn substitute_placeholders(
    template: &str,
    values: &HashMap<String, String>,
) -> (String, Vec<String>) {
    let mut out = String::with_capacity(template.len());
    let mut unresolved: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        if !unresolved.iter().any(|k| k == key) {
                            unresolved.push(key.to_string());
                        }
                        out.push_str(&rest[start..start + 2 + end + 2]);
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                // unterminated opener, keep the remainder untouched
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    (out, unresolved)
}

pub fn compose_prompt(
    name: &str,
    templates: &HashMap<String, PromptTemplate>,
    values: &HashMap<String, String>,
) -> Result<ComposedPrompt> {
    let (key, template) = lookup_template(templates, name)?;
    let (system, mut unresolved) = substitute_placeholders(&template.system, values);
    let (user, user_unresolved) = substitute_placeholders(&template.user, values);
    for placeholder in user_unresolved {
        if !unresolved.iter().any(|k| k == &placeholder) {
            unresolved.push(placeholder);
        }
    }
    if !unresolved.is_empty() {
        log::warn!(
            "Template '{}' left placeholders unresolved: {}",
            key,
            unresolved.join(", ")
        );
    }
    Ok(ComposedPrompt {
        id: generate_prompt_id(&system),
        template: key.to_string(),
        system,
        user,
        generated_at: Utc::now(),
        unresolved,
    })
}

/// Stable id for a composed system prompt: djb2 over the bytes, rendered as
/// a `pp-` prefixed hex string. Identical prompts always share an id.
pub fn generate_prompt_id(system: &str) -> String {
    format!("pp-{:08x}", djb2(system))
}

fn djb2(text: &str) -> u32 {
    text.bytes()
        .fold(5381u32, |hash, byte| {
            hash.wrapping_mul(33).wrapping_add(u32::from(byte))
        })
}
