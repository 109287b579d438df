use crate::error::{AppError, Result};
use crate::prompt::PromptTemplate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Patterns excluded when `[general].enable_builtin_ignore` is on.
#[derive(Debug, Default, Deserialize)]
pub struct BuiltinIgnores {
    #[serde(default)]
    pub common: Vec<String>,
    #[serde(default)]
    pub tree: Vec<String>,
}

static BUILTIN_IGNORE_PATTERNS: Lazy<BuiltinIgnores> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/builtin_ignores.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/builtin_ignores.yaml")
});

static BUILTIN_TEMPLATES: Lazy<HashMap<String, PromptTemplate>> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/prompts.yaml"));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/prompts.yaml")
});

pub fn get_builtin_ignore_patterns() -> &'static BuiltinIgnores {
    &BUILTIN_IGNORE_PATTERNS
}

pub fn get_builtin_templates() -> &'static HashMap<String, PromptTemplate> {
    &BUILTIN_TEMPLATES
}

pub fn serialize_to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(data).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(data).map_err(AppError::JsonSerialize)
    }
}

pub fn serialize_to_yaml<T: Serialize>(data: &T) -> Result<String> {
    serde_yml::to_string(data).map_err(AppError::Yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_ignore_patterns_parse_and_cover_the_basics() {
        let ignores = get_builtin_ignore_patterns();
        assert!(ignores.common.iter().any(|p| p == "node_modules/"));
        assert!(ignores.common.iter().any(|p| p == "target/"));
        assert!(!ignores.tree.is_empty());
    }

    #[test]
    fn embedded_templates_parse_with_expected_placeholders() {
        let templates = get_builtin_templates();
        let plan = templates.get("plan").unwrap();
        assert!(plan.system.contains("{{directory_tree}}"));
        assert!(plan.user.contains("{{task}}"));
    }

    #[test]
    fn json_serialization_respects_pretty_flag() {
        let data = vec!["a", "b"];
        assert_eq!(serialize_to_json(&data, false).unwrap(), r#"["a","b"]"#);
        assert!(serialize_to_json(&data, true).unwrap().contains('\n'));
    }
}
