use crate::error::{AppError, Result};
use crate::prompt::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".plantocode";
pub const DEFAULT_CONFIG_FILENAME: &str = "plancontext.toml";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default = "default_true")]
    pub use_gitignore: bool,
    #[serde(default = "default_true")]
    pub enable_builtin_ignore: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TreeConfig {
    #[serde(default)]
    pub use_gitignore: IgnoreSetting,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PromptConfig {
    #[serde(default)]
    pub import: Vec<PathBuf>,
    #[serde(flatten, default)]
    pub custom: HashMap<String, PromptTemplate>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Falls back to the GEMINI_API_KEY environment variable when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreSetting {
    #[default]
    Inherit,
    True,
    False,
}

fn default_true() -> bool {
    true
}
fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_temperature() -> f32 {
    0.2
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            use_gitignore: default_true(),
            enable_builtin_ignore: default_true(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_key: None,
            base_url: default_gemini_base_url(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("PROJECT_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let expanded = shellexpand::tilde(p_str);
                let mut path = PathBuf::from(expanded.as_ref());
                if !path.is_absolute() {
                    path = project_root.join(path);
                }
                if !path.exists() && path.extension().is_none() {
                    path.set_extension("toml");
                }
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn get_effective_gitignore(&self, section_setting: &IgnoreSetting) -> bool {
        match section_setting {
            IgnoreSetting::True => true,
            IgnoreSetting::False => false,
            IgnoreSetting::Inherit => self.general.use_gitignore,
        }
    }

    pub fn get_effective_project_name(&self, project_root: &Path) -> String {
        self.general.project_name.clone().unwrap_or_else(|| {
            project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "UnknownProject".to_string())
        })
    }

    /// Default configuration rendered as TOML, for `plancontext config`.
    pub fn default_config_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).map_err(AppError::TomlSerialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.general.use_gitignore);
        assert!(config.general.enable_builtin_ignore);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.max_output_tokens, 8192);
    }

    #[test]
    fn sections_parse_with_partial_fields() {
        let toml_str = r#"
            [general]
            project_name = "demo"
            use_gitignore = false

            [tree]
            use_gitignore = "true"
            exclude = ["*.snap"]

            [gemini]
            model = "gemini-2.5-pro"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.project_name.as_deref(), Some("demo"));
        assert!(!config.general.use_gitignore);
        assert_eq!(config.tree.use_gitignore, IgnoreSetting::True);
        assert_eq!(config.tree.exclude, vec!["*.snap".to_string()]);
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        // untouched section keeps its defaults
        assert_eq!(config.gemini.temperature, 0.2);
    }

    #[test]
    fn gitignore_tristate_resolves_against_general() {
        let mut config = Config::default();
        config.general.use_gitignore = false;
        assert!(!config.get_effective_gitignore(&IgnoreSetting::Inherit));
        assert!(config.get_effective_gitignore(&IgnoreSetting::True));
        config.general.use_gitignore = true;
        assert!(config.get_effective_gitignore(&IgnoreSetting::Inherit));
        assert!(!config.get_effective_gitignore(&IgnoreSetting::False));
    }

    #[test]
    fn custom_prompt_templates_flatten_from_toml() {
        let toml_str = r#"
            [prompt.refactor]
            system = "You refactor code."
            user = "Refactor: {{task}}"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let template = config.prompt.custom.get("refactor").unwrap();
        assert_eq!(template.system, "You refactor code.");
        assert_eq!(template.user, "Refactor: {{task}}");
    }

    #[test]
    fn project_name_falls_back_to_directory_name() {
        let config = Config::default();
        let name = config.get_effective_project_name(Path::new("/tmp/sample-project"));
        assert_eq!(name, "sample-project");
    }

    #[test]
    fn default_config_toml_round_trips() {
        let rendered = Config::default_config_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = "[general]\nno_such_key = true\n";
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }
}
