pub mod config;
pub mod error;
pub mod gemini;
pub mod output_formats;
pub mod prompt;
pub mod scan;
pub mod tokens;
pub mod tree;

pub use config::{Config, GeminiConfig, GeneralConfig, IgnoreSetting, PromptConfig, TreeConfig};
pub use error::{AppError, Result};
pub use gemini::{GeminiClient, GenerateReply, GenerateRequest};
pub use output_formats::{
    BuiltinIgnores, get_builtin_ignore_patterns, get_builtin_templates, serialize_to_json,
    serialize_to_yaml,
};
pub use prompt::{
    ComposedPrompt, PromptTemplate, compose_prompt, generate_prompt_id, resolve_templates,
    substitute_placeholders,
};
pub use scan::{FileInfo, collect_project_files, read_project_files};
pub use tokens::{CHARS_PER_TOKEN, estimate_tokens};
pub use tree::{TreeNode, build_tree, generate_directory_tree, render_tree};
