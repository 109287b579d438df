use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Specify the target project directory (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .plantocode/plancontext.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "disable_config_file",
        help_heading = "Project Setup"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Project Setup"
    )]
    pub disable_config_file: bool,

    #[arg(
        long,
        help = "Specify the project name (overrides config/dir name).",
        value_name = "NAME",
        help_heading = "Project Setup"
    )]
    pub project_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Emit structured output instead of text.", value_name = "FORMAT", value_parser = ["json", "yaml"], help_heading = "Output Formatting")]
    pub format: Option<String>,

    #[arg(
        long,
        help = "Minify JSON output (default is pretty-printed).",
        help_heading = "Output Formatting"
    )]
    pub compact: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterGroup {
    #[arg(long = "tree-include", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Add include path/glob pattern for the file scan.", help_heading = "Content Filtering")]
    pub tree_include: Vec<String>,
    #[arg(long = "tree-exclude", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Add exclude path/glob pattern for the file scan.", help_heading = "Content Filtering")]
    pub tree_exclude: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IgnoreTogglesGroup {
    #[arg(
        long,
        help = "Respect .gitignore files [default: enabled].",
        overrides_with = "disable_gitignore",
        help_heading = "Ignore Rules"
    )]
    pub enable_gitignore: bool,
    #[arg(
        long,
        help = "Do not respect .gitignore files.",
        overrides_with = "enable_gitignore",
        help_heading = "Ignore Rules"
    )]
    pub disable_gitignore: bool,

    #[arg(
        long,
        help = "Apply built-in ignores (e.g., *.lock, target/) [default: enabled].",
        overrides_with = "disable_builtin_ignore",
        help_heading = "Ignore Rules"
    )]
    pub enable_builtin_ignore: bool,
    #[arg(
        long,
        help = "Do not apply built-in ignores.",
        overrides_with = "enable_builtin_ignore",
        help_heading = "Ignore Rules"
    )]
    pub disable_builtin_ignore: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate prompt-ready project context for the PlanToCode assistant.",
    long_about = "plancontext scans a project's non-ignored files and turns them into \nprompt-ready context: a directory tree diagram, token estimates, and composed \nsystem/user prompts that can be sent straight to Gemini.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  plancontext tree\n  plancontext tokens --exact\n  plancontext prompt \"add dark mode\" --template plan\n  plancontext ask \"add dark mode\"",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "t",
        about = "Print the directory tree of non-ignored project files."
    )]
    Tree(TreeArgs),

    #[command(
        visible_alias = "tok",
        about = "Calculate per-file and total token estimates."
    )]
    Tokens(TokensArgs),

    #[command(
        visible_alias = "p",
        about = "Compose a prompt from a template, the tree, and a task."
    )]
    Prompt(PromptArgs),

    #[command(
        visible_alias = "a",
        about = "Compose a prompt and send it to Gemini, printing the reply."
    )]
    Ask(AskArgs),

    #[command(about = "Generate shell completion scripts.")]
    Completion(CompletionArgs),

    #[command(about = "Show or save the default configuration file structure.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub ignore_toggles: IgnoreTogglesGroup,
}

#[derive(Args, Debug, Clone)]
pub struct TokensArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub ignore_toggles: IgnoreTogglesGroup,

    #[arg(
        long,
        help = "Count tokens with the cl100k tokenizer instead of the character heuristic."
    )]
    pub exact: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PromptArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub ignore_toggles: IgnoreTogglesGroup,

    #[arg(value_name = "TASK", help = "Task description for the {{task}} placeholder.")]
    pub task: Option<String>,

    #[arg(
        short = 't',
        long,
        default_value = "plan",
        value_name = "NAME",
        help = "Template to compose (bare or namespaced name, e.g. 'plan' or 'custom:plan')."
    )]
    pub template: String,

    #[arg(long = "var", value_name = "key=value", value_parser = parse_key_val, action = clap::ArgAction::Append, help = "Add/override placeholder values.", help_heading = "Placeholders")]
    pub vars: Vec<(String, String)>,

    #[arg(
        short = 's',
        long,
        value_name = "FILE",
        help = "Save the composed prompt to a file instead of stdout."
    )]
    pub save: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub ignore_toggles: IgnoreTogglesGroup,

    #[arg(value_name = "TASK", help = "Task description for the {{task}} placeholder.")]
    pub task: String,

    #[arg(
        short = 't',
        long,
        default_value = "plan",
        value_name = "NAME",
        help = "Template to compose (bare or namespaced name)."
    )]
    pub template: String,

    #[arg(long = "var", value_name = "key=value", value_parser = parse_key_val, action = clap::ArgAction::Append, help = "Add/override placeholder values.", help_heading = "Placeholders")]
    pub vars: Vec<(String, String)>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Gemini model id (overrides config)."
    )]
    pub model: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (bash, zsh, fish) [default: bash]"
    )]
    pub shell: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(
        long,
        help = "Save default config to .plantocode/plancontext.toml in the project."
    )]
    pub save: bool,

    #[arg(long, requires = "save", help = "Overwrite an existing config file.")]
    pub force: bool,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    s.find('=')
        .map(|idx| {
            let key = s[..idx].trim().to_string();
            let value = s[idx + 1..].trim().to_string();
            if key.is_empty() {
                Err("Placeholder key cannot be empty".to_string())
            } else {
                Ok((key, value))
            }
        })
        .ok_or_else(|| "Invalid KEY=VALUE format for --var".to_string())?
}
