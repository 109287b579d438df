use crate::cli_args::PromptArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use colored::Colorize;
use plancontext_core::{self as core, ComposedPrompt, Config};
use std::collections::HashMap;

pub fn handle_prompt_command(args: PromptArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(
        &project_root,
        &args.project_config,
        Some(&args.filters),
        Some(&args.ignore_toggles),
    )
    .context("Failed to load configuration")?;

    let composed = compose_for_project(
        &project_root,
        &config,
        &args.template,
        args.task.as_deref(),
        &args.vars,
    )?;

    if !composed.unresolved.is_empty() && !quiet {
        eprintln!(
            "{} Unresolved placeholders left verbatim: {}",
            "Warning:".yellow().bold(),
            composed.unresolved.join(", ")
        );
    }

    match &args.save {
        Some(path) => {
            output::write_to_file(path, &render_plain(&composed))
                .with_context(|| format!("Failed to save prompt to {}", path.display()))?;
            output::print_saved_notice("Prompt", path, quiet);
            Ok(())
        }
        None => output::print_data_or_text(
            &composed,
            Some(render_plain(&composed)),
            &args.format_output,
        ),
    }
}

/// Shared composition path for `prompt` and `ask`: resolve templates, embed
/// the directory tree, and substitute placeholders.
pub fn compose_for_project(
    project_root: &std::path::Path,
    config: &Config,
    template: &str,
    task: Option<&str>,
    vars: &[(String, String)],
) -> Result<ComposedPrompt> {
    log::debug!("Generating directory tree for prompt embedding...");
    let tree_text = core::generate_directory_tree(project_root, config);
    if tree_text.is_empty() {
        log::warn!("Directory tree is empty; the prompt will carry a blank structure section.");
    }

    let templates = core::resolve_templates(&config.prompt, project_root)
        .context("Failed to resolve prompt templates")?;

    let mut values: HashMap<String, String> = HashMap::new();
    values.insert(
        "project_name".to_string(),
        config.get_effective_project_name(project_root),
    );
    values.insert("directory_tree".to_string(), tree_text);
    if let Some(task) = task {
        values.insert("task".to_string(), task.to_string());
    }
    for (key, value) in vars {
        values.insert(key.clone(), value.clone());
    }

    let composed = core::compose_prompt(template, &templates, &values)
        .context("Failed to compose prompt")?;
    log::info!(
        "Composed prompt {} from template '{}'.",
        composed.id,
        composed.template
    );
    Ok(composed)
}

fn render_plain(composed: &ComposedPrompt) -> String {
    format!(
        "# id: {}\n# template: {}\n\n## System\n\n{}\n\n## User\n\n{}\n",
        composed.id,
        composed.template,
        composed.system.trim_end(),
        composed.user.trim_end()
    )
}
