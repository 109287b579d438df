use crate::cli_args::TreeArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use colored::Colorize;
use plancontext_core::{self as core, Config};

pub fn handle_tree_command(args: TreeArgs, quiet: bool) -> Result<()> {
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

    let paths = core::collect_project_files(&project_root, &config)
        .context("Failed to scan project files")?;
    log::debug!("Scan yielded {} files.", paths.len());

    let root = core::build_tree(&paths);

    match args.format_output.format {
        None => {
            let rendered = core::render_tree(&root, "", true);
            let rendered = rendered.trim_end();
            if rendered.is_empty() {
                if !quiet {
                    eprintln!("{}", "No non-ignored files found.".yellow());
                }
            } else {
                output::write_to_stdout(rendered)?;
            }
            Ok(())
        }
        Some(_) => {
            // serialize the top-level entries; the synthetic root is an
            // implementation detail of the builder
            output::print_data_or_text(&root.children, None, &args.format_output)
        }
    }
}
