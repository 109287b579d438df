use crate::cli_args::ConfigArgs;
use crate::output;
use anyhow::{Context, Result};
use plancontext_core::Config;
use plancontext_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};

pub fn handle_config_command(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let default_toml =
        Config::default_config_toml().context("Failed to render the default configuration")?;

    if !args.save {
        output::write_to_stdout(&default_toml)?;
        return Ok(());
    }

    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    let target = project_root
        .join(DEFAULT_CONFIG_DIR)
        .join(DEFAULT_CONFIG_FILENAME);

    if target.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at '{}'. Use --force to overwrite.",
            target.display()
        );
    }

    output::write_to_file(&target, &default_toml)
        .with_context(|| format!("Failed to write config to {}", target.display()))?;
    output::print_saved_notice("Default config", &target, quiet);
    Ok(())
}
