mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::process;

use cli_args::{Cli, Commands, FilterGroup, IgnoreTogglesGroup, ProjectConfigOpts};
use plancontext_core::{AppError, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;
    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(()) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let core_err = e.downcast_ref::<AppError>();
            let exit_code = match core_err {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::TomlSerialize(_)) => 1,
                Some(AppError::DataLoading(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::Ignore(_)) => 2,
                Some(AppError::Glob(_)) => 2,
                Some(AppError::Prompt(_)) => 3,
                Some(AppError::GeminiRequest(_)) => 4,
                Some(AppError::GeminiApi { .. }) => 4,
                Some(AppError::GeminiResponse(_)) => 4,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(AppError::Yaml(_)) => 6,
                Some(AppError::TikToken(_)) => 8,
                Some(_) => 1,
                None => 1,
            };

            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Tree(args) => {
                log::debug!("Executing 'tree' command...");
                commands::tree::handle_tree_command(args, quiet)?;
            }
            Commands::Tokens(args) => {
                log::debug!("Executing 'tokens' command...");
                commands::tokens::handle_tokens_command(args, quiet)?;
            }
            Commands::Prompt(args) => {
                log::debug!("Executing 'prompt' command...");
                commands::prompt::handle_prompt_command(args, quiet)?;
            }
            Commands::Ask(args) => {
                log::debug!("Executing 'ask' command...");
                commands::ask::handle_ask_command(args, quiet)?;
            }
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                commands::config::handle_config_command(&args, quiet)?;
            }
        },
    }
    Ok(())
}

/// Loads the project config and applies the CLI override groups shared by
/// the scanning commands.
pub fn load_config_for_command(
    project_root: &std::path::Path,
    project_opts: &ProjectConfigOpts,
    filters: Option<&FilterGroup>,
    ignore_toggles: Option<&IgnoreTogglesGroup>,
) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        project_opts.config_file.as_ref(),
        project_opts.disable_config_file,
    )
    .context("Failed to resolve configuration path")?;

    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(name) = &project_opts.project_name {
        config.general.project_name = Some(name.clone());
    }

    if let Some(filters) = filters {
        if !filters.tree_include.is_empty() {
            config.tree.include = filters.tree_include.clone();
        }
        if !filters.tree_exclude.is_empty() {
            config.tree.exclude = filters.tree_exclude.clone();
        }
    }

    if let Some(toggles) = ignore_toggles {
        if toggles.disable_gitignore {
            config.general.use_gitignore = false;
        }
        if toggles.enable_gitignore {
            config.general.use_gitignore = true;
        }
        if toggles.disable_builtin_ignore {
            config.general.enable_builtin_ignore = false;
        }
        if toggles.enable_builtin_ignore {
            config.general.enable_builtin_ignore = true;
        }
    }

    // Ensure project name is set (fallback to directory name)
    config.general.project_name = Some(config.get_effective_project_name(project_root));

    Ok(config)
}
