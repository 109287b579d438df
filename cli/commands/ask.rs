use crate::cli_args::AskArgs;
use crate::commands::prompt::compose_for_project;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use colored::Colorize;
use plancontext_core::{Config, GeminiClient, GenerateRequest};

pub fn handle_ask_command(args: AskArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let mut config = load_config_for_command(
        &project_root,
        &args.project_config,
        Some(&args.filters),
        Some(&args.ignore_toggles),
    )
    .context("Failed to load configuration")?;
    if let Some(model) = &args.model {
        config.gemini.model = model.clone();
    }

    let composed = compose_for_project(
        &project_root,
        &config,
        &args.template,
        Some(&args.task),
        &args.vars,
    )?;

    let client = GeminiClient::from_config(&config.gemini)
        .context("Failed to initialize the Gemini client")?;
    let request = GenerateRequest::from_config(&config.gemini, composed.system, composed.user);

    if !quiet {
        eprintln!(
            "{} {} {}",
            "Asking".green(),
            request.model.cyan(),
            format!("(prompt {})", composed.id).dimmed()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let reply = runtime
        .block_on(client.generate(&request))
        .context("Gemini request failed")?;

    output::write_to_stdout(&reply.text)?;

    if !quiet {
        if let (Some(prompt_tokens), Some(completion_tokens)) =
            (reply.prompt_tokens, reply.completion_tokens)
        {
            eprintln!(
                "{}",
                format!(
                    "tokens: {} prompt / {} completion",
                    prompt_tokens, completion_tokens
                )
                .dimmed()
            );
        }
    }
    Ok(())
}
