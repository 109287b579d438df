use crate::cli_args::TokensArgs;
use crate::load_config_for_command;
use crate::output::{print_data_or_text, print_token_report_table};
use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use plancontext_core::{self as core, Config, FileInfo};
use serde::Serialize;
use std::path::Path;
use tiktoken_rs::cl100k_base;

#[derive(Debug, Serialize)]
pub struct TokenReport {
    pub total_files: usize,
    pub total_lines: usize,
    pub total_bytes: u128,
    pub total_bytes_readable: String,
    pub total_tokens: usize,
    /// "estimated" (character heuristic) or "cl100k" (exact).
    pub counting: String,
    pub files: Vec<FileTokens>,
}

#[derive(Debug, Serialize)]
pub struct FileTokens {
    pub path: String,
    pub lines: usize,
    pub bytes: usize,
    pub bytes_readable: String,
    pub tokens: usize,
}

pub fn handle_tokens_command(args: TokensArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(
        &project_root,
        &args.project_config,
        Some(&args.filters),
        Some(&args.ignore_toggles),
    )
    .context("Failed to load configuration for tokens command")?;

    log::debug!("Gathering files for the token report...");
    let files = core::read_project_files(&project_root, &config, quiet)
        .context("Failed to read project files for the token report")?;

    if files.is_empty() && !quiet {
        println!("No readable files found to report on.");
        return Ok(());
    }

    log::debug!("Calculating token counts ({} files)...", files.len());
    let report = build_report(&files, &project_root, args.exact)?;
    log::debug!("Token report complete.");

    if args.format_output.format.is_none() {
        print_token_report_table(&report)
    } else {
        print_data_or_text(&report, None, &args.format_output)
    }
}

fn build_report(files: &[FileInfo], project_root: &Path, exact: bool) -> Result<TokenReport> {
    let bpe = if exact {
        Some(cl100k_base().map_err(|e| {
            anyhow::anyhow!(core::AppError::TikToken(e.to_string()))
        })?)
    } else {
        None
    };

    let mut total_files = 0;
    let mut total_lines = 0;
    let mut total_bytes: u128 = 0;
    let mut total_tokens = 0;
    let mut file_entries = Vec::new();

    for file in files {
        if file.size == 0 {
            continue;
        }

        let lines = file.content.lines().count();
        let tokens = match &bpe {
            Some(bpe) => bpe.encode_ordinary(&file.content).len(),
            None => core::estimate_tokens(&file.content),
        };

        let relative_path = pathdiff::diff_paths(&file.path, project_root)
            .unwrap_or_else(|| file.path.clone())
            .to_string_lossy()
            .to_string();

        total_files += 1;
        total_lines += lines;
        total_bytes = total_bytes.saturating_add(file.size as u128);
        total_tokens += tokens;

        file_entries.push(FileTokens {
            path: relative_path,
            lines,
            bytes: file.size,
            bytes_readable: readable_size(file.size as u128),
            tokens,
        });
    }

    file_entries.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(TokenReport {
        total_files,
        total_lines,
        total_bytes,
        total_bytes_readable: readable_size(total_bytes),
        total_tokens,
        counting: if exact { "cl100k" } else { "estimated" }.to_string(),
        files: file_entries,
    })
}

fn readable_size(bytes: u128) -> String {
    Byte::from_u128(bytes)
        .unwrap_or_default()
        .get_appropriate_unit(UnitType::Binary)
        .to_string()
}
