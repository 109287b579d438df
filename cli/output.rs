use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use plancontext_core::output_formats;

use crate::cli_args::FormatOutputOpts;

/// Prints `data` in the requested structured format, or falls back to the
/// given plain-text rendering when no format was requested.
pub fn print_data_or_text<T: Serialize>(
    data: &T,
    plain_text: Option<String>,
    format_opts: &FormatOutputOpts,
) -> Result<()> {
    match format_opts.format.as_deref() {
        None => match plain_text {
            Some(text) => write_to_stdout(&text),
            None => {
                let content = output_formats::serialize_to_json(data, !format_opts.compact)?;
                write_to_stdout(&content)
            }
        },
        Some(format) => {
            let content = serialize_output(data, format, !format_opts.compact)?;
            write_to_stdout(&content)
        }
    }
}

pub fn serialize_output<T: Serialize>(data: &T, format: &str, pretty_json: bool) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => output_formats::serialize_to_yaml(data).map_err(anyhow::Error::from),
        _ => output_formats::serialize_to_json(data, pretty_json).map_err(anyhow::Error::from),
    }
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

pub fn print_saved_notice(label: &str, path: &Path, quiet: bool) {
    if !quiet {
        println!(
            "{} {} saved to: {}",
            "OK".green().bold(),
            label,
            path.display().to_string().blue()
        );
    }
}

pub fn print_token_report_table(report: &crate::commands::tokens::TokenReport) -> Result<()> {
    println!();
    println!("{}", " Token Report ".green().bold().underline());
    println!(
        "{:<20} {}",
        "Total Files:".green(),
        report.total_files.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Lines:".green(),
        report.total_lines.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Size:".green(),
        report.total_bytes_readable.cyan()
    );
    println!(
        "{:<20} {} {}",
        "Tokens:".green(),
        report.total_tokens.to_string().cyan(),
        format!("({})", report.counting).dimmed()
    );

    if report.files.is_empty() {
        println!("\n{}", "(No files included in the report)".yellow());
    } else {
        println!("\n{}", " File Details ".green().bold().underline());
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Path").fg(Color::Green),
            Cell::new("Lines").fg(Color::Green),
            Cell::new("Size").fg(Color::Green),
            Cell::new("Tokens").fg(Color::Green),
        ]);
        for file in &report.files {
            table.add_row(vec![
                Cell::new(&file.path).fg(Color::Cyan),
                Cell::new(file.lines).set_alignment(comfy_table::CellAlignment::Right),
                Cell::new(&file.bytes_readable)
                    .set_alignment(comfy_table::CellAlignment::Right)
                    .fg(Color::DarkGrey),
                Cell::new(file.tokens).set_alignment(comfy_table::CellAlignment::Right),
            ]);
        }
        println!("{table}");
    }
    println!();
    Ok(())
}
