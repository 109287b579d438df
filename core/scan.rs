use crate::config::Config;
use crate::error::{AppError, Result};
use crate::output_formats::get_builtin_ignore_patterns;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{WalkBuilder, WalkState};
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub content: String,
    pub size: usize,
}

/// Enumerates the non-ignored files under `project_root`.
///
/// Returns project-relative paths with `/` separators, sorted for
/// deterministic output. Filtering layers: gitignore rules (honored by the
/// walker itself per config), an explicit `.git` skip, the `[tree]`
/// include/exclude globs, and the embedded built-in ignore patterns.
pub fn collect_project_files(project_root: &Path, config: &Config) -> Result<Vec<String>> {
    log::debug!("Scanning project files in {}...", project_root.display());

    let include_set = build_glob_set(&config.tree.include)?;
    let exclude_set = build_glob_set(&config.tree.exclude)?;
    let has_includes = !config.tree.include.is_empty();

    let builtin = get_builtin_ignore_patterns();
    let common_builtin_set = build_glob_set(&builtin.common)?;
    let tree_builtin_set = build_glob_set(&builtin.tree)?;
    let use_builtin = config.general.enable_builtin_ignore;

    let use_gitignore = config.get_effective_gitignore(&config.tree.use_gitignore);
    let walked = walk_files(project_root, use_gitignore)?;
    log::debug!("Walk complete. Found {} candidate files.", walked.len());

    let mut relative_paths: Vec<String> = walked
        .into_iter()
        .filter(|relative| {
            if starts_with_git_dir(relative) {
                log::trace!("Skipping path within .git: {}", relative.display());
                return false;
            }
            if exclude_set.is_match(relative) {
                log::trace!("Excluded by [tree].exclude: {}", relative.display());
                return false;
            }
            if has_includes && !include_set.is_match(relative) {
                log::trace!("Not matched by [tree].include: {}", relative.display());
                return false;
            }
            if use_builtin
                && (common_builtin_set.is_match(relative) || tree_builtin_set.is_match(relative))
            {
                log::trace!("Excluded by built-in ignores: {}", relative.display());
                return false;
            }
            true
        })
        .map(|relative| to_slash_path(&relative))
        .collect();

    relative_paths.sort_unstable();
    log::info!(
        "Scan of {} yielded {} files.",
        project_root.display(),
        relative_paths.len()
    );
    Ok(relative_paths)
}

/// Reads the content of every non-ignored file, in parallel.
///
/// Non-UTF-8 files are skipped with a debug log; per-file read failures are
/// collected and reported on stderr (unless `quiet`) without aborting the
/// rest of the batch. Results are sorted by path.
pub fn read_project_files(
    project_root: &Path,
    config: &Config,
    quiet: bool,
) -> Result<Vec<FileInfo>> {
    let relative_paths = collect_project_files(project_root, config)?;
    log::info!("Reading content of {} files...", relative_paths.len());

    let results: Vec<Result<FileInfo>> = relative_paths
        .into_par_iter()
        .map(|relative| {
            let path = project_root.join(&relative);
            match fs::read(&path) {
                Ok(bytes) => {
                    let size = bytes.len();
                    match String::from_utf8(bytes) {
                        Ok(content) => Ok(FileInfo {
                            path,
                            content,
                            size,
                        }),
                        Err(e) => {
                            log::debug!("Skipping non-UTF-8 file: {} ({})", path.display(), e);
                            Err(AppError::DataLoading(format!(
                                "Skipped non-UTF-8 file: {}",
                                path.display()
                            )))
                        }
                    }
                }
                Err(e) => Err(AppError::FileRead { path, source: e }),
            }
        })
        .collect();

    let mut files = Vec::new();
    let mut read_errors = Vec::new();
    for result in results {
        match result {
            Ok(info) => files.push(info),
            Err(AppError::DataLoading(_)) => {}
            Err(e) => read_errors.push(e),
        }
    }

    if !read_errors.is_empty() && !quiet {
        use colored::Colorize;
        eprintln!(
            "\n{}",
            "Warning: errors encountered while reading files:".yellow()
        );
        for err in &read_errors {
            eprintln!(" - {}", err);
        }
    }

    files.par_sort_unstable_by(|a, b| a.path.cmp(&b.path));
    log::info!("File reading complete ({} readable files).", files.len());
    Ok(files)
}

fn walk_files(project_root: &Path, use_gitignore: bool) -> Result<Vec<PathBuf>> {
    if !project_root.exists() {
        return Err(AppError::InvalidArgument(format!(
            "Project root does not exist: {}",
            project_root.display()
        )));
    }

    let mut builder = WalkBuilder::new(project_root);
    builder.threads(rayon::current_num_threads().min(12));
    builder.hidden(false);
    builder.ignore(use_gitignore);
    builder.git_ignore(use_gitignore);
    builder.git_exclude(use_gitignore);
    builder.require_git(false);
    log::debug!("WalkBuilder configured (gitignore: {})", use_gitignore);

    let walker = builder.build_parallel();
    let project_root_clone = project_root.to_path_buf();
    let (tx_walked, rx_walked) = mpsc::channel::<PathBuf>();

    walker.run(move || {
        let tx_thread = tx_walked.clone();
        let proj_root = project_root_clone.clone();

        Box::new(move |entry_result| {
            match entry_result {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        return WalkState::Continue;
                    }
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        return WalkState::Continue;
                    }
                    if let Some(relative) = pathdiff::diff_paths(entry.path(), &proj_root) {
                        log::trace!("Walked file: {}", relative.display());
                        if tx_thread.send(relative).is_err() {
                            log::error!("Receiver dropped for walked paths, stopping walk early.");
                            return WalkState::Quit;
                        }
                    } else {
                        log::warn!("Could not relativize path: {}", entry.path().display());
                    }
                }
                Err(e) => {
                    log::warn!("Error walking directory: {}", e);
                }
            }
            WalkState::Continue
        })
    });

    Ok(rx_walked.into_iter().collect())
}

fn starts_with_git_dir(relative: &Path) -> bool {
    relative.components().next() == Some(Component::Normal(".git".as_ref()))
}

fn to_slash_path(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    segments.join("/")
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let mut processed = pattern_str.trim().to_string();
        if processed.ends_with('/') && processed.len() > 1 {
            processed.push_str("**");
        }
        let glob = Glob::new(&processed).map_err(|e| {
            log::error!("Invalid glob pattern \"{}\": {}", pattern_str, e);
            AppError::Glob(format!(
                "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                pattern_str, processed, e
            ))
        })?;
        log::trace!(
            "Adding glob pattern: {} (processed as {})",
            pattern_str,
            processed
        );
        builder.add(glob);
    }
    builder.build().map_err(|e| {
        log::error!("Error building glob set: {}", e);
        AppError::Glob(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "content\n").unwrap();
    }

    #[test]
    fn collects_files_sorted_with_slash_separators() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "src/util/mod.rs");
        touch(dir.path(), "Cargo.toml");
        let config = Config::default();

        let files = collect_project_files(dir.path(), &config).unwrap();
        assert_eq!(
            files,
            vec![
                "Cargo.toml".to_string(),
                "src/main.rs".to_string(),
                "src/util/mod.rs".to_string(),
            ]
        );
    }

    #[test]
    fn gitignored_files_are_excluded_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kept.rs");
        touch(dir.path(), "generated.tmp");
        fs::write(dir.path().join(".gitignore"), "*.tmp\n").unwrap();
        let config = Config::default();

        let files = collect_project_files(dir.path(), &config).unwrap();
        assert!(files.contains(&"kept.rs".to_string()));
        assert!(!files.contains(&"generated.tmp".to_string()));

        let mut no_gitignore = Config::default();
        no_gitignore.general.use_gitignore = false;
        let files = collect_project_files(dir.path(), &no_gitignore).unwrap();
        assert!(files.contains(&"generated.tmp".to_string()));
    }

    #[test]
    fn builtin_ignores_drop_dependency_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "index.ts");
        touch(dir.path(), "node_modules/pkg/index.js");
        let config = Config::default();

        let files = collect_project_files(dir.path(), &config).unwrap();
        assert_eq!(files, vec!["index.ts".to_string()]);

        let mut raw = Config::default();
        raw.general.enable_builtin_ignore = false;
        let files = collect_project_files(dir.path(), &raw).unwrap();
        assert!(files.contains(&"node_modules/pkg/index.js".to_string()));
    }

    #[test]
    fn git_directory_is_always_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.rs");
        touch(dir.path(), ".git/config");
        let mut config = Config::default();
        config.general.enable_builtin_ignore = false;
        config.general.use_gitignore = false;

        let files = collect_project_files(dir.path(), &config).unwrap();
        assert_eq!(files, vec!["main.rs".to_string()]);
    }

    #[test]
    fn include_patterns_restrict_and_exclude_patterns_trim() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/lib.rs");
        touch(dir.path(), "src/lib_test.rs");
        touch(dir.path(), "docs/guide.md");

        let mut config = Config::default();
        config.tree.include = vec!["src/**".to_string()];
        config.tree.exclude = vec!["*_test.rs".to_string()];

        let files = collect_project_files(dir.path(), &config).unwrap();
        assert_eq!(files, vec!["src/lib.rs".to_string()]);
    }

    #[test]
    fn directory_exclude_with_trailing_slash_covers_subtree() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "vendor/lib/code.rs");
        let mut config = Config::default();
        config.tree.exclude = vec!["vendor/".to_string()];

        let files = collect_project_files(dir.path(), &config).unwrap();
        assert_eq!(files, vec!["src/main.rs".to_string()]);
    }

    #[test]
    fn invalid_glob_surfaces_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.rs");
        let mut config = Config::default();
        config.tree.exclude = vec!["[broken".to_string()];

        match collect_project_files(dir.path(), &config) {
            Err(AppError::Glob(_)) => {}
            other => panic!("expected Glob error, got {:?}", other),
        }
    }

    #[test]
    fn missing_root_surfaces_typed_error() {
        let config = Config::default();
        let result = collect_project_files(Path::new("/nonexistent/plancontext-test"), &config);
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn read_project_files_skips_binary_content() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "text.rs");
        fs::write(dir.path().join("binary.rs"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        let config = Config::default();

        let files = read_project_files(dir.path(), &config, true).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["text.rs".to_string()]);
        assert_eq!(files[0].content, "content\n");
        assert_eq!(files[0].size, 8);
    }
}
