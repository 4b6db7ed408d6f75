//! Interactive measurement file picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `hfs fit` and choose a file" UX
//!
//! The picker searches for measurement files (see [`DATA_EXTENSIONS`]) under
//! the current working directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::HfsError;

/// Default directory recursion depth for finding data files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// File extensions offered by the picker.
pub const DATA_EXTENSIONS: [&str; 4] = ["dat", "txt", "asc", "csv"];

/// Prompt the user to select a measurement file from the current directory tree.
///
/// Behavior:
/// - list discovered data files
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_data_path() -> Result<PathBuf, HfsError> {
    let files = discover_data_files();
    if files.is_empty() {
        return Err(HfsError::input(
            "file",
            "no measurement files found; provide one with `hfs fit -f <file>`",
        ));
    }

    println!("Found {} measurement file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| HfsError::Io(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| HfsError::Io(format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(HfsError::input(
                "file",
                "no input received; provide a path with `hfs fit -f <file>`",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(HfsError::input("file", "canceled"));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_data_path(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        match validate_data_path(Path::new(input)) {
            Ok(path) => return Ok(path),
            Err(err) => {
                println!("{err}");
                continue;
            }
        }
    }
}

/// Validate the provided path points to an existing file.
///
/// Any extension is accepted for explicit paths; only discovery filters by
/// extension.
pub fn validate_data_path(path: &Path) -> Result<PathBuf, HfsError> {
    if !path.exists() {
        return Err(HfsError::DataFormat(format!(
            "measurement file not found: {}",
            path.display()
        )));
    }
    if path.is_dir() {
        return Err(HfsError::DataFormat(format!(
            "expected a file, got a directory: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Discover data files under the current directory (deterministic order).
///
/// This is used by both the basic text prompt and the Ratatui TUI.
pub fn discover_data_files() -> Vec<PathBuf> {
    find_data_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_data_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_data_files_inner(root, 0, max_depth, &mut out);
    out.sort_by(|a, b| pretty_path(a).cmp(&pretty_path(b)));
    out
}

fn find_data_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_data_files_inner(&path, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file() && has_data_extension(&path) {
            out.push(path);
        }
    }
}

fn has_data_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DATA_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
        == Some(true)
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

pub fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_filters_extensions_and_skips_build_dirs() {
        let root = std::env::temp_dir().join("beam_hfs_picker_test");
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("target")).unwrap();
        fs::create_dir_all(root.join("runs")).unwrap();
        fs::write(root.join("runs/scan1.dat"), "x").unwrap();
        fs::write(root.join("scan0.TXT"), "x").unwrap();
        fs::write(root.join("notes.md"), "x").unwrap();
        fs::write(root.join("target/ignored.dat"), "x").unwrap();

        let found = find_data_files(&root, DEFAULT_SEARCH_DEPTH);
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let _ = fs::remove_dir_all(&root);

        assert_eq!(names.len(), 2);
        assert!(names.contains(&"scan1.dat".to_string()));
        assert!(names.contains(&"scan0.TXT".to_string()));
    }

    #[test]
    fn validate_rejects_missing_and_directories() {
        let dir = std::env::temp_dir();
        assert!(validate_data_path(&dir).is_err());
        assert!(validate_data_path(&dir.join("beam_hfs_nope.dat")).is_err());
    }
}
