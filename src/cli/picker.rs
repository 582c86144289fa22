//! Interactive CSV picker for `credit batch` without `-f`.
//!
//! Lists `*.csv` files under the working directory and accepts either a list
//! number or a typed path. The TUI batch page reuses the discovery half.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// How deep below the working directory to look for CSV files.
const SEARCH_DEPTH: usize = 4;

const SKIP_DIRS: [&str; 4] = [".git", "target", "node_modules", "reports"];

/// Prompt on stdin/stdout until a valid CSV is chosen or the user quits.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::input(
            "No .csv files found. Pass one with `credit batch -f <file.csv>` \
             or create one with `credit sample -o <file.csv>`.",
        ));
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    choose(&files, &mut stdin.lock(), &mut stdout)
}

fn choose<R: BufRead, W: Write>(files: &[PathBuf], input: &mut R, out: &mut W) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::input(format!("Terminal I/O failed: {e}"));

    writeln!(out, "Found {} CSV file(s):", files.len()).map_err(io_err)?;
    for (idx, path) in files.iter().enumerate() {
        writeln!(out, "{:>3}) {}", idx + 1, display_path(path)).map_err(io_err)?;
    }

    loop {
        write!(out, "Pick a file (1-{}), type a path, or q to quit: ", files.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::input(
                "No selection made. Pass a CSV with `credit batch -f <file.csv>`.",
            ));
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::input("Canceled."));
        }

        let picked = match answer.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => validate_csv_path(&files[n - 1]),
            Ok(n) => Err(AppError::input(format!(
                "No file numbered {n}; choose 1-{}.",
                files.len()
            ))),
            Err(_) => validate_csv_path(Path::new(answer)),
        };
        match picked {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(io_err)?,
        }
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::input(format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::input(format!(
            "Expected a file, got a directory: {}",
            path.display()
        )));
    }
    if !is_csv(path) {
        return Err(AppError::input(format!(
            "Expected a .csv file, got: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under the working directory, sorted by path.
pub fn discover_csv_files() -> Vec<PathBuf> {
    discover_csv_files_in(Path::new("."), SEARCH_DEPTH)
}

pub fn discover_csv_files_in(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                if depth < max_depth && !is_skipped(&path) {
                    pending.push((path, depth + 1));
                }
            } else if kind.is_file() && is_csv(&path) {
                found.push(path);
            }
        }
    }

    found.sort_by_key(|p| display_path(p));
    found
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_skipped(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| SKIP_DIRS.contains(&name))
}

pub fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("b.csv"), "age\n30\n").unwrap();
        fs::write(dir.path().join("nested/a.CSV"), "age\n30\n").unwrap();
        fs::write(dir.path().join("nested/deeper/c.csv"), "age\n30\n").unwrap();
        fs::write(dir.path().join("target/skip.csv"), "age\n30\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        dir
    }

    #[test]
    fn discovery_respects_depth_and_skips() {
        let dir = fixture();
        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        let all = discover_csv_files_in(dir.path(), 4);
        assert_eq!(names(all), vec!["b.csv", "a.CSV", "c.csv"]);

        let shallow = discover_csv_files_in(dir.path(), 0);
        assert_eq!(names(shallow), vec!["b.csv"]);
    }

    #[test]
    fn choose_accepts_number_after_bad_input() {
        let dir = fixture();
        let files = discover_csv_files_in(dir.path(), 4);
        let mut input = io::Cursor::new("9\nnot-a-file.csv\n2\n");
        let mut out = Vec::new();

        let picked = choose(&files, &mut input, &mut out).unwrap();
        assert_eq!(picked, files[1]);

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("No file numbered 9"));
        assert!(shown.contains("CSV file not found: not-a-file.csv"));
    }

    #[test]
    fn choose_quits_and_handles_eof() {
        let files = vec![PathBuf::from("x.csv")];
        let mut out = Vec::new();
        let err = choose(&files, &mut io::Cursor::new("q\n"), &mut out).unwrap_err();
        assert_eq!(err.message(), "Canceled.");
        assert!(choose(&files, &mut io::Cursor::new(""), &mut out).is_err());
    }

    #[test]
    fn validate_rejects_non_csv() {
        let dir = fixture();
        assert!(validate_csv_path(&dir.path().join("notes.txt")).is_err());
        assert!(validate_csv_path(dir.path()).is_err());
        assert!(validate_csv_path(&dir.path().join("b.csv")).is_ok());
    }
}
