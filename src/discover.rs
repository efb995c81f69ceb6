use anyhow::{bail, Result};
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

/// Returns the files matching `pattern`, sorted by path.
///
/// The final component of `pattern` may contain the wildcards `*` (any run of
/// characters), `?` (any one character) and `[...]` (one character from the
/// set, or not from it when the set starts with `!`). The directory part is
/// taken literally, and only files directly inside it are considered.
///
/// # Examples
///
/// ```no_run
/// # use booth_sales::find_files;
/// let files = find_files("exports/sales_*.csv").unwrap();
/// ```
///
/// # Errors
///
/// Returns an error if the directory part of `pattern` contains a wildcard.
pub fn find_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern_path = Path::new(pattern);
    let Some(name_pattern) = pattern_path.file_name().and_then(|n| n.to_str()) else {
        bail!("bad file pattern {pattern:?}: no file name");
    };
    let dir = pattern_path.parent().unwrap_or_else(|| Path::new(""));
    if dir.to_string_lossy().contains(['*', '?', '[']) {
        bail!("bad file pattern {pattern:?}: wildcards are only supported in the file name");
    }
    let matcher = wildcard_regex(name_pattern)?;

    let root = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    if !root.is_dir() {
        warn!(dir = %root.display(), "directory does not exist");
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| matcher.is_match(name))
        })
        .map(|entry| dir.join(entry.file_name()))
        .collect();
    files.sort();
    debug!(pattern, matched = files.len(), "found sales files");
    Ok(files)
}

/// Translates a file name wildcard into an anchored regular expression.
///
/// A `[` with no closing `]` matches itself.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut re, &chars[i + 1..end]);
                    i = end;
                }
                None => re.push_str(r"\["),
            },
            c => push_literal(&mut re, c),
        }
        i += 1;
    }
    re.push('$');
    Ok(Regex::new(&re)?)
}

/// Finds the `]` closing the class opened at `start`. A `]` right after the
/// opening `[` (or `[!`) is part of the set.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'!') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    chars[i.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| i + offset)
}

fn push_class(re: &mut String, set: &[char]) {
    re.push('[');
    let set = match set.split_first() {
        Some(('!', rest)) => {
            re.push('^');
            rest
        }
        _ => set,
    };
    for (n, &c) in set.iter().enumerate() {
        let is_range = c == '-' && n > 0 && n + 1 < set.len();
        if is_range {
            re.push('-');
        } else {
            push_literal(re, c);
        }
    }
    re.push(']');
}

fn push_literal(re: &mut String, c: char) {
    re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    #[test]
    fn find_files_fn_matches_only_the_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "sales_2023_02.csv",
                "sales_2023_01.csv",
                "other.csv",
                "sales_notes.txt",
            ],
        );
        fs::create_dir(dir.path().join("sales_dir.csv")).unwrap();
        let pattern = dir.path().join("sales_*.csv");
        let files = find_files(pattern.to_str().unwrap()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("sales_2023_01.csv"),
                dir.path().join("sales_2023_02.csv"),
            ]
        );
    }

    #[test]
    fn find_files_fn_supports_single_character_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sales_1.csv", "sales_12.csv"]);
        let pattern = dir.path().join("sales_?.csv");
        let files = find_files(pattern.to_str().unwrap()).unwrap();
        assert_eq!(files, vec![dir.path().join("sales_1.csv")]);
    }

    #[test]
    fn find_files_fn_supports_character_classes() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "sales_a.csv",
                "sales_b.csv",
                "sales_c.csv",
                "sales_1.csv",
            ],
        );
        let pattern = dir.path().join("sales_[ab].csv");
        let files = find_files(pattern.to_str().unwrap()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("sales_a.csv"),
                dir.path().join("sales_b.csv"),
            ]
        );
        let pattern = dir.path().join("sales_[!a-c].csv");
        let files = find_files(pattern.to_str().unwrap()).unwrap();
        assert_eq!(files, vec![dir.path().join("sales_1.csv")]);
    }

    #[test]
    fn wildcard_regex_fn_translates_classes() {
        let re = wildcard_regex("sales_[0-9][0-9].csv").unwrap();
        assert!(re.is_match("sales_07.csv"));
        assert!(!re.is_match("sales_7a.csv"));
        let re = wildcard_regex("[]x].csv").unwrap();
        assert!(re.is_match("].csv"));
        assert!(re.is_match("x.csv"));
        let re = wildcard_regex("[a-].csv").unwrap();
        assert!(re.is_match("-.csv"));
        assert!(!re.is_match("b.csv"));
    }

    #[test]
    fn wildcard_regex_fn_treats_unclosed_bracket_literally() {
        let re = wildcard_regex("sales_[a.csv").unwrap();
        assert!(re.is_match("sales_[a.csv"));
        assert!(!re.is_match("sales_a.csv"));
    }

    #[test]
    fn find_files_fn_treats_dots_literally() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sales.csv", "salesXcsv"]);
        let pattern = dir.path().join("sales.csv");
        let files = find_files(pattern.to_str().unwrap()).unwrap();
        assert_eq!(files, vec![dir.path().join("sales.csv")]);
    }

    #[test]
    fn find_files_fn_returns_nothing_for_missing_directory() {
        let files = find_files("testdata/no_such_dir/sales_*.csv").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn find_files_fn_finds_testdata_files() {
        let files = find_files("testdata/sales_*.csv").unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("testdata/sales_a.csv"),
                PathBuf::from("testdata/sales_b.csv"),
            ]
        );
    }

    #[test]
    fn find_files_fn_rejects_wildcard_directories() {
        assert!(find_files("exports_*/sales_*.csv").is_err());
        assert!(find_files("exports_[12]/sales_*.csv").is_err());
    }
}
