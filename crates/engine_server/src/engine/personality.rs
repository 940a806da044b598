//! Rodent personality files.
//!
//! A personality file is a plain text list of `setoption name <N> value <V>`
//! lines. Blank lines and lines starting with `;` or `#` are comments; any
//! other line is ignored.

use std::path::{Path, PathBuf};

const SETOPTION_PREFIX: &str = "setoption name ";
const VALUE_SEPARATOR: &str = " value ";

/// Reads personality files into `(option name, option value)` pairs.
pub struct PersonalityFileLoader;

impl PersonalityFileLoader {
    /// Parses personality text. Options without a value (buttons) get an
    /// empty value.
    pub fn parse(text: &str) -> Vec<(String, String)> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(';') && !line.starts_with('#'))
            .filter_map(Self::parse_line)
            .collect()
    }

    fn parse_line(line: &str) -> Option<(String, String)> {
        let prefix = line.get(..SETOPTION_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(SETOPTION_PREFIX) {
            return None;
        }
        let rest = &line[SETOPTION_PREFIX.len()..];

        // Option names may contain spaces; the value starts after the first " value ".
        let split_at = rest.to_ascii_lowercase().find(VALUE_SEPARATOR);
        let (name, value) = match split_at {
            Some(index) => (&rest[..index], &rest[index + VALUE_SEPARATOR.len()..]),
            None => (rest, ""),
        };

        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), value.trim().to_string()))
    }

    /// Resolves `file` against `dir` unless it is absolute.
    pub fn resolve(file: &Path, dir: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            dir.join(file)
        }
    }

    /// Loads and parses a personality file.
    pub async fn load(file: &Path, dir: &Path) -> std::io::Result<Vec<(String, String)>> {
        let path = Self::resolve(file, dir);
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&text))
    }

    /// Formats a parsed pair back into an engine command.
    pub fn to_command(name: &str, value: &str) -> String {
        if value.is_empty() {
            format!("setoption name {}", name)
        } else {
            format!("setoption name {} value {}", name, value)
        }
    }
}
