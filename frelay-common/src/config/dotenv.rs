//! `.env` file support for local runs.

use super::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Parse `KEY=VALUE` lines.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is allowed
/// and a single pair of surrounding quotes is stripped from the value.
pub fn parse_dotenv(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    let line_re = Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$")
        .map_err(|source| ConfigError::Pattern {
            what: "dotenv line",
            source,
        })?;

    let mut vars = HashMap::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(caps) = line_re.captures(line) else {
            continue;
        };
        let value = unquote(&caps[2]);
        if value.is_empty() {
            continue;
        }
        vars.insert(caps[1].to_string(), value.to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Read a `.env` file.
pub fn load_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dotenv(&content)
}
