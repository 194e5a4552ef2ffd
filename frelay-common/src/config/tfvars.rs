//! Terraform `.tfvars` loader for local runs.
//!
//! The deployed job receives its settings through the environment that the
//! infrastructure module renders from `terraform.tfvars`. For local runs the
//! same file is read directly and its lowercase keys are mapped onto the
//! environment variable names (`sftp_host` -> `SFTP_HOST`).

use super::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Topic used when a local run does not name a real one.
pub const LOCAL_TOPIC_ARN: &str = "arn:aws:sns:us-east-2:123456789012:sftp-sync-notifications";

/// Parse `key = "value"` assignments. Other lines are ignored.
pub fn parse_tfvars(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    let assign_re = Regex::new(r#"^([^=]+)=\s*"([^"]+)""#).map_err(|source| {
        ConfigError::Pattern {
            what: "tfvars assignment",
            source,
        }
    })?;

    let mut vars = HashMap::new();
    for line in content.lines() {
        let Some(caps) = assign_re.captures(line) else {
            continue;
        };
        let key = caps[1].trim();
        if key.is_empty() || key.starts_with('#') {
            continue;
        }
        vars.insert(key.to_string(), caps[2].to_string());
    }
    Ok(vars)
}

/// Map Terraform variable names onto environment variable names.
///
/// Inserts [`LOCAL_TOPIC_ARN`] when no topic is configured.
pub fn to_env_overrides(vars: HashMap<String, String>) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = vars
        .into_iter()
        .map(|(key, value)| (key.to_ascii_uppercase(), value))
        .collect();
    env.entry("SNS_TOPIC_ARN".to_string())
        .or_insert_with(|| LOCAL_TOPIC_ARN.to_string());
    env
}

/// Read a `.tfvars` file and return environment overrides.
pub fn load_tfvars(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(to_env_overrides(parse_tfvars(&content)?))
}
