//! Target list assembly

use crate::error::ConfigError;
use std::path::Path;

/// One URL per line; surrounding whitespace trimmed, blank lines dropped
pub fn parse_target_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Targets from the list file (in file order) followed by the single URL
pub fn load_targets(url: Option<&str>, list: Option<&Path>) -> Result<Vec<String>, ConfigError> {
    if url.is_none() && list.is_none() {
        return Err(ConfigError::NoTargets);
    }

    let mut targets = match list {
        Some(path) => {
            let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetList {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            parse_target_list(&contents)
        }
        None => Vec::new(),
    };

    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        targets.push(url.to_string());
    }

    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    Ok(targets)
}
