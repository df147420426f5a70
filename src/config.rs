use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::masking::{MaskingRule, RuleTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_format: LogFormat,
    /// Rule given to fields named without an explicit rule.
    pub default_rule: MaskingRule,
    pub fields: Vec<String>,
    pub rules_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_format = match lookup("DATAMASK_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!(
                "DATAMASK_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ),
        };

        let left = lookup("DATAMASK_DEFAULT_LEFT_VISIBLE")
            .map(|v| v.trim().parse::<usize>())
            .transpose()
            .context("DATAMASK_DEFAULT_LEFT_VISIBLE must be a non-negative integer")?
            .unwrap_or(0);
        let right = lookup("DATAMASK_DEFAULT_RIGHT_VISIBLE")
            .map(|v| v.trim().parse::<usize>())
            .transpose()
            .context("DATAMASK_DEFAULT_RIGHT_VISIBLE must be a non-negative integer")?
            .unwrap_or(4);
        let email_aware = lookup("DATAMASK_DEFAULT_EMAIL_AWARE")
            .map(|v| v.trim().parse::<bool>())
            .transpose()
            .context("DATAMASK_DEFAULT_EMAIL_AWARE must be 'true' or 'false'")?
            .unwrap_or(false);

        Ok(Config {
            log_format,
            default_rule: MaskingRule::new(left, right).with_email_aware(email_aware),
            fields: lookup("DATAMASK_FIELDS")
                .map(|raw| parse_field_list(&raw))
                .unwrap_or_default(),
            rules_file: lookup("DATAMASK_RULES_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Splits a comma separated list of field names, dropping blanks.
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

/// Reads a JSON object of `{ "<field>": <rule> }`.
pub fn load_rules_file(path: &Path) -> Result<RuleTable> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    let table: RuleTable = serde_json::from_str(&raw)
        .with_context(|| format!("invalid rules file {}", path.display()))?;
    tracing::debug!(path = %path.display(), fields = table.len(), "loaded masking rules");
    Ok(table)
}
