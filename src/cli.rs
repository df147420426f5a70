use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::config::{load_rules_file, Config};
use crate::masking::{DataMasker, FieldConfig, FieldSet, RuleTable, UnmaskScope};

#[derive(Parser)]
#[command(name = "datamask-core")]
#[command(about = "Datamask - masks and restores sensitive JSON fields", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mask sensitive fields of a JSON document
    Mask {
        /// Field names masked with the default rule
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// JSON file of per-field rules
        #[arg(short, long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Input document (stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Restore masked fields of a JSON document
    Unmask {
        /// Field names to restore
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Restore every masked value regardless of field name
        #[arg(long, conflicts_with = "fields")]
        everywhere: bool,

        /// Input document (stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Configuration validation
    Config,
}

pub fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn render(value: &serde_json::Value, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn explicit_rules(config: &Config, rules: Option<&Path>) -> anyhow::Result<RuleTable> {
    let mut table = RuleTable::new();
    if let Some(path) = config.rules_file.as_deref() {
        table = table.merged(load_rules_file(path)?);
    }
    if let Some(path) = rules {
        table = table.merged(load_rules_file(path)?);
    }
    Ok(table)
}

pub fn handle_mask(
    masker: &DataMasker,
    config: &Config,
    fields: &[String],
    rules: Option<&Path>,
    document: &str,
    pretty: bool,
) -> anyhow::Result<String> {
    let names: Vec<String> = config.fields.iter().chain(fields).cloned().collect();
    let table = masker
        .resolve(&FieldConfig::Names(names))
        .merged(explicit_rules(config, rules)?);

    if table.is_empty() {
        anyhow::bail!("No fields to mask. Pass --fields, --rules or set DATAMASK_FIELDS");
    }

    let tree = serde_json::from_str(document).context("input is not valid JSON")?;
    tracing::info!(
        fields = table.len(),
        default_rule = ?masker.template(),
        "Masking document"
    );
    let masked = masker.mask_with_rules(tree, &table)?;
    render(&masked, pretty)
}

pub fn handle_unmask(
    masker: &DataMasker,
    config: &Config,
    fields: &[String],
    everywhere: bool,
    document: &str,
    pretty: bool,
) -> anyhow::Result<String> {
    let scope = if everywhere {
        UnmaskScope::Everywhere
    } else {
        let mut names: Vec<String> = config.fields.iter().chain(fields).cloned().collect();
        names.extend(
            explicit_rules(config, None)?
                .iter()
                .map(|(name, _)| name.to_string()),
        );
        let field_set: FieldSet = names.into_iter().collect();
        if field_set.is_empty() {
            anyhow::bail!("No fields to unmask. Pass --fields or --everywhere");
        }
        UnmaskScope::Fields(field_set)
    };

    let tree = serde_json::from_str(document).context("input is not valid JSON")?;
    tracing::info!(everywhere, "Unmasking document");
    let restored = masker.unmask_value(tree, &scope)?;
    render(&restored, pretty)
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    if let Some(path) = config.rules_file.as_deref() {
        load_rules_file(path)?;
    }

    println!("Configuration:");
    println!("  Log Format: {:?}", config.log_format);
    println!(
        "  Default Rule: left={} right={} email_aware={}",
        config.default_rule.left_visible(),
        config.default_rule.right_visible(),
        config.default_rule.email_aware()
    );
    println!("  Fields: {}", config.fields.join(","));
    match &config.rules_file {
        Some(path) => println!("  Rules File: {}", path.display()),
        None => println!("  Rules File: (none)"),
    }

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}
