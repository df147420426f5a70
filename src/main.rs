use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // for .with() on registry

use datamask_core::cli::{self, Cli, Commands};
use datamask_core::config::{Config, LogFormat};
use datamask_core::DataMasker;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let cli = Cli::parse();

    // Setup logging on stderr; stdout carries the document
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    // The cryptographic transform is supplied by library callers; the CLI
    // runs with the identity pair.
    let masker = DataMasker::default().with_template(config.default_rule);

    match cli.command {
        Commands::Mask {
            fields,
            rules,
            input,
            pretty,
        } => {
            let document = cli::read_input(input.as_deref())?;
            let output = cli::handle_mask(
                &masker,
                &config,
                &fields,
                rules.as_deref(),
                &document,
                pretty,
            )?;
            println!("{}", output);
        }
        Commands::Unmask {
            fields,
            everywhere,
            input,
            pretty,
        } => {
            let document = cli::read_input(input.as_deref())?;
            let output =
                cli::handle_unmask(&masker, &config, &fields, everywhere, &document, pretty)?;
            println!("{}", output);
        }
        Commands::Config => cli::handle_config_validate(&config)?,
    }

    Ok(())
}
