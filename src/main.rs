//! Auth gateway configuration tool.
//!
//! ```text
//! auth-gateway-config sample [--indent N] [--secret S]   print a starter config
//! auth-gateway-config check [PATH]                       report invalid fields
//! auth-gateway-config secret [--length N]                print a cookie secret
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use auth_gateway::config::{
    generate_secret, read_config, SampleConfig, DEFAULT_CONFIG_FILE, DEFAULT_SECRET_LENGTH,
};
use auth_gateway::observability::logging::{init_logging, DEFAULT_FILTER};

#[derive(Parser)]
#[command(name = "auth-gateway-config", version, about = "Auth gateway configuration tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a sample configuration document.
    Sample {
        /// Spaces per indentation level.
        #[arg(long, default_value_t = 2)]
        indent: usize,

        /// Session cookie secret to embed instead of a generated one.
        #[arg(long)]
        secret: Option<String>,
    },
    /// Decode and validate a configuration file.
    Check {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
    /// Print a freshly generated session cookie secret.
    Secret {
        #[arg(long, default_value_t = DEFAULT_SECRET_LENGTH)]
        length: usize,
    },
}

fn main() -> ExitCode {
    init_logging(DEFAULT_FILTER);
    let cli = Cli::parse();

    match cli.command {
        Command::Sample { indent, secret } => {
            let sample = match secret {
                Some(secret) => SampleConfig::with_secret(secret),
                None => SampleConfig::generate(&mut rand::thread_rng()),
            };
            match sample.render(indent) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to render sample configuration");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Check { path } => {
            let config = match read_config(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read configuration");
                    return ExitCode::from(2);
                }
            };
            let invalid = config.check_consistency();
            if invalid.is_empty() {
                tracing::info!(path = %path.display(), revision = %config.revision, "Configuration is valid");
                return ExitCode::SUCCESS;
            }
            for field in &invalid {
                if config.is_ignored(field) {
                    println!("{field} (present but of unexpected type)");
                } else {
                    println!("{field}");
                }
            }
            tracing::error!(
                path = %path.display(),
                invalid = invalid.len(),
                "Configuration has invalid fields"
            );
            ExitCode::FAILURE
        }
        Command::Secret { length } => {
            println!("{}", generate_secret(&mut rand::thread_rng(), length));
            ExitCode::SUCCESS
        }
    }
}
