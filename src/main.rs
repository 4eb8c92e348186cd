use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pc_signature::config::Config;
use pc_signature::{
    IdentifierGenerator, Inventory, InventorySnapshot, SignatureIssuer, SignatureValidator,
    Strategy, SystemInventory, Verdict,
};

#[derive(Debug, Parser)]
#[command(name = "pcsig", version, about = "Hardware-bound machine signatures")]
struct Cli {
    /// Configuration file (default: ~/.pcsig/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read hardware from an inventory snapshot instead of this machine
    #[arg(long, global = true)]
    inventory: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the signature of this machine
    Issue {
        #[arg(short, long)]
        strategy: Option<Strategy>,
    },
    /// Check a signature against this machine
    Validate { signature: String },
    /// List the identifiers of this machine
    Identifiers {
        #[arg(short, long)]
        strategy: Option<Strategy>,
    },
    /// Dump the hardware inventory as TOML
    Inventory {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let inventory: Box<dyn Inventory> = match cli.inventory.clone().or(config.inventory_file.clone()) {
        Some(path) => {
            info!("📄 Using inventory snapshot {:?}", path);
            Box::new(InventorySnapshot::load(&path)?)
        }
        None => Box::new(SystemInventory::new()),
    };

    match cli.command {
        Command::Issue { strategy } => {
            let strategy = strategy.unwrap_or(config.default_strategy);
            let generator = IdentifierGenerator::new(inventory);
            match SignatureIssuer::issue(&generator, strategy) {
                Ok(signature) => println!("{}", signature),
                Err(e) => {
                    error!("❌ Failed to issue a {} signature: {}", strategy, e);
                    std::process::exit(1);
                }
            }
        }
        Command::Validate { signature } => {
            let generator = IdentifierGenerator::new(inventory);
            let verdict = match SignatureValidator::validate(&generator, &signature) {
                Ok(verdict) => verdict,
                Err(e) => {
                    error!("❌ Cannot validate '{}': {}", signature.trim(), e);
                    std::process::exit(2);
                }
            };
            println!("{}", verdict);
            match verdict {
                Verdict::LicenseOk => info!("✅ Signature matches this machine"),
                Verdict::IdentifiersMismatch => {
                    warn!("🚫 Signature was issued for different hardware");
                    std::process::exit(1);
                }
                Verdict::LicenseMalformed => {
                    warn!("🚫 Signature is malformed");
                    std::process::exit(2);
                }
            }
        }
        Command::Identifiers { strategy } => {
            let strategy = strategy.unwrap_or(config.default_strategy);
            let generator = IdentifierGenerator::new(inventory);
            let identifiers = generator
                .generate_all(strategy)
                .with_context(|| format!("Failed to generate {} identifiers", strategy))?;
            if identifiers.is_empty() {
                warn!("No identifiers for strategy {}", strategy);
            }
            for identifier in identifiers {
                println!("{}", identifier);
            }
        }
        Command::Inventory { output } => {
            let snapshot = InventorySnapshot::capture(&inventory)
                .context("Failed to read hardware inventory")?;
            match output {
                Some(path) => {
                    snapshot.save(&path)?;
                    info!("✅ Inventory written to {:?}", path);
                }
                None => print!("{}", snapshot.to_toml()?),
            }
        }
    }

    Ok(())
}
