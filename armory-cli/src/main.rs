use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod report;

use armory_core::compat::region::LocalFlagEngine;
use armory_core::mechanics;
use armory_core::{
    probe, DirArchive, EquipmentCompat, HostBootstrap, HostInfo, RegionCompat, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "armory")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Armory - compatibility and extension host inspector")]
struct Args {
    /// Load settings from a specific file instead of ~/.armory/config.toml
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a reported host version string into a version tag
    Probe {
        /// The version string as the host reports it
        version: String,

        /// Server brand to attribute the report to
        #[arg(long, default_value = "Paper")]
        brand: String,
    },
    /// Scan an extension bundle directory and report the outcome
    Scan {
        /// Bundle root directory
        bundle: PathBuf,

        /// Extra simple names to denylist, comma separated
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the full startup sequence against a bundle and report what bound
    Bootstrap {
        /// Bundle root directory
        bundle: PathBuf,

        /// The version string as the host reports it
        version: String,
    },
}

fn main() -> Result<()> {
    setup_tracing()?;

    let args = Args::parse();
    let settings = load_settings(args.settings.as_deref())?;

    match args.command {
        Command::Probe { version, brand } => {
            let tag = probe(&HostInfo::new(brand, version))?;
            println!("{tag}");
            Ok(())
        }
        Command::Scan {
            bundle,
            exclude,
            json,
        } => {
            let mut excluded = settings.scanner.excluded_names.clone();
            excluded.extend(exclude);

            let archive = DirArchive::new(bundle);
            let result = armory_core::scan(&archive, &mechanics::builtin_units(), &excluded)?;
            report::print_scan(&result, json)
        }
        Command::Bootstrap { bundle, version } => {
            let engine = Arc::new(LocalFlagEngine::new());
            let bootstrap =
                HostBootstrap::new(settings, HostInfo::new("Paper", version), engine);
            let host = bootstrap.bootstrap(&DirArchive::new(bundle))?;

            println!("host version: {}", host.version);
            println!("equipment adapter: {}", host.equipment.target());
            println!(
                "region engine installed: {}",
                host.region.is_installed()
            );
            report::print_scan(&host.scan_report, false)
        }
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings> {
    if let Some(path) = path {
        return Settings::load(path);
    }

    let default = dirs::home_dir().map(|home| home.join(".armory").join("config.toml"));
    match default {
        Some(path) if path.is_file() => {
            info!(path = %path.display(), "loading settings");
            Settings::load(&path)
        }
        _ => Ok(Settings::default()),
    }
}

fn setup_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
