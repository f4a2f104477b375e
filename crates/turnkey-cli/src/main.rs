//! Solver TurnKey CLI - packaging and smoke-test tool for native bundles.
//!
//! - `bundle` repacks an upstream release archive into the layout the core
//!   crate embeds at build time
//! - `probe` loads the embedded libraries and asks the engine for its version
//! - `platform` shows how the running host maps onto the platform matrix

mod bundle;
mod probe;

use anyhow::Result;
use clap::{Parser, Subcommand};
use solver_turnkey::{HostInfo, LibrarySet, Platform};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "turnkey", version)]
#[command(about = "Bundle and smoke-test native solver libraries")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the engine and shim from an upstream release archive
    Bundle {
        /// Upstream release ZIP, e.g. z3-4.8.9-x64-ubuntu-16.04.zip
        #[arg(long)]
        archive: PathBuf,

        /// Target platform as <os>-<arch> (defaults to the archive's distribution tag)
        #[arg(long)]
        platform: Option<Platform>,

        /// Bundle root; libraries land in <out>/native/<os>-<arch>/
        #[arg(long)]
        out: PathBuf,

        /// Logical name of the engine library
        #[arg(long, default_value = LibrarySet::DEFAULT_ENGINE)]
        engine: String,

        /// Logical name of the binding shim
        #[arg(long, default_value = LibrarySet::DEFAULT_SHIM)]
        shim: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the embedded libraries and report the engine version
    Probe {
        /// Fail unless the engine's full version contains this string
        #[arg(long)]
        expect_version: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the detected host and the platform it maps to
    Platform,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; stdout is reserved for command output.
    // RUST_LOG takes precedence over --debug.
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Bundle {
            archive,
            platform,
            out,
            engine,
            shim,
            json,
        } => {
            let libraries = LibrarySet::new(engine, shim);
            let bundled = bundle::bundle(&archive, platform, &libraries, &out)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bundled)?);
            } else {
                for library in &bundled {
                    println!("{} -> {}", library.source, library.path.display());
                }
            }
        }
        Command::Probe {
            expect_version,
            json,
        } => {
            let report = probe::probe(solver_turnkey::global(), expect_version.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} ({})", report.full_version, report.platform);
            }
        }
        Command::Platform => {
            let host = HostInfo::detect();
            println!("os:   {}", host.os_name);
            println!("arch: {}", host.arch);
            let platform = host.identify()?;
            println!("platform: {}", platform);
        }
    }

    Ok(())
}
