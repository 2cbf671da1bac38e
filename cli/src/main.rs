// Licensed under the Apache-2.0 license

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod commands;
mod config_file;

#[derive(Parser, Debug)]
#[command(
    name = "modgen",
    author,
    version,
    about = "Generate PSoC C code for PWM modulators and peripherals"
)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate modulator drivers from a modulator configuration
    Modulators {
        /// Path to a JSON or TOML modulator configuration
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Directory the header and source are written to
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Generate without writing any file
        #[arg(long)]
        check: bool,
    },

    /// Generate psoc_config.h/.c from a peripheral configuration
    Peripherals {
        /// Path to a JSON or TOML peripheral configuration
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Directory the header and source are written to
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Generate without writing any file
        #[arg(long)]
        check: bool,
    },

    /// Import PWM phases from a .modus design file
    Import {
        /// Path to the design file
        #[arg(short, long, value_name = "FILE")]
        design: PathBuf,

        /// Write the imported modulator here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init()?;

    match cli.command {
        Commands::Modulators {
            config,
            out_dir,
            check,
        } => commands::modulators(&config, &out_dir, check).map(|_| ()),
        Commands::Peripherals {
            config,
            out_dir,
            check,
        } => commands::peripherals(&config, &out_dir, check).map(|_| ()),
        Commands::Import { design, output } => {
            commands::import(&design, output.as_deref()).map(|_| ())
        }
    }
}
