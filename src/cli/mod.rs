use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "notas")]
#[command(
    version,
    about = "Export Brazilian brokerage notes (notas de corretagem) to Excel"
)]
#[command(
    long_about = "Read brokerage note PDFs (futures and stock notes from BTG, XP, Clear, Rico and other brokers), extract trades and fees, and write one worksheet per trading month."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to notas/config.toml in the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export notes to an Excel workbook (one sheet per month)
    #[command(group(ArgGroup::new("input").required(true).args(["paths", "dir"])))]
    Export {
        /// Note files (PDF, or .txt with the extracted text)
        paths: Vec<PathBuf>,

        /// Process every PDF in this folder
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output file (defaults to <name>_exportado.xlsx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a single CSV file instead of a workbook
        #[arg(long)]
        csv: bool,

        /// Extract and summarize only, don't write anything
        #[arg(long)]
        dry_run: bool,

        /// Divide prices printed without a decimal separator by 100
        #[arg(long)]
        fix_unscaled_prices: bool,
    },

    /// Show what gets extracted from a single note
    Inspect {
        /// Note file (PDF or .txt)
        file: PathBuf,

        /// Run only this extractor (futures, direct, basic)
        #[arg(short, long)]
        extractor: Option<String>,
    },

    /// Decompose a futures ticker (e.g. WINJ25, "WDO F25")
    Ticker {
        /// Contract code
        code: String,
    },
}
