//! Command dispatcher: routes parsed clap commands to their handlers.

mod export;
mod inspect;
mod ticker;

use anyhow::Result;
use tracing::debug;

use crate::batch::InputSelection;
use crate::cli::{Cli, Commands};
use crate::config::Config;

pub use export::ExportRequest;

/// Route a parsed command line to its handler
pub fn dispatch_command(cli: Cli) -> Result<()> {
    let json_output = cli.json;

    let config = Config::load(cli.config.as_deref())?;
    debug!("Extractor order: {}", config.extractors.join(", "));

    match cli.command {
        Commands::Export {
            paths,
            dir,
            output,
            csv,
            dry_run,
            fix_unscaled_prices,
        } => {
            let selection = match dir {
                Some(dir) => InputSelection::Folder(dir),
                None => InputSelection::Files(paths),
            };
            let request = ExportRequest {
                selection,
                output,
                csv,
                dry_run,
                fix_unscaled_prices,
            };
            export::dispatch_export(request, &config, json_output)
        }
        Commands::Inspect { file, extractor } => {
            inspect::dispatch_inspect(&file, extractor.as_deref(), &config, json_output)
        }
        Commands::Ticker { code } => ticker::dispatch_ticker(&code, &config, json_output),
    }
}
