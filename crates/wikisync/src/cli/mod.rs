//! Command dispatcher for the wikisync CLI.

/// Clap argument definitions
mod args;

/// `diff` and `tags` commands (read-only comparison views)
mod diff;

/// `log` command (anchor and journal listing)
mod log;

/// `transfer` command (plan, confirm, execute)
mod transfer;

use std::path::PathBuf;

use clap::Parser;

use wikisync_core::config::SyncConfig;

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI. Returns false if the command failed.
pub fn run_cli() -> bool {
    let cli = Cli::parse();

    match cli.command {
        Commands::Diff { tag, json } => with_config(cli.config, |config| {
            diff::handle_diff(config, tag.as_deref(), json)
        }),

        Commands::Tags => with_config(cli.config, diff::handle_tags),

        Commands::Transfer {
            tag,
            summary,
            with_deletions,
            dry_run,
            yes,
        } => with_config(cli.config, |config| {
            transfer::handle_transfer(config, &tag, &summary, with_deletions, dry_run, yes)
        }),

        Commands::Log => with_config(cli.config, log::handle_log),

        Commands::Init {
            primary_root,
            client_root,
        } => handle_init(cli.config, primary_root, client_root),
    }
}

/// Load the config and run a handler with it
fn with_config<F>(override_path: Option<PathBuf>, f: F) -> bool
where
    F: FnOnce(&SyncConfig) -> bool,
{
    let config = match load_config(override_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!("  (run 'wikisync init <primary> <client>' first)");
            return false;
        }
    };
    f(&config)
}

fn load_config(override_path: Option<PathBuf>) -> Result<SyncConfig, String> {
    use wikisync_core::fs::RealFileSystem;

    match override_path {
        Some(path) => SyncConfig::load_from(&RealFileSystem, &path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e)),
        None => SyncConfig::load().map_err(|e| format!("Failed to load config: {}", e)),
    }
}

fn handle_init(
    override_path: Option<PathBuf>,
    primary_root: PathBuf,
    client_root: PathBuf,
) -> bool {
    use wikisync_core::fs::RealFileSystem;

    let config = SyncConfig::new(primary_root, client_root);

    let result = match &override_path {
        Some(path) => config.save_to(&RealFileSystem, path),
        None => config.save(),
    };

    match result {
        Ok(()) => {
            let shown = override_path
                .or_else(SyncConfig::config_path)
                .unwrap_or_default();
            println!("✓ Wrote config to {}", shown.display());
            true
        }
        Err(e) => {
            eprintln!("✗ Failed to write config: {}", e);
            false
        }
    }
}
