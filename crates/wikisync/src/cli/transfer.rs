//! CLI handler for the transfer command

use std::io::Write;

use wikisync_core::config::SyncConfig;
use wikisync_core::fs::RealFileSystem;
use wikisync_core::relations::BodyMediaRelations;
use wikisync_core::scan::TreeScanner;
use wikisync_core::tags::{BodyTagIndex, TagIndex};
use wikisync_core::transfer::{PageAction, TransferEngine, TransferPlan};

/// Handle the transfer command
pub fn handle_transfer(
    config: &SyncConfig,
    tag: &str,
    summary: &str,
    with_deletions: bool,
    dry_run: bool,
    yes: bool,
) -> bool {
    let scanner = TreeScanner::new(RealFileSystem);
    let primary = match scanner.scan(&config.primary_root.join("pages"), &config.scan_exclusions())
    {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("✗ Failed to scan primary tree: {}", e);
            return false;
        }
    };

    let index = match BodyTagIndex::build(&RealFileSystem, &primary) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("✗ Failed to read page tags: {}", e);
            return false;
        }
    };
    let selected = match index.pages_tagged(tag) {
        Ok(selected) => selected,
        Err(e) => {
            eprintln!("✗ Failed to resolve tag '{}': {}", tag, e);
            return false;
        }
    };

    if selected.is_empty() && !with_deletions {
        println!("No pages carry the tag '{}'; nothing to do.", tag);
        return true;
    }

    let engine = TransferEngine::new(RealFileSystem, config.clone());
    let plan = match engine.prepare(&selected, with_deletions) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("✗ Failed to plan transfer: {}", e);
            return false;
        }
    };

    print_plan(tag, &plan);

    if plan.is_noop() {
        println!("Client tree is already up to date for this tag.");
        return true;
    }

    if dry_run {
        println!("(dry run - no changes made)");
        return true;
    }

    if !yes && !confirm() {
        println!("Aborted.");
        return true;
    }

    let relations = BodyMediaRelations::new(RealFileSystem);
    let now = chrono::Utc::now().timestamp();

    match engine.execute(&plan, &relations, summary, now) {
        Ok(stats) => {
            println!("✓ {}", stats);
            for failure in &stats.failures {
                eprintln!("  ✗ {}: {}", failure.id, failure.error);
            }
            stats.failures.is_empty()
        }
        Err(e) => {
            eprintln!("✗ Transfer failed: {}", e);
            false
        }
    }
}

fn print_plan(tag: &str, plan: &TransferPlan) {
    println!("Transfer Plan");
    println!("=============");
    println!("Tag: {}", tag);
    println!("Anchor: {}", plan.anchor);
    println!();

    for page in &plan.pages {
        match page.action {
            PageAction::Replace => println!("  replace   {}", page.id),
            PageAction::Unchanged => println!("  unchanged {}", page.id),
        }
    }
    for id in &plan.deletions {
        println!("  delete    {}", id);
    }
    println!();
}

fn confirm() -> bool {
    print!("Transfer files now? [y/N] ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}
