//! CLI handlers for the read-only comparison views

use wikisync_core::config::SyncConfig;
use wikisync_core::diff::{divergences, Divergence, DivergenceReason};
use wikisync_core::fs::RealFileSystem;
use wikisync_core::scan::TreeScanner;
use wikisync_core::tags::{BodyTagIndex, TagIndex};

/// Handle the diff command
pub fn handle_diff(config: &SyncConfig, tag: Option<&str>, json: bool) -> bool {
    let scanner = TreeScanner::new(RealFileSystem);
    let exclusions = config.scan_exclusions();

    let primary = match scanner.scan(&config.primary_root.join("pages"), &exclusions) {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("✗ Failed to scan primary tree: {}", e);
            return false;
        }
    };
    let client = match scanner.scan(&config.client_root.join("pages"), &exclusions) {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("✗ Failed to scan client tree: {}", e);
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

    let mut divs = divergences(&primary, &client);

    if let Some(tag) = tag {
        let tagged = match index.pages_tagged(tag) {
            Ok(tagged) => tagged,
            Err(e) => {
                eprintln!("✗ Failed to resolve tag '{}': {}", tag, e);
                return false;
            }
        };
        divs.retain(|d| tagged.contains(&d.id));
    }

    if json {
        match serde_json::to_string_pretty(&divs) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("✗ Failed to serialize listing: {}", e);
                return false;
            }
        }
        return true;
    }

    if divs.is_empty() {
        println!("No differences between the two trees.");
        return true;
    }

    println!(
        "{:<40} {:<24} {:<17} {:<17} {}",
        "Page", "Tags", "Primary", "Client", "Reason"
    );
    for d in &divs {
        let tags: Vec<String> = index.tags_for(&d.id).into_iter().collect();
        println!(
            "{:<40} {:<24} {:<17} {:<17} {}",
            d.id.to_string(),
            tags.join(", "),
            format_mtime(d.primary_mtime),
            format_mtime(d.client_mtime),
            reason_label(d),
        );
    }
    println!();
    println!("{} pages differ.", divs.len());

    true
}

/// Handle the tags command
pub fn handle_tags(config: &SyncConfig) -> bool {
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

    match index.all_tags() {
        Ok(tags) if tags.is_empty() => {
            println!("No tagged pages in the primary tree.");
            true
        }
        Ok(tags) => {
            for (tag, count) in tags {
                println!("{} ({})", tag, count);
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Failed to list tags: {}", e);
            false
        }
    }
}

fn format_mtime(mtime: Option<i64>) -> String {
    match mtime.and_then(|t| chrono::DateTime::from_timestamp(t, 0)) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn reason_label(d: &Divergence) -> &'static str {
    match d.reason {
        DivergenceReason::MissingInClient => "missing in client",
        DivergenceReason::MissingInPrimary => "missing in primary",
        DivergenceReason::Modified => "content differs",
    }
}
