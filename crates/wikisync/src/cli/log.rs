//! CLI handler for the log command

use wikisync_core::address::TreeAddress;
use wikisync_core::config::SyncConfig;
use wikisync_core::fs::{FileSystem, RealFileSystem};
use wikisync_core::synclog::last_anchor;

/// Handle the log command: show the anchor and the recorded transfer runs
pub fn handle_log(config: &SyncConfig) -> bool {
    let fs = RealFileSystem;
    let client = TreeAddress::new(config.client_root.clone());
    let log_ns = config.log_namespace_id();

    let anchor = match last_anchor(&fs, &client, &log_ns) {
        Ok(anchor) => anchor,
        Err(e) => {
            eprintln!("✗ Failed to read log namespace: {}", e);
            return false;
        }
    };

    if anchor == 0 {
        println!("No transfer has been recorded yet (anchor is epoch).");
        return true;
    }

    println!("Last transfer: {}", format_ts(anchor));
    println!();

    let dir = client.namespace_dir(&log_ns);
    let entries = match fs.list_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("✗ Failed to list log namespace: {}", e);
            return false;
        }
    };

    let mut timestamps: Vec<i64> = entries
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|n| n.to_string_lossy().strip_suffix(".txt").map(str::to_string))
        .filter_map(|stem| stem.parse::<i64>().ok())
        .collect();
    timestamps.sort_unstable();

    println!("Recorded runs ({}):", timestamps.len());
    for ts in timestamps.iter().rev().take(10) {
        println!("  {}  ({}:{})", format_ts(*ts), log_ns, ts);
    }

    true
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
