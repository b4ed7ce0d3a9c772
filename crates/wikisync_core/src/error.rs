use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for wikisync operations
#[derive(Debug, Error)]
pub enum SyncError {
    // IO errors
    /// Generic IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A specific file could not be read
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        /// The file that failed
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A specific file could not be written
    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        /// The file that failed
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    // Scan errors
    /// The scan root is missing or not a directory
    #[error("Scan root '{0}' does not exist or is not a directory")]
    ScanRoot(PathBuf),

    // Client tree errors
    /// The client tree failed the preflight check
    #[error("Client tree at '{path}' is not usable: {reason}")]
    ClientRoot {
        /// Root of the rejected client tree
        path: PathBuf,
        /// Human-readable cause
        reason: String,
    },

    /// Another run holds the client tree lock
    #[error("Another transfer run holds the lock '{0}'")]
    Locked(PathBuf),

    /// The run timestamp does not advance past the last recorded transfer
    #[error("Run timestamp {now} does not advance past the last recorded transfer at {anchor}")]
    RunTimestamp {
        /// Timestamp of the rejected run
        now: i64,
        /// The sync anchor it failed to advance past
        anchor: i64,
    },

    // Changelog errors
    /// A changelog line did not parse
    #[error("Malformed changelog line: '{0}'")]
    ChangelogLine(String),

    // Config errors
    /// The config file did not parse as TOML
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// No per-user config directory could be determined
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// The log namespace setting is empty
    #[error("The log namespace is not configured")]
    NoLogNamespace,
}

/// Result type alias for wikisync operations
pub type Result<T> = std::result::Result<T, SyncError>;
