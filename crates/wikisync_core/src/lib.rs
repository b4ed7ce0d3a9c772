#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Artifact path resolution
pub mod address;

/// Host-native changelog line codec
pub mod changelog;

/// Configuration options
pub mod config;

/// Deletion detection against the primary's global changelog
pub mod deletions;

/// Divergence detection between the two trees
pub mod diff;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// Content identifiers
pub mod id;

/// Run-scoped client tree lock
pub mod lock;

/// Page to media relation extraction
pub mod relations;

/// Content tree scanning
pub mod scan;

/// Transfer journal and sync anchor
pub mod synclog;

/// Tag index (which pages carry which tag)
pub mod tags;

/// Transfer engine (plan and execute a run)
pub mod transfer;
