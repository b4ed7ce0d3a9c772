//! Host-native changelog line codec.
//!
//! Both trees keep tab-separated changelog files that the host wiki's own
//! tooling can read. One line per revision:
//!
//! ```text
//! <timestamp>\t<ip>\t<op>\t<id>\t<user>\t<summary>\t<extra>
//! ```
//!
//! The transfer engine appends lines in exactly this shape so the client
//! tree's history stays independently readable.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::id::Id;

/// Origin marker used for lines written by a transfer run
pub const TRANSFER_ORIGIN: &str = "0.0.0.0";

/// Summary prefix marking a revision as an export from the primary wiki
pub const SUMMARY_PREFIX: &str = "export from primary wiki: ";

/// Revision operation codes used by the host changelog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// Page created
    Create,
    /// Page edited
    Edit,
    /// Minor edit
    MinorEdit,
    /// Page deleted
    Delete,
    /// Edit reverted
    Revert,
}

impl ChangeOp {
    /// Single-character code as stored in the changelog
    pub fn code(self) -> &'static str {
        match self {
            ChangeOp::Create => "C",
            ChangeOp::Edit => "E",
            ChangeOp::MinorEdit => "e",
            ChangeOp::Delete => "D",
            ChangeOp::Revert => "R",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(ChangeOp::Create),
            "E" => Some(ChangeOp::Edit),
            "e" => Some(ChangeOp::MinorEdit),
            "D" => Some(ChangeOp::Delete),
            "R" => Some(ChangeOp::Revert),
            _ => None,
        }
    }
}

/// One parsed changelog line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    /// Unix timestamp of the revision
    pub timestamp: i64,
    /// Origin address (`0.0.0.0` for transfer-written lines)
    pub ip: String,
    /// Operation kind
    pub op: ChangeOp,
    /// Affected identifier
    pub id: Id,
    /// Author, empty for transfer-written lines
    pub user: String,
    /// Edit summary
    pub summary: String,
    /// Trailing extra field, usually empty
    pub extra: String,
}

impl ChangeEntry {
    /// Build the line a transfer run appends for one replaced artifact
    pub fn transfer_edit(timestamp: i64, id: Id, summary: &str) -> Self {
        Self {
            timestamp,
            ip: TRANSFER_ORIGIN.to_string(),
            op: ChangeOp::Edit,
            id,
            user: String::new(),
            summary: format!("{SUMMARY_PREFIX}{summary}"),
            extra: String::new(),
        }
    }

    /// Build the line a transfer run appends for one propagated deletion
    pub fn transfer_delete(timestamp: i64, id: Id, summary: &str) -> Self {
        Self {
            timestamp,
            ip: TRANSFER_ORIGIN.to_string(),
            op: ChangeOp::Delete,
            id,
            user: String::new(),
            summary: format!("{SUMMARY_PREFIX}{summary}"),
            extra: String::new(),
        }
    }

    /// Parse one changelog line (with or without trailing newline)
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches('\n');
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 || fields.len() > 7 {
            return Err(SyncError::ChangelogLine(line.to_string()));
        }

        let timestamp = fields[0]
            .parse::<i64>()
            .map_err(|_| SyncError::ChangelogLine(line.to_string()))?;
        let op = ChangeOp::from_code(fields[2])
            .ok_or_else(|| SyncError::ChangelogLine(line.to_string()))?;

        Ok(Self {
            timestamp,
            ip: fields[1].to_string(),
            op,
            id: Id::new(fields[3]),
            user: fields[4].to_string(),
            summary: fields[5].to_string(),
            extra: fields.get(6).unwrap_or(&"").to_string(),
        })
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.timestamp,
            self.ip,
            self.op.code(),
            self.id,
            self.user,
            self.summary,
            self.extra
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_edit_line_round_trip() {
        let entry = ChangeEntry::transfer_edit(1700000000, Id::new("a:one"), "october release");
        let line = entry.to_string();
        let parsed = ChangeEntry::parse(&line).unwrap();

        assert_eq!(parsed.timestamp, 1700000000);
        assert_eq!(parsed.ip, "0.0.0.0");
        assert_eq!(parsed.op, ChangeOp::Edit);
        assert_eq!(parsed.id, Id::new("a:one"));
        assert_eq!(parsed.user, "");
        assert_eq!(parsed.summary, "export from primary wiki: october release");
        assert_eq!(parsed.extra, "");
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_parse_delete_line() {
        let parsed = ChangeEntry::parse("100\t10.0.0.1\tD\tb:old\tadmin\tremoved\t\n").unwrap();
        assert_eq!(parsed.op, ChangeOp::Delete);
        assert_eq!(parsed.id, Id::new("b:old"));
        assert_eq!(parsed.timestamp, 100);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ChangeEntry::parse("not a changelog line").is_err());
        assert!(ChangeEntry::parse("abc\t0.0.0.0\tE\ta\t\ts\t").is_err());
        assert!(ChangeEntry::parse("100\t0.0.0.0\tX\ta\t\ts\t").is_err());
    }

    #[test]
    fn test_line_has_tab_separated_fields() {
        let entry = ChangeEntry::transfer_edit(42, Id::new("x"), "s");
        let line = entry.to_string();
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(
            fields,
            vec!["42", "0.0.0.0", "E", "x", "", "export from primary wiki: s", ""]
        );
    }
}
