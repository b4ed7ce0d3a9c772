//! Transfer engine: apply a selected set of identifiers to the client tree.
//!
//! A run is split into an explicit plan phase and an execute phase, so a
//! caller can show the operator what will happen before anything is written:
//!
//! 1. [`TransferEngine::prepare`] computes the sync anchor from the log
//!    namespace *before* this run writes anything, resolves pending
//!    deletions against it, and content-hash-filters the selected pages.
//! 2. [`TransferEngine::execute`] applies deletions first (so this run's own
//!    log page cannot hide them from the next run's anchor), then page
//!    transfers with their media, journaling every artifact as it lands.
//!
//! Per-identifier failures are isolated: one bad file is recorded in the
//! stats and the rest of the run continues.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;

use crate::address::{ArtifactKind, TreeAddress};
use crate::changelog::ChangeEntry;
use crate::config::SyncConfig;
use crate::deletions::{deletions_since, FileChangeProvider};
use crate::diff::content_equal;
use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;
use crate::lock::RunLock;
use crate::relations::MediaRelations;
use crate::synclog::{last_anchor, SyncLog};

/// What a run decided to do with one selected page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    /// Content differs, page will be copied
    Replace,
    /// Content-hash equal, nothing to do
    Unchanged,
}

/// One selected page with its planned action
#[derive(Debug, Clone, Serialize)]
pub struct PlannedPage {
    /// The page identifier
    pub id: Id,
    /// What will happen to it
    pub action: PageAction,
}

/// Everything a run will do, computed before anything is written
#[derive(Debug, Clone, Serialize)]
pub struct TransferPlan {
    /// Sync anchor at preparation time (log state before this run)
    pub anchor: i64,
    /// Selected pages with their hash-filtered actions
    pub pages: Vec<PlannedPage>,
    /// Deletions to propagate, in changelog order (empty when disabled)
    pub deletions: Vec<Id>,
}

impl TransferPlan {
    /// True if executing this plan would not touch the client tree
    pub fn is_noop(&self) -> bool {
        self.deletions.is_empty()
            && self.pages.iter().all(|p| p.action == PageAction::Unchanged)
    }
}

/// One identifier that failed mid-run
#[derive(Debug, Clone, Serialize)]
pub struct TransferFailure {
    /// The identifier that failed
    pub id: Id,
    /// Human-readable cause
    pub error: String,
}

/// Outcome of one executed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferStats {
    /// Pages copied to the client tree
    pub pages_transferred: usize,
    /// Media files copied to the client tree
    pub media_transferred: usize,
    /// Pages skipped because their content was already equal
    pub pages_unchanged: usize,
    /// Pages deleted from the client tree
    pub pages_deleted: usize,
    /// Identifiers that failed; the run continued past them
    pub failures: Vec<TransferFailure>,
}

impl fmt::Display for TransferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transferred {} pages and {} media files, {} unchanged, {} deleted, {} failed",
            self.pages_transferred,
            self.media_transferred,
            self.pages_unchanged,
            self.pages_deleted,
            self.failures.len()
        )
    }
}

/// Run-scoped mutable state threaded through the execute phase
struct RunContext {
    now: i64,
    summary: String,
    /// Media already handled in this run (dedup across pages)
    transferred_media: HashSet<Id>,
}

/// Applies selected identifiers to the client tree
pub struct TransferEngine<FS: FileSystem> {
    fs: FS,
    config: SyncConfig,
    primary: TreeAddress,
    client: TreeAddress,
}

impl<FS: FileSystem + Clone> TransferEngine<FS> {
    /// Engine for the tree pair named by `config`
    pub fn new(fs: FS, config: SyncConfig) -> Self {
        let primary = TreeAddress::new(config.primary_root.clone());
        let client = TreeAddress::new(config.client_root.clone());
        Self {
            fs,
            config,
            primary,
            client,
        }
    }

    /// Address of the primary tree
    pub fn primary(&self) -> &TreeAddress {
        &self.primary
    }

    /// Address of the client tree
    pub fn client(&self) -> &TreeAddress {
        &self.client
    }

    /// Phase 1: resolve what a run over `selected` would do.
    ///
    /// The anchor is computed from the log state before this run writes its
    /// own entries. Deletion candidates are kept only if the page is really
    /// gone from the primary and still present on the client, so a stale
    /// changelog entry can never delete live content.
    pub fn prepare(&self, selected: &BTreeSet<Id>, with_deletions: bool) -> Result<TransferPlan> {
        self.config.preflight(&self.fs)?;

        let anchor = last_anchor(&self.fs, &self.client, &self.config.log_namespace_id())?;

        let deletions = if with_deletions {
            let provider =
                FileChangeProvider::new(self.fs.clone(), self.config.global_changelog_path());
            deletions_since(&provider, anchor)?
                .into_iter()
                .filter(|id| {
                    !self.fs.exists(&self.primary.resolve(id, ArtifactKind::Page))
                        && self.fs.exists(&self.client.resolve(id, ArtifactKind::Page))
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut pages = Vec::new();
        for id in selected {
            let primary_body = self.primary.resolve(id, ArtifactKind::Page);
            if !self.fs.exists(&primary_body) {
                // Selected but gone from primary: only the deletion path may
                // remove it, never a transfer.
                log::warn!("selected page {} has no body in the primary tree", id);
                continue;
            }

            let client_body = self.client.resolve(id, ArtifactKind::Page);
            let action = if content_equal(&self.fs, &primary_body, &client_body)? {
                PageAction::Unchanged
            } else {
                PageAction::Replace
            };
            pages.push(PlannedPage {
                id: id.clone(),
                action,
            });
        }

        Ok(TransferPlan {
            anchor,
            pages,
            deletions,
        })
    }

    /// Phases 2-4: apply a prepared plan to the client tree.
    ///
    /// Holds the run lock for the whole duration. Deletions are applied
    /// before content transfers; the journal page is named by `now`, so
    /// `now` must be strictly greater than the plan's anchor. A run at the
    /// anchor timestamp would append its bullets to the previous run's
    /// journal page and leave no record of its own.
    pub fn execute<R: MediaRelations>(
        &self,
        plan: &TransferPlan,
        relations: &R,
        summary: &str,
        now: i64,
    ) -> Result<TransferStats> {
        if now <= plan.anchor {
            return Err(SyncError::RunTimestamp {
                now,
                anchor: plan.anchor,
            });
        }

        let _lock = RunLock::acquire(self.fs.clone(), self.client.root(), now)?;

        let log = SyncLog::new(
            self.fs.clone(),
            &self.client,
            &self.config.log_namespace_id(),
            now,
            summary,
        );
        let mut ctx = RunContext {
            now,
            summary: summary.to_string(),
            transferred_media: HashSet::new(),
        };
        let mut stats = TransferStats::default();

        for id in &plan.deletions {
            match self.delete_page(id, &ctx, &log) {
                Ok(()) => stats.pages_deleted += 1,
                Err(e) => {
                    log::warn!("deletion of {} failed: {}", id, e);
                    stats.failures.push(TransferFailure {
                        id: id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        for page in &plan.pages {
            match page.action {
                PageAction::Unchanged => stats.pages_unchanged += 1,
                PageAction::Replace => {
                    match self.transfer_page(&page.id, relations, &mut ctx, &log, &mut stats) {
                        Ok(()) => stats.pages_transferred += 1,
                        Err(e) => {
                            log::warn!("transfer of {} failed: {}", page.id, e);
                            stats.failures.push(TransferFailure {
                                id: page.id.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Copy one page's artifact set, then its referenced media.
    ///
    /// Body, metadata and changelog line land together; the body keeps the
    /// primary's modification time so later scans can still compare the two
    /// trees by timestamp.
    fn transfer_page<R: MediaRelations>(
        &self,
        id: &Id,
        relations: &R,
        ctx: &mut RunContext,
        log: &SyncLog<FS>,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let primary_body = self.primary.resolve(id, ArtifactKind::Page);
        let client_body = self.client.resolve(id, ArtifactKind::Page);

        self.copy_artifact(&primary_body, &client_body)?;
        if let Ok(mtime) = self.fs.modified(&primary_body) {
            self.fs
                .set_modified(&client_body, mtime)
                .map_err(|source| SyncError::FileWrite {
                    path: client_body.clone(),
                    source,
                })?;
        }

        let primary_meta = self.primary.resolve(id, ArtifactKind::Meta);
        if self.fs.exists(&primary_meta) {
            self.copy_artifact(&primary_meta, &self.client.resolve(id, ArtifactKind::Meta))?;
        }

        self.append_changelog(
            ChangeEntry::transfer_edit(ctx.now, id.clone(), &ctx.summary),
            ArtifactKind::Changelog,
        )?;
        log.page_replaced(id)?;

        for media_id in relations.media_for(&primary_body)? {
            self.transfer_media(&media_id, ctx, log, stats)?;
        }

        Ok(())
    }

    /// Media sub-protocol: at most one copy and one changelog line per media
    /// identifier per run, no matter how many pages reference it.
    fn transfer_media(
        &self,
        id: &Id,
        ctx: &mut RunContext,
        log: &SyncLog<FS>,
        stats: &mut TransferStats,
    ) -> Result<()> {
        if ctx.transferred_media.contains(id) {
            log.media_skipped(id)?;
            return Ok(());
        }
        ctx.transferred_media.insert(id.clone());

        let primary_media = self.primary.resolve(id, ArtifactKind::Media);
        let client_media = self.client.resolve(id, ArtifactKind::Media);

        if content_equal(&self.fs, &primary_media, &client_media)? {
            return Ok(());
        }

        self.copy_artifact(&primary_media, &client_media)?;
        self.append_changelog(
            ChangeEntry::transfer_edit(ctx.now, id.clone(), &ctx.summary),
            ArtifactKind::MediaChangelog,
        )?;
        log.media_replaced(id)?;
        stats.media_transferred += 1;

        Ok(())
    }

    /// Deletion propagation for one page: remove the client body, keep the
    /// trail. Media of a deleted page is left alone; its relations are no
    /// longer resolvable.
    fn delete_page(&self, id: &Id, ctx: &RunContext, log: &SyncLog<FS>) -> Result<()> {
        let client_body = self.client.resolve(id, ArtifactKind::Page);
        self.fs
            .delete_file(&client_body)
            .map_err(|source| SyncError::FileWrite {
                path: client_body,
                source,
            })?;

        let primary_meta = self.primary.resolve(id, ArtifactKind::Meta);
        if self.fs.exists(&primary_meta) {
            self.copy_artifact(&primary_meta, &self.client.resolve(id, ArtifactKind::Meta))?;
        }

        self.append_changelog(
            ChangeEntry::transfer_delete(ctx.now, id.clone(), &ctx.summary),
            ArtifactKind::Changelog,
        )?;
        log.page_deleted(id)?;

        Ok(())
    }

    fn append_changelog(&self, entry: ChangeEntry, kind: ArtifactKind) -> Result<()> {
        let path = self.client.resolve(&entry.id, kind);
        if let Some(parent) = path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs
            .append_file(&path, &format!("{entry}\n"))
            .map_err(|source| SyncError::FileWrite { path, source })
    }

    fn copy_artifact(&self, from: &std::path::Path, to: &std::path::Path) -> Result<()> {
        let bytes = self
            .fs
            .read_binary(from)
            .map_err(|source| SyncError::FileRead {
                path: from.to_path_buf(),
                source,
            })?;
        if let Some(parent) = to.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs
            .write_binary(to, &bytes)
            .map_err(|source| SyncError::FileWrite {
                path: to.to_path_buf(),
                source,
            })
    }
}
