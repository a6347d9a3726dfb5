//! One deduplication pass: scan, tally, merge each duplicate group, report.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sentdup_core::{
    now_secs, DedupConfig, SentenceId, SentenceRepository, SqliteSentenceRepository,
    SqliteUserRepository, UserId, UserRepository,
};
use serde::Serialize;
use tracing::{debug, info, warn, Level};

use crate::announce::Announcer;
use crate::chunker::chunked_ranges;
use crate::error::{Result, TimeParseError};
use crate::fingerprint::{tally, Tally};
use crate::merge::{LinkMergeStats, MergeStats, Merger};
use crate::prioritize::prioritize;
use crate::report::Reporter;
use crate::time_window::parse_since;

/// Ids per query when re-reading survivors and losers for verification.
const VERIFY_BATCH: usize = 500;

#[derive(Debug, Clone)]
pub struct PassOptions {
    /// Only records modified at or after this instant are considered.
    pub since: Option<DateTime<Utc>>,
    /// Run every step inside transactions that are rolled back.
    pub dry: bool,
    /// Post a summary on the wall after the pass.
    pub wall: bool,
    /// Comment on every loser and survivor.
    pub cmnt: bool,
    /// Record group failures and keep going instead of aborting.
    pub suppress: bool,
    pub chunk_size: i64,
    pub bot_username: String,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self::from_config(&DedupConfig::default())
    }
}

impl PassOptions {
    pub fn from_config(config: &DedupConfig) -> Self {
        Self {
            since: None,
            dry: false,
            wall: false,
            cmnt: false,
            suppress: false,
            chunk_size: config.chunk_size,
            bot_username: config.bot_username.clone(),
        }
    }

    /// Sets the window from a `since` expression resolved against `now`.
    pub fn with_since(mut self, expr: &str, now: DateTime<Utc>) -> std::result::Result<Self, TimeParseError> {
        self.since = Some(parse_since(expr, now)?);
        Ok(self)
    }
}

/// What happened to one duplicate group that was merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub survivor: SentenceId,
    pub deleted: Vec<SentenceId>,
    pub not_approved: bool,
    /// Some member of the group had audio before the merge.
    pub had_audio: bool,
    pub relations: MergeStats,
    pub links: LinkMergeStats,
    pub comments_copied: usize,
}

impl GroupSummary {
    pub fn new(survivor: SentenceId, deleted: Vec<SentenceId>) -> Self {
        Self {
            survivor,
            deleted,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub members: Vec<SentenceId>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GroupOutcome {
    Merged(GroupSummary),
    Failed(GroupFailure),
}

/// Post-pass checks against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// No deleted loser still exists.
    pub ver_dups: bool,
    /// Every survivor still exists.
    pub ver_mains: bool,
    /// Every group that had audio kept a survivor with audio.
    pub ver_audio: bool,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.ver_dups && self.ver_mains && self.ver_audio
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub dry: bool,
    pub since: Option<DateTime<Utc>>,
    pub scanned: usize,
    pub fingerprints: usize,
    pub groups_found: usize,
    pub groups_processed: usize,
    pub all_mains: Vec<SentenceId>,
    pub all_dups: Vec<SentenceId>,
    pub not_approved: Vec<SentenceId>,
    pub relations: MergeStats,
    pub links: LinkMergeStats,
    pub comments_copied: usize,
    pub announcements: usize,
    pub wall_post: Option<i64>,
    pub errors: Vec<GroupFailure>,
    pub cancelled: bool,
    pub verification: Option<Verification>,
    pub duration_ms: u64,
}

impl PassReport {
    fn record(&mut self, outcome: GroupOutcome) {
        match outcome {
            GroupOutcome::Merged(group) => {
                self.groups_processed += 1;
                self.all_mains.push(group.survivor);
                self.all_dups.extend_from_slice(&group.deleted);
                if group.not_approved {
                    self.not_approved.push(group.survivor);
                }
                self.relations += group.relations;
                self.links += group.links;
                self.comments_copied += group.comments_copied;
            }
            GroupOutcome::Failed(failure) => self.errors.push(failure),
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mode = if self.dry { " (dry run)" } else { "" };
        let state = if self.cancelled { "cancelled" } else { "finished" };
        let window = self
            .since
            .map(|at| format!(" modified since {}", at.format("%Y-%m-%d %H:%M:%S")))
            .unwrap_or_default();

        let mut lines = vec![
            format!(
                "Deduplication pass{mode} {state} in {:.1}s",
                self.duration_ms as f64 / 1000.0
            ),
            format!(
                "Scanned {} sentences{window}, {} distinct fingerprints",
                self.scanned, self.fingerprints
            ),
            format!(
                "Duplicate groups: {} found, {} merged",
                self.groups_found, self.groups_processed
            ),
            format!(
                "Sentences kept: {}, deleted: {}",
                self.all_mains.len(),
                self.all_dups.len()
            ),
            format!("Survivors not approved: {}", self.not_approved.len()),
            format!(
                "Relation rows reassigned: {}, dropped: {}, elevated: {}",
                self.relations.reassigned, self.relations.dropped, self.relations.elevated
            ),
            format!(
                "Links deleted: {}, recreated: {}, skipped: {}",
                self.links.deleted, self.links.inserted, self.links.skipped
            ),
            format!("Comment threads copied: {}", self.comments_copied),
            format!("Suppressed errors: {}", self.errors.len()),
        ];
        if let Some(v) = &self.verification {
            lines.push(format!(
                "Verification: duplicates gone {}, survivors kept {}, audio kept {}",
                v.ver_dups, v.ver_mains, v.ver_audio
            ));
        }
        lines
    }
}

pub struct Pass<'c> {
    conn: &'c mut Connection,
    options: PassOptions,
    cancel: Arc<AtomicBool>,
}

impl<'c> Pass<'c> {
    pub fn new(conn: &'c mut Connection, options: PassOptions) -> Self {
        Self {
            conn,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the returned flag stops the pass at the next chunk or group boundary.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn run(&mut self, reporter: &mut Reporter) -> Result<PassReport> {
        let started = Instant::now();
        let now = now_secs();
        let mut report = PassReport {
            dry: self.options.dry,
            since: self.options.since,
            ..PassReport::default()
        };

        info!(dry = self.options.dry, since = ?self.options.since, "dedup pass started");
        reporter.log(format_args!(
            "pass started (dry={}, since={:?}, chunk_size={})",
            self.options.dry, self.options.since, self.options.chunk_size
        ))?;

        let groups: Vec<Vec<SentenceId>> = match self.scan(reporter, &mut report)? {
            Some(tally) => {
                report.fingerprints = tally.len();
                tally.duplicates().map(|(_, ids)| ids.to_vec()).collect()
            }
            None => {
                report.cancelled = true;
                Vec::new()
            }
        };
        report.groups_found = groups.len();
        reporter.info(format_args!(
            "{} sentences scanned, {} duplicate groups",
            report.scanned, report.groups_found
        ))?;

        let actor = self.actor(!groups.is_empty(), now)?;
        let mut merged = Vec::new();
        for ids in &groups {
            if self.cancelled() {
                report.cancelled = true;
                break;
            }

            let outcome = match self.process_group(ids, actor, now) {
                Ok(None) => continue,
                Ok(Some(group)) => {
                    self.note_merged(reporter, &group, &mut report)?;
                    merged.push(group.clone());
                    GroupOutcome::Merged(group)
                }
                Err(err) if self.options.suppress => {
                    warn!(members = ?ids, error = %err, "group failed, continuing");
                    reporter.log(format_args!("group {ids:?} failed: {err}"))?;
                    reporter.progress(Level::WARN, format_args!("group {ids:?} failed: {err}"))?;
                    GroupOutcome::Failed(GroupFailure {
                        members: ids.clone(),
                        error: err.to_string(),
                    })
                }
                Err(err) => {
                    reporter.log(format_args!("group {ids:?} failed, aborting: {err}"))?;
                    reporter.flush()?;
                    return Err(err);
                }
            };
            report.record(outcome);
        }

        if self.options.wall && !self.options.dry && !merged.is_empty() {
            let post = Announcer::new(self.conn, actor, now).post_summary(&merged)?;
            report.wall_post = post.id;
        }

        if !self.options.dry {
            let verification = verify(self.conn, &merged)?;
            if !verification.passed() {
                warn!(?verification, "post-pass verification failed");
            }
            report.verification = Some(verification);
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        for line in report.summary_lines() {
            reporter.log(&line)?;
            reporter.report(line);
        }
        reporter.flush()?;
        info!(
            groups = report.groups_processed,
            deleted = report.all_dups.len(),
            errors = report.errors.len(),
            "dedup pass finished"
        );
        Ok(report)
    }

    /// Scanning and tallying. `None` when cancelled part way.
    fn scan(&self, reporter: &mut Reporter, report: &mut PassReport) -> Result<Option<Tally>> {
        let sentences = SqliteSentenceRepository::new(self.conn);
        let max_id = sentences.max_id()?;
        let mut total = Tally::new();

        for (start, end) in chunked_ranges(self.options.chunk_size, max_id) {
            if self.cancelled() {
                return Ok(None);
            }
            let chunk = sentences.scan_range(start, end, self.options.since.as_ref())?;
            report.scanned += chunk.len();
            reporter.debug(format_args!("#{start}..#{end}: {} sentences", chunk.len()))?;
            total.merge(tally(&chunk));
        }
        Ok(Some(total))
    }

    /// The bot account is only created when the pass is going to write.
    fn actor(&self, will_merge: bool, now: DateTime<Utc>) -> Result<Option<UserId>> {
        let users = SqliteUserRepository::new(self.conn);
        if self.options.dry || !will_merge {
            return Ok(users.find_by_name(&self.options.bot_username)?);
        }
        Ok(Some(users.get_or_create(&self.options.bot_username, &now)?))
    }

    fn process_group(
        &mut self,
        ids: &[SentenceId],
        actor: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Option<GroupSummary>> {
        let tx = self.conn.transaction()?;

        let members = SqliteSentenceRepository::new(&tx).find_many(ids)?;
        let Some(selection) = prioritize(&members) else {
            return Ok(None);
        };
        if selection.losers.is_empty() {
            return Ok(None);
        }
        let survivor = selection.survivor.id;
        let losers = selection.loser_ids();
        debug!(survivor, losers = ?losers, "merging group");

        let merger = Merger::new(&tx, actor, now);
        let comments_copied = merger.merge_comments(survivor, &losers)?;
        let relations = merger.update_merge_all(survivor, &losers)?;
        let links = merger.merge_links(survivor, &losers)?;
        let deleted = merger.delete_sents(survivor, &losers)?;

        if self.options.cmnt && !self.options.dry {
            Announcer::new(&tx, actor, now).announce_group(survivor, &deleted)?;
        }

        if self.options.dry {
            tx.rollback()?;
        } else {
            tx.commit()?;
        }

        Ok(Some(GroupSummary {
            survivor,
            deleted,
            not_approved: selection.not_approved,
            had_audio: selection.group_has_audio(),
            relations,
            links,
            comments_copied,
        }))
    }

    fn note_merged(
        &self,
        reporter: &mut Reporter,
        group: &GroupSummary,
        report: &mut PassReport,
    ) -> Result<()> {
        let removed = group
            .deleted
            .iter()
            .map(|id| format!("#{id}"))
            .collect::<Vec<_>>()
            .join(", ");
        reporter.debug(format_args!("#{} <- {removed}", group.survivor))?;
        reporter.log(format_args!("kept #{}, removed {removed}", group.survivor))?;
        if group.not_approved {
            reporter.log(format_args!("#{} kept although not approved", group.survivor))?;
        }
        if self.options.cmnt && !self.options.dry && !group.deleted.is_empty() {
            report.announcements += group.deleted.len() + 1;
        }
        Ok(())
    }
}

/// Convenience wrapper running one pass with a fresh cancellation flag.
pub fn run_pass(
    conn: &mut Connection,
    options: PassOptions,
    reporter: &mut Reporter,
) -> Result<PassReport> {
    Pass::new(conn, options).run(reporter)
}

/// Re-reads every survivor and loser of the merged groups.
pub fn verify(conn: &Connection, merged: &[GroupSummary]) -> Result<Verification> {
    let sentences = SqliteSentenceRepository::new(conn);

    let dups: Vec<SentenceId> = merged.iter().flat_map(|g| g.deleted.iter().copied()).collect();
    let mut lingering = 0;
    for batch in dups.chunks(VERIFY_BATCH) {
        lingering += sentences.existing_ids(batch)?.len();
    }

    let mains: Vec<SentenceId> = merged.iter().map(|g| g.survivor).collect();
    let mut present: HashMap<SentenceId, bool> = HashMap::with_capacity(mains.len());
    for batch in mains.chunks(VERIFY_BATCH) {
        for sentence in sentences.find_many(batch)? {
            present.insert(sentence.id, sentence.has_audio);
        }
    }

    Ok(Verification {
        ver_dups: lingering == 0,
        ver_mains: mains.iter().all(|id| present.contains_key(id)),
        ver_audio: merged
            .iter()
            .filter(|g| g.had_audio)
            .all(|g| present.get(&g.survivor) == Some(&true)),
    })
}
