//! Moving everything that references a loser sentence onto its survivor.

mod links;
mod removal;

use std::collections::{HashMap, HashSet};
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sentdup_core::{
    MergePolicy, Relation, RelationRepository, RelationRow, RelationSpec, RowKey, SentenceId,
    SqliteRelationRepository, UserId,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{DedupError, Result};

pub use links::LinkMergeStats;

/// Row counts produced by merging one relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Rows whose reference now points at the survivor.
    pub reassigned: usize,
    /// Loser rows removed because the survivor already held their key.
    pub dropped: usize,
    /// Survivor rows whose rating was raised to a loser's.
    pub elevated: usize,
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, other: Self) {
        self.reassigned += other.reassigned;
        self.dropped += other.dropped;
        self.elevated += other.elevated;
    }
}

/// Applies merges for one group. Every write it issues is stamped with `actor` and `now`.
pub struct Merger<'c> {
    conn: &'c Connection,
    actor: Option<UserId>,
    now: DateTime<Utc>,
}

/// Losers without the survivor or repeats, in ascending order.
fn normalize_losers(survivor: SentenceId, losers: &[SentenceId]) -> Vec<SentenceId> {
    let mut ids: Vec<SentenceId> = losers.iter().copied().filter(|&id| id != survivor).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl<'c> Merger<'c> {
    pub fn new(conn: &'c Connection, actor: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self { conn, actor, now }
    }

    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    /// Points every `relation` row referencing a loser at `survivor`, reconciling rows
    /// whose uniqueness key would collide. `field` selects a non-default reference column.
    pub fn update_merge(
        &self,
        relation: Relation,
        survivor: SentenceId,
        losers: &[SentenceId],
        field: Option<&str>,
    ) -> Result<MergeStats> {
        let spec = relation.spec();
        let field = match field {
            None => spec.default_field(),
            Some(name) => spec.field(name).ok_or_else(|| DedupError::UnknownField {
                relation,
                field: name.to_string(),
            })?,
        };

        let losers = normalize_losers(survivor, losers);
        if losers.is_empty() {
            return Ok(MergeStats::default());
        }

        let repo = SqliteRelationRepository::new(self.conn);
        let stats = match spec.policy {
            MergePolicy::Reassign => {
                let mut stats = MergeStats::default();
                for &loser in &losers {
                    stats.reassigned += repo.reassign_all(&spec, field, loser, survivor)?;
                }
                stats
            }
            MergePolicy::UniqueKey { .. } => {
                self.merge_unique(&repo, &spec, field, survivor, &losers)?
            }
            MergePolicy::RatingElevation { .. } => {
                self.merge_elevating(&repo, &spec, field, survivor, &losers)?
            }
            MergePolicy::KeepEarliest { .. } => {
                self.merge_earliest(&repo, &spec, field, survivor, &losers)?
            }
        };

        debug!(
            relation = %relation,
            field,
            survivor,
            reassigned = stats.reassigned,
            dropped = stats.dropped,
            elevated = stats.elevated,
            "relation merged"
        );
        Ok(stats)
    }

    /// Runs [`Self::update_merge`] over every relation and every sentence field it declares.
    pub fn update_merge_all(&self, survivor: SentenceId, losers: &[SentenceId]) -> Result<MergeStats> {
        let mut total = MergeStats::default();
        for relation in Relation::ALL {
            for field in relation.spec().fields {
                total += self.update_merge(relation, survivor, losers, Some(*field))?;
            }
        }
        Ok(total)
    }

    fn merge_unique(
        &self,
        repo: &SqliteRelationRepository<'_>,
        spec: &RelationSpec,
        field: &str,
        survivor: SentenceId,
        losers: &[SentenceId],
    ) -> Result<MergeStats> {
        let mut stats = MergeStats::default();
        let mut held: HashSet<RowKey> = repo
            .rows(spec, field, &[survivor])?
            .into_iter()
            .map(|row| row.key)
            .collect();

        for row in repo.rows(spec, field, losers)? {
            if held.insert(row.key.clone()) {
                repo.reassign_row(spec, field, row.id, survivor)?;
                stats.reassigned += 1;
            } else {
                repo.delete_row(spec, row.id)?;
                stats.dropped += 1;
            }
        }
        Ok(stats)
    }

    fn merge_elevating(
        &self,
        repo: &SqliteRelationRepository<'_>,
        spec: &RelationSpec,
        field: &str,
        survivor: SentenceId,
        losers: &[SentenceId],
    ) -> Result<MergeStats> {
        let mut stats = MergeStats::default();
        let mut held: HashMap<RowKey, (i64, Option<i64>)> = repo
            .rows(spec, field, &[survivor])?
            .into_iter()
            .map(|row| (row.key, (row.id, row.rating)))
            .collect();

        for row in repo.rows(spec, field, losers)? {
            match held.get_mut(&row.key) {
                Some((kept_id, kept_rating)) => {
                    if let Some(rating) = row.rating.filter(|r| Some(*r) > *kept_rating) {
                        repo.set_rating(spec, *kept_id, rating)?;
                        *kept_rating = Some(rating);
                        stats.elevated += 1;
                    }
                    repo.delete_row(spec, row.id)?;
                    stats.dropped += 1;
                }
                None => {
                    repo.reassign_row(spec, field, row.id, survivor)?;
                    held.insert(row.key, (row.id, row.rating));
                    stats.reassigned += 1;
                }
            }
        }
        Ok(stats)
    }

    fn merge_earliest(
        &self,
        repo: &SqliteRelationRepository<'_>,
        spec: &RelationSpec,
        field: &str,
        survivor: SentenceId,
        losers: &[SentenceId],
    ) -> Result<MergeStats> {
        let mut stats = MergeStats::default();
        let mut ids = Vec::with_capacity(losers.len() + 1);
        ids.push(survivor);
        ids.extend_from_slice(losers);
        let rows = repo.rows(spec, field, &ids)?;

        let mut earliest: HashMap<&RowKey, &RelationRow> = HashMap::new();
        for row in &rows {
            earliest
                .entry(&row.key)
                .and_modify(|kept| {
                    if (&row.order, row.id) < (&kept.order, kept.id) {
                        *kept = row;
                    }
                })
                .or_insert(row);
        }

        // Discarded rows go first so the kept row can take over the survivor's key.
        for row in &rows {
            if earliest.get(&row.key).is_some_and(|kept| kept.id != row.id) {
                repo.delete_row(spec, row.id)?;
                if row.reference != survivor {
                    stats.dropped += 1;
                }
            }
        }
        for kept in earliest.values() {
            if kept.reference != survivor {
                repo.reassign_row(spec, field, kept.id, survivor)?;
                stats.reassigned += 1;
            }
        }
        Ok(stats)
    }
}
