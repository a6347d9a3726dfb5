//! User-facing notices about merged duplicates: sentence comments and a wall summary.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sentdup_core::{
    Comment, CommentRepository, SentenceId, SqliteCommentRepository, SqliteWallRepository,
    UserId, WallPost, WallRepository,
};

use crate::error::Result;
use crate::pass::GroupSummary;

/// Groups listed individually in a wall post before the rest are summarised.
const WALL_GROUP_LIMIT: usize = 200;

pub struct Announcer<'c> {
    conn: &'c Connection,
    actor: Option<UserId>,
    now: DateTime<Utc>,
}

fn id_list(ids: &[SentenceId]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn deleted_notice(survivor: SentenceId) -> String {
    format!("This sentence has been deleted because it was a duplicate of #{survivor}.")
}

pub fn survivor_notice(losers: &[SentenceId]) -> String {
    format!("Duplicates of this sentence have been deleted: {}.", id_list(losers))
}

impl<'c> Announcer<'c> {
    pub fn new(conn: &'c Connection, actor: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self { conn, actor, now }
    }

    fn comment(&self, sentence_id: SentenceId, text: String) -> Result<()> {
        SqliteCommentRepository::new(self.conn).insert(&Comment {
            created: self.now,
            ..Comment::new(sentence_id, self.actor, text)
        })?;
        Ok(())
    }

    /// Leaves a notice on every deleted loser and one on the survivor listing them.
    pub fn announce_group(&self, survivor: SentenceId, deleted: &[SentenceId]) -> Result<()> {
        if deleted.is_empty() {
            return Ok(());
        }
        for &loser in deleted {
            self.comment(loser, deleted_notice(survivor))?;
        }
        self.comment(survivor, survivor_notice(deleted))
    }

    /// Appends one root wall post describing the merged groups.
    pub fn post_summary(&self, groups: &[GroupSummary]) -> Result<WallPost> {
        let removed: usize = groups.iter().map(|g| g.deleted.len()).sum();
        let title = format!(
            "Duplicate sentences merged: {} groups, {removed} sentences removed",
            groups.len()
        );

        let mut content = String::from("The following duplicate sentences were merged.\n");
        for group in groups.iter().take(WALL_GROUP_LIMIT) {
            content.push_str(&format!(
                "\n#{} kept, removed {}",
                group.survivor,
                id_list(&group.deleted)
            ));
        }
        if groups.len() > WALL_GROUP_LIMIT {
            content.push_str(&format!(
                "\n... and {} more groups",
                groups.len() - WALL_GROUP_LIMIT
            ));
        }

        let post = SqliteWallRepository::new(self.conn).append_root(
            self.actor,
            &title,
            &content,
            &self.now,
        )?;
        Ok(post)
    }
}
