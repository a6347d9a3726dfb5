use sentdup_core::{
    Comment, CommentRepository, Contribution, ContributionRepository, Repository, SentenceId,
    SentenceRepository, SqliteCommentRepository, SqliteContributionRepository,
    SqliteSentenceRepository,
};
use tracing::debug;

use super::{normalize_losers, Merger};
use crate::error::Result;

impl<'c> Merger<'c> {
    /// Copies each loser's comment thread onto the survivor as a single comment.
    ///
    /// Losers without comments are skipped. Returns the number of copies posted.
    pub fn merge_comments(&self, survivor: SentenceId, losers: &[SentenceId]) -> Result<usize> {
        let comments = SqliteCommentRepository::new(self.conn);
        let mut copied = 0;

        for loser in normalize_losers(survivor, losers) {
            let thread = comments.list_for(loser)?;
            if thread.is_empty() {
                continue;
            }

            let mut text = format!("copied from #{loser}\n");
            for comment in &thread {
                let author = comment
                    .user_id
                    .map_or_else(|| "anonymous".to_string(), |id| format!("user #{id}"));
                text.push_str(&format!(
                    "\n[{}] {author}: {}",
                    comment.created.format("%Y-%m-%d %H:%M"),
                    comment.text
                ));
            }

            comments.insert(&Comment {
                created: self.now,
                ..Comment::new(survivor, self.actor, text)
            })?;
            copied += 1;
        }
        Ok(copied)
    }

    /// Deletes the losers with their comments, logging one contribution per removed record.
    /// Returns the ids actually deleted; ids already gone are ignored.
    pub fn delete_sents(&self, survivor: SentenceId, losers: &[SentenceId]) -> Result<Vec<SentenceId>> {
        let sentences = SqliteSentenceRepository::new(self.conn);
        let comments = SqliteCommentRepository::new(self.conn);
        let contributions = SqliteContributionRepository::new(self.conn);

        let mut deleted = Vec::new();
        for sentence in sentences.find_many(&normalize_losers(survivor, losers))? {
            comments.delete_for(sentence.id)?;
            if !sentences.delete(&sentence.id)? {
                continue;
            }
            contributions.append(
                &Contribution::sentence_deleted(&sentence, survivor, self.now).by(self.actor),
            )?;
            deleted.push(sentence.id);
        }

        debug!(survivor, deleted = ?deleted, "duplicates deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{count, seeded_db};
    use sentdup_core::{now_secs, ContributionAction, ContributionKind};

    #[test]
    fn test_comments_copied_to_survivor() {
        let db = seeded_db();
        let conn = db.connection();
        let merger = Merger::new(&conn, Some(42), now_secs());

        assert_eq!(merger.merge_comments(8, &[6, 7]).unwrap(), 2);

        let repo = SqliteCommentRepository::new(&conn);
        let on_survivor = repo.list_for(8).unwrap();
        assert_eq!(on_survivor.len(), 3);
        assert_eq!(repo.find_containing("Comment on 6").unwrap().len(), 2);
        assert_eq!(repo.find_containing("Comment on 7").unwrap().len(), 2);
        assert!(on_survivor.iter().skip(1).all(|c| c.user_id == Some(42)));
        assert!(on_survivor[1].text.starts_with("copied from #6"));
    }

    #[test]
    fn test_losers_without_comments_skipped() {
        let db = seeded_db();
        let conn = db.connection();
        let merger = Merger::new(&conn, None, now_secs());
        assert_eq!(merger.merge_comments(4, &[2, 3]).unwrap(), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM sentence_comments"), 3);
    }

    #[test]
    fn test_delete_sents_logs_one_contribution_each() {
        let db = seeded_db();
        let conn = db.connection();
        let merger = Merger::new(&conn, Some(42), now_secs());

        let deleted = merger.delete_sents(8, &[6, 7]).unwrap();
        assert_eq!(deleted, vec![6, 7]);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM sentences WHERE id IN (6, 7)"), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM sentence_comments WHERE sentence_id IN (6, 7)"), 0);

        let removals = SqliteContributionRepository::new(&conn)
            .list_by(ContributionKind::Sentence, ContributionAction::Delete)
            .unwrap();
        assert_eq!(removals.len(), 2);
        assert!(removals.iter().all(|c| c.merged_into == Some(8)));
        assert_eq!(removals[0].text.as_deref(), Some("Has owner, duplicated."));
    }

    #[test]
    fn test_delete_sents_never_touches_survivor() {
        let db = seeded_db();
        let conn = db.connection();
        let merger = Merger::new(&conn, None, now_secs());

        let deleted = merger.delete_sents(8, &[8, 6, 6, 404]).unwrap();
        assert_eq!(deleted, vec![6]);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM sentences WHERE id = 8"), 1);
    }
}
