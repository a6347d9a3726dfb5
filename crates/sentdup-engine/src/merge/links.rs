use std::collections::HashSet;

use sentdup_core::{
    Contribution, ContributionAction, ContributionRepository, Link, LinkRepository, SentenceId,
    SqliteContributionRepository, SqliteLinkRepository,
};
use serde::Serialize;
use tracing::trace;

use super::{normalize_losers, Merger};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkMergeStats {
    /// Rows removed from a loser.
    pub deleted: usize,
    /// Redirected rows written against the survivor.
    pub inserted: usize,
    /// Redirected rows that already existed or would have linked the survivor to itself.
    pub skipped: usize,
}

impl std::ops::AddAssign for LinkMergeStats {
    fn add_assign(&mut self, other: Self) {
        self.deleted += other.deleted;
        self.inserted += other.inserted;
        self.skipped += other.skipped;
    }
}

struct Redirect<'a> {
    survivor: SentenceId,
    group: &'a HashSet<SentenceId>,
    edges: HashSet<(SentenceId, SentenceId)>,
}

impl Redirect<'_> {
    fn end(&self, id: SentenceId) -> SentenceId {
        if self.group.contains(&id) { self.survivor } else { id }
    }
}

impl<'c> Merger<'c> {
    /// Rewrites translation links of every loser onto `survivor`.
    ///
    /// Each loser row is deleted and logged. Its redirected copy is inserted and logged
    /// unless it would be a self-link or already exists.
    pub fn merge_links(&self, survivor: SentenceId, losers: &[SentenceId]) -> Result<LinkMergeStats> {
        let losers = normalize_losers(survivor, losers);
        let mut stats = LinkMergeStats::default();
        if losers.is_empty() {
            return Ok(stats);
        }

        let links = SqliteLinkRepository::new(self.conn);
        let contributions = SqliteContributionRepository::new(self.conn);

        let mut group: HashSet<SentenceId> = losers.iter().copied().collect();
        group.insert(survivor);
        let mut redirect = Redirect {
            survivor,
            group: &group,
            edges: links.edges_of(survivor)?,
        };

        let touching = links.touching(&losers)?;
        let mut handled: HashSet<i64> = HashSet::new();
        for &loser in &losers {
            let forward = touching.iter().filter(|l| l.sentence_id == loser);
            let backward = touching.iter().filter(|l| l.translation_id == loser);
            for link in forward.chain(backward) {
                if !handled.insert(link.id) {
                    continue;
                }
                self.redirect_link(&links, &contributions, link, &mut redirect, &mut stats)?;
            }
        }
        Ok(stats)
    }

    fn redirect_link(
        &self,
        links: &SqliteLinkRepository<'_>,
        contributions: &SqliteContributionRepository<'_>,
        link: &Link,
        redirect: &mut Redirect<'_>,
        stats: &mut LinkMergeStats,
    ) -> Result<()> {
        links.delete(link.id)?;
        contributions.append(
            &Contribution::link(
                ContributionAction::Delete,
                link.sentence_id,
                link.translation_id,
                self.now,
            )
            .by(self.actor),
        )?;
        stats.deleted += 1;

        let from = redirect.end(link.sentence_id);
        let to = redirect.end(link.translation_id);
        if from == to || !redirect.edges.insert((from, to)) {
            trace!(from, to, "link redirect skipped");
            stats.skipped += 1;
            return Ok(());
        }

        links.insert(from, to)?;
        contributions.append(
            &Contribution::link(ContributionAction::Insert, from, to, self.now).by(self.actor),
        )?;
        stats.inserted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{count, seeded_db};
    use sentdup_core::{now_secs, ContributionKind};

    fn edges(links: Vec<Link>) -> Vec<(SentenceId, SentenceId)> {
        links.iter().map(Link::edge).collect()
    }

    #[test]
    fn test_links_follow_survivor() {
        let db = seeded_db();
        let conn = db.connection();
        let merger = Merger::new(&conn, Some(99), now_secs());

        let stats = merger.merge_links(8, &[6, 7]).unwrap();
        assert_eq!(stats, LinkMergeStats { deleted: 4, inserted: 4, skipped: 0 });

        let repo = SqliteLinkRepository::new(&conn);
        assert_eq!(edges(repo.from_sentence(8).unwrap()), vec![(8, 9), (8, 10)]);
        assert_eq!(edges(repo.to_sentence(8).unwrap()), vec![(9, 8), (10, 8)]);
        assert!(repo.touching(&[6, 7]).unwrap().is_empty());
    }

    #[test]
    fn test_link_contributions_logged() {
        let db = seeded_db();
        let conn = db.connection();
        let merger = Merger::new(&conn, Some(99), now_secs());
        merger.merge_links(8, &[6, 7]).unwrap();

        let contributions = SqliteContributionRepository::new(&conn);
        let deletes: Vec<_> = contributions
            .list_by(ContributionKind::Link, ContributionAction::Delete)
            .unwrap()
            .into_iter()
            .map(|c| (c.sentence_id, c.translation_id.unwrap()))
            .collect();
        assert_eq!(deletes, vec![(6, 9), (9, 6), (7, 10), (10, 7)]);

        let inserts: Vec<_> = contributions
            .list_by(ContributionKind::Link, ContributionAction::Insert)
            .unwrap()
            .into_iter()
            .map(|c| (c.sentence_id, c.translation_id.unwrap(), c.user_id))
            .collect();
        assert_eq!(
            inserts,
            vec![(8, 9, Some(99)), (9, 8, Some(99)), (8, 10, Some(99)), (10, 8, Some(99))]
        );
    }

    #[test]
    fn test_existing_and_self_links_skipped() {
        let db = seeded_db();
        let conn = db.connection();
        let repo = SqliteLinkRepository::new(&conn);
        // 4 already links to 1; 2 and 3 both link to 1 and to each other.
        repo.insert_pair(4, 1).unwrap();
        repo.insert_pair(2, 1).unwrap();
        repo.insert_pair(3, 1).unwrap();
        repo.insert_pair(2, 3).unwrap();
        repo.insert_pair(3, 5).unwrap();

        let merger = Merger::new(&conn, None, now_secs());
        let stats = merger.merge_links(4, &[2, 3]).unwrap();
        assert_eq!(stats.deleted, 8);
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.skipped, 6);

        assert_eq!(edges(repo.from_sentence(4).unwrap()), vec![(4, 1), (4, 5)]);
        assert_eq!(edges(repo.to_sentence(4).unwrap()), vec![(1, 4), (5, 4)]);
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM sentences_translations WHERE sentence_id = translation_id"),
            0
        );
    }
}
