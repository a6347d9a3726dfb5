use sentdup_core::{Correctness, Sentence, SentenceId};

/// Outcome of ranking one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub survivor: Sentence,
    /// Every other member, ascending by id.
    pub losers: Vec<Sentence>,
    /// The survivor is not approved, so the group held no approved member.
    pub not_approved: bool,
}

impl Selection {
    pub fn loser_ids(&self) -> Vec<SentenceId> {
        self.losers.iter().map(|s| s.id).collect()
    }

    pub fn group_has_audio(&self) -> bool {
        self.survivor.has_audio || self.losers.iter().any(|s| s.has_audio)
    }
}

/// Ranking key: owner, then audio, then correctness, then highest id.
fn rank(sentence: &Sentence) -> (bool, bool, Correctness, SentenceId) {
    (
        sentence.has_owner(),
        sentence.has_audio,
        sentence.correctness,
        sentence.id,
    )
}

/// Picks the record that should absorb the rest of its group.
///
/// The result depends only on the members, never on their order. Returns `None` for
/// an empty group.
pub fn prioritize(group: &[Sentence]) -> Option<Selection> {
    let survivor = group.iter().max_by_key(|s| rank(s))?.clone();

    let mut losers: Vec<Sentence> = group
        .iter()
        .filter(|s| s.id != survivor.id)
        .cloned()
        .collect();
    losers.sort_by_key(|s| s.id);
    losers.dedup_by_key(|s| s.id);

    let not_approved = survivor.correctness < Correctness::Approved;
    Some(Selection {
        survivor,
        losers,
        not_approved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(id: SentenceId) -> Sentence {
        Sentence::new(id, "eng", "Same.")
    }

    #[test]
    fn test_owner_beats_audio() {
        let group = vec![plain(1).with_audio(), plain(2).with_owner(7), plain(3)];
        let sel = prioritize(&group).unwrap();
        assert_eq!(sel.survivor.id, 2);
        assert_eq!(sel.loser_ids(), vec![1, 3]);
    }

    #[test]
    fn test_audio_beats_correctness() {
        let group = vec![
            plain(1).with_correctness(Correctness::Approved),
            plain(2).with_audio().with_correctness(Correctness::Rejected),
        ];
        let sel = prioritize(&group).unwrap();
        assert_eq!(sel.survivor.id, 2);
        assert!(sel.not_approved);
    }

    #[test]
    fn test_correctness_then_highest_id() {
        let group = vec![
            plain(1).with_correctness(Correctness::Approved),
            plain(2),
            plain(3).with_correctness(Correctness::Approved),
        ];
        let sel = prioritize(&group).unwrap();
        assert_eq!(sel.survivor.id, 3);
        assert!(!sel.not_approved);
    }

    #[test]
    fn test_all_plain_keeps_highest_id() {
        let sel = prioritize(&[plain(2), plain(3), plain(4)]).unwrap();
        assert_eq!(sel.survivor.id, 4);
        assert!(sel.not_approved);
    }

    #[test]
    fn test_order_independent() {
        let members = vec![
            plain(18).with_owner(1),
            plain(19).with_owner(1).with_audio(),
            plain(20).with_owner(1).with_audio(),
            plain(21).with_audio(),
        ];
        let mut reversed = members.clone();
        reversed.reverse();

        let a = prioritize(&members).unwrap();
        let b = prioritize(&reversed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.survivor.id, 20);
        assert_eq!(a.loser_ids(), vec![18, 19, 21]);
    }

    #[test]
    fn test_empty_group() {
        assert!(prioritize(&[]).is_none());
    }
}
