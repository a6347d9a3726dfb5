use serde::{Deserialize, Serialize};

use super::SentenceId;

/// One directed row of the translation graph. A translation pair is stored as two
/// rows, one per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub sentence_id: SentenceId,
    pub translation_id: SentenceId,
}

impl Link {
    pub fn edge(&self) -> (SentenceId, SentenceId) {
        (self.sentence_id, self.translation_id)
    }
}
