use serde::{Deserialize, Serialize};

/// How rows of a relation are reconciled when their sentence reference moves from a
/// loser onto the survivor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Plain foreign-key rewrite; the relation has no uniqueness on the reference.
    Reassign,
    /// `(key, reference)` is unique. A loser row whose key the survivor already holds is dropped.
    UniqueKey { key: &'static str },
    /// `(key, reference)` is unique. On collision the survivor row keeps the higher `rating`.
    RatingElevation {
        key: &'static str,
        rating: &'static str,
    },
    /// `(key, reference)` is unique. Among colliding rows the one with the smallest
    /// `(order, id)` is kept, whichever sentence it belonged to.
    KeepEarliest {
        key: &'static str,
        order: &'static str,
    },
}

/// Static description of a table that references sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub table: &'static str,
    /// Columns holding a sentence id. The first one is the default merge field.
    pub fields: &'static [&'static str],
    pub policy: MergePolicy,
}

impl RelationSpec {
    pub fn default_field(&self) -> &'static str {
        self.fields[0]
    }

    /// Resolves a caller-supplied field name against the declared columns.
    pub fn field(&self, name: &str) -> Option<&'static str> {
        self.fields.iter().copied().find(|f| *f == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Tags,
    Lists,
    Favorites,
    Annotations,
    Collection,
    Transcriptions,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::Tags,
        Relation::Lists,
        Relation::Favorites,
        Relation::Annotations,
        Relation::Collection,
        Relation::Transcriptions,
    ];

    pub fn spec(self) -> RelationSpec {
        match self {
            Relation::Tags => RelationSpec {
                table: "tags_sentences",
                fields: &["sentence_id"],
                policy: MergePolicy::Reassign,
            },
            Relation::Lists => RelationSpec {
                table: "sentences_sentences_lists",
                fields: &["sentence_id"],
                policy: MergePolicy::UniqueKey {
                    key: "sentences_list_id",
                },
            },
            Relation::Favorites => RelationSpec {
                table: "favorites_users",
                fields: &["favorite_id"],
                policy: MergePolicy::UniqueKey { key: "user_id" },
            },
            Relation::Annotations => RelationSpec {
                table: "sentence_annotations",
                fields: &["sentence_id", "meaning_id"],
                policy: MergePolicy::Reassign,
            },
            Relation::Collection => RelationSpec {
                table: "users_sentences",
                fields: &["sentence_id"],
                policy: MergePolicy::RatingElevation {
                    key: "user_id",
                    rating: "correctness",
                },
            },
            Relation::Transcriptions => RelationSpec {
                table: "transcriptions",
                fields: &["sentence_id"],
                policy: MergePolicy::KeepEarliest {
                    key: "script",
                    order: "created",
                },
            },
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spec().table)
    }
}
