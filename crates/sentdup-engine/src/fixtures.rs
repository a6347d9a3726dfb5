//! Seeded store shared by the engine tests.
//!
//! | ids    | text                                  | shape                               |
//! |--------|---------------------------------------|-------------------------------------|
//! | 1      | Normal, not duplicated.               | plain                               |
//! | 2-4    | Normal, duplicated.                   | plain                               |
//! | 5      | Has owner, not duplicated.            | owner                               |
//! | 6-8    | Has owner, duplicated.                | only 8 owned                        |
//! | 9      | Has audio, not duplicated.            | audio                               |
//! | 10-12  | Has audio, duplicated.                | only 12 has audio                   |
//! | 13     | Correctness -1, not duplicated.       | rejected                            |
//! | 14-16  | Correctness -1, duplicated.           | all rejected                        |
//! | 17     | Has owner, Has audio, ... not dup.    | owner, audio, rejected              |
//! | 18-21  | Has owner, Has audio, ... duplicated. | 18 owner, 19-20 both, 21 audio      |
//!
//! Only 6-8 and 18-21 were modified on or after 2014-01-04.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use sentdup_core::{Correctness, Database, Repository, Sentence, SqliteSentenceRepository};

pub const TOTAL: usize = 21;

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 1, d, 0, 0, 0).unwrap()
}

pub fn window_start() -> DateTime<Utc> {
    day(4)
}

fn sentence(id: i64, text: &str, modified: u32) -> Sentence {
    Sentence::new(id, "eng", text).with_dates(day(1), day(modified))
}

pub fn sentences() -> Vec<Sentence> {
    let rejected = Correctness::Rejected;
    let mixed = "Has owner, Has audio, Correctness -1 duplicated.";
    vec![
        sentence(1, "Normal, not duplicated.", 1),
        sentence(2, "Normal, duplicated.", 1),
        sentence(3, "Normal, duplicated.", 2),
        sentence(4, "Normal, duplicated.", 3),
        sentence(5, "Has owner, not duplicated.", 1).with_owner(1),
        sentence(6, "Has owner, duplicated.", 4),
        sentence(7, "Has owner, duplicated.", 5),
        sentence(8, "Has owner, duplicated.", 6).with_owner(1),
        sentence(9, "Has audio, not duplicated.", 1).with_audio(),
        sentence(10, "Has audio, duplicated.", 1),
        sentence(11, "Has audio, duplicated.", 2),
        sentence(12, "Has audio, duplicated.", 3).with_audio(),
        sentence(13, "Correctness -1, not duplicated.", 1).with_correctness(rejected),
        sentence(14, "Correctness -1, duplicated.", 1).with_correctness(rejected),
        sentence(15, "Correctness -1, duplicated.", 2).with_correctness(rejected),
        sentence(16, "Correctness -1, duplicated.", 3).with_correctness(rejected),
        sentence(17, "Has owner, Has audio, Correctness -1 not duplicated.", 1)
            .with_owner(1)
            .with_audio()
            .with_correctness(rejected),
        sentence(18, mixed, 4).with_owner(1).with_correctness(rejected),
        sentence(19, mixed, 5)
            .with_owner(1)
            .with_audio()
            .with_correctness(rejected),
        sentence(20, mixed, 6)
            .with_owner(1)
            .with_audio()
            .with_correctness(rejected),
        sentence(21, mixed, 7).with_audio().with_correctness(rejected),
    ]
}

/// Rows in every sentence-referencing table, mostly around the 5-8 range.
pub fn seed_relations(conn: &Connection) {
    conn.execute_batch(
        "
        INSERT INTO sentence_comments (sentence_id, user_id, text, created) VALUES
            (6, 2, 'Comment on 6', '2014-01-02T00:00:00Z'),
            (7, 3, 'Comment on 7', '2014-01-03T00:00:00Z'),
            (8, 2, 'Comment on 8', '2014-01-04T00:00:00Z');

        INSERT INTO sentences_translations (sentence_id, translation_id) VALUES
            (6, 9), (9, 6), (7, 10), (10, 7);

        INSERT INTO contributions (sentence_id, sentence_lang, text, action, type, user_id, datetime) VALUES
            (1, 'eng', 'Normal, not duplicated.', 'insert', 'sentence', 1, '2014-01-01T00:00:00Z'),
            (2, 'eng', 'Normal, duplicated.', 'insert', 'sentence', 1, '2014-01-01T00:00:00Z'),
            (3, 'eng', 'Normal, duplicated.', 'insert', 'sentence', 1, '2014-01-01T00:00:00Z'),
            (4, 'eng', 'Normal, duplicated.', 'insert', 'sentence', 1, '2014-01-01T00:00:00Z'),
            (5, 'eng', 'Has owner, not duplicated.', 'insert', 'sentence', 1, '2014-01-01T00:00:00Z');

        INSERT INTO tags_sentences (tag_id, user_id, sentence_id, added_time) VALUES
            (1, 1, 6, '2014-01-01T00:00:00Z'),
            (2, 1, 7, '2014-01-01T00:00:00Z'),
            (3, 1, 8, '2014-01-01T00:00:00Z');

        INSERT INTO sentences_sentences_lists (sentences_list_id, sentence_id, created) VALUES
            (1, 6, '2014-01-01T00:00:00Z'),
            (2, 7, '2014-01-01T00:00:00Z'),
            (3, 8, '2014-01-01T00:00:00Z');

        INSERT INTO favorites_users (favorite_id, user_id, created) VALUES
            (6, 1, '2014-01-01T00:00:00Z'),
            (7, 2, '2014-01-01T00:00:00Z'),
            (8, 3, '2014-01-01T00:00:00Z');

        INSERT INTO sentence_annotations (meaning_id, sentence_id, text, user_id, modified) VALUES
            (10, 6, 'annotation 1', 1, '2014-01-01T00:00:00Z'),
            (11, 7, 'annotation 2', 1, '2014-01-01T00:00:00Z'),
            (12, 8, 'annotation 3', 1, '2014-01-01T00:00:00Z');

        INSERT INTO users_sentences (user_id, sentence_id, correctness, created, modified) VALUES
            (1, 6, -1, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z'),
            (1, 7, 1, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z'),
            (1, 8, 0, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z');

        INSERT INTO transcriptions (sentence_id, script, text, user_id, created, modified) VALUES
            (6, 'Hrkt', 'transcription 1', 1, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z'),
            (7, 'Hrkt', 'transcription 2', 1, '2014-01-02T00:00:00Z', '2014-01-02T00:00:00Z'),
            (8, 'Hrkt', 'transcription 3', 1, '2014-01-03T00:00:00Z', '2014-01-03T00:00:00Z');

        INSERT INTO wall (owner, parent_id, date, title, content, lft, rght, modified) VALUES
            (1, NULL, '2014-01-01T00:00:00Z', '', 'Welcome.', 1, 2, '2014-01-01T00:00:00Z');
        ",
    )
    .unwrap();
}

pub fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    {
        let conn = db.connection();
        let repo = SqliteSentenceRepository::new(&conn);
        for s in sentences() {
            repo.save(&s).unwrap();
        }
        seed_relations(&conn);
    }
    db
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
