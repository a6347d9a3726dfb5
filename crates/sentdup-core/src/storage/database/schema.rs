use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

/// Tables that hold rows pointing at sentences or at the dedup run itself.
pub const TABLES: &[&str] = &[
    "users",
    "sentences",
    "sentence_comments",
    "sentences_translations",
    "contributions",
    "tags_sentences",
    "sentences_sentences_lists",
    "favorites_users",
    "sentence_annotations",
    "users_sentences",
    "transcriptions",
    "wall",
];

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id       INTEGER PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            created  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sentences (
            id          INTEGER PRIMARY KEY,
            lang        TEXT,
            text        TEXT NOT NULL,
            user_id     INTEGER,
            has_audio   INTEGER NOT NULL DEFAULT 0,
            correctness INTEGER NOT NULL DEFAULT 0,
            created     TEXT NOT NULL,
            modified    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sentence_comments (
            id          INTEGER PRIMARY KEY,
            sentence_id INTEGER NOT NULL,
            user_id     INTEGER,
            text        TEXT NOT NULL,
            created     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sentences_translations (
            id             INTEGER PRIMARY KEY,
            sentence_id    INTEGER NOT NULL,
            translation_id INTEGER NOT NULL,
            UNIQUE (sentence_id, translation_id)
        );

        CREATE TABLE IF NOT EXISTS contributions (
            id               INTEGER PRIMARY KEY,
            sentence_id      INTEGER NOT NULL,
            sentence_lang    TEXT,
            translation_id   INTEGER,
            translation_lang TEXT,
            text             TEXT,
            action           TEXT NOT NULL CHECK(action IN ('insert', 'update', 'delete')),
            user_id          INTEGER,
            datetime         TEXT NOT NULL,
            type             TEXT NOT NULL CHECK(type IN ('sentence', 'link'))
        );

        CREATE TABLE IF NOT EXISTS tags_sentences (
            id          INTEGER PRIMARY KEY,
            tag_id      INTEGER NOT NULL,
            user_id     INTEGER,
            sentence_id INTEGER NOT NULL,
            added_time  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sentences_sentences_lists (
            id                INTEGER PRIMARY KEY,
            sentences_list_id INTEGER NOT NULL,
            sentence_id       INTEGER NOT NULL,
            created           TEXT NOT NULL,
            UNIQUE (sentences_list_id, sentence_id)
        );

        CREATE TABLE IF NOT EXISTS favorites_users (
            id          INTEGER PRIMARY KEY,
            favorite_id INTEGER NOT NULL,
            user_id     INTEGER NOT NULL,
            created     TEXT NOT NULL,
            UNIQUE (favorite_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS sentence_annotations (
            id          INTEGER PRIMARY KEY,
            meaning_id  INTEGER NOT NULL,
            sentence_id INTEGER NOT NULL,
            text        TEXT NOT NULL,
            user_id     INTEGER,
            modified    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users_sentences (
            id          INTEGER PRIMARY KEY,
            user_id     INTEGER NOT NULL,
            sentence_id INTEGER NOT NULL,
            correctness INTEGER NOT NULL DEFAULT 0,
            created     TEXT NOT NULL,
            modified    TEXT NOT NULL,
            UNIQUE (user_id, sentence_id)
        );

        CREATE TABLE IF NOT EXISTS transcriptions (
            id          INTEGER PRIMARY KEY,
            sentence_id INTEGER NOT NULL,
            script      TEXT NOT NULL,
            text        TEXT NOT NULL,
            user_id     INTEGER,
            created     TEXT NOT NULL,
            modified    TEXT NOT NULL,
            UNIQUE (sentence_id, script)
        );

        CREATE TABLE IF NOT EXISTS wall (
            id        INTEGER PRIMARY KEY,
            owner     INTEGER,
            parent_id INTEGER,
            date      TEXT NOT NULL,
            title     TEXT NOT NULL DEFAULT '',
            content   TEXT NOT NULL,
            lft       INTEGER NOT NULL,
            rght      INTEGER NOT NULL,
            modified  TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_comments_sentence     ON sentence_comments(sentence_id);
        CREATE INDEX IF NOT EXISTS idx_links_translation     ON sentences_translations(translation_id);
        CREATE INDEX IF NOT EXISTS idx_contributions_sentence ON contributions(sentence_id);
        CREATE INDEX IF NOT EXISTS idx_tags_sentence         ON tags_sentences(sentence_id);
        CREATE INDEX IF NOT EXISTS idx_lists_sentence        ON sentences_sentences_lists(sentence_id);
        CREATE INDEX IF NOT EXISTS idx_favorites_favorite    ON favorites_users(favorite_id);
        CREATE INDEX IF NOT EXISTS idx_annotations_sentence  ON sentence_annotations(sentence_id);
        CREATE INDEX IF NOT EXISTS idx_annotations_meaning   ON sentence_annotations(meaning_id);
        CREATE INDEX IF NOT EXISTS idx_collection_sentence   ON users_sentences(sentence_id);
        CREATE INDEX IF NOT EXISTS idx_wall_rght             ON wall(rght);
        ",
    )?;
    Ok(())
}
