//! Content fingerprints and the tally that groups records sharing one.

use std::collections::{HashMap, HashSet};
use std::fmt;

use sentdup_core::{Sentence, SentenceId};
use sha2::{Digest, Sha256};

/// SHA-256 of a sentence's exact text bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(text: &str) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(text.as_bytes()));
        Self(out)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Duplicate key: exact text digest plus language. A missing language is its own key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub hash: ContentHash,
    pub lang: Option<String>,
}

impl Fingerprint {
    pub fn new(text: &str, lang: Option<&str>) -> Self {
        Self {
            hash: ContentHash::of(text),
            lang: lang.map(str::to_string),
        }
    }

    pub fn of(sentence: &Sentence) -> Self {
        Self::new(&sentence.text, sentence.lang.as_deref())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lang {
            Some(lang) => write!(f, "{lang}:{}", &self.hash.to_hex()[..12]),
            None => write!(f, "-:{}", &self.hash.to_hex()[..12]),
        }
    }
}

/// Fingerprint to id-list map, iterated in first-seen order so output is reproducible.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    index: HashMap<Fingerprint, usize>,
    groups: Vec<(Fingerprint, Vec<SentenceId>)>,
    seen: HashSet<SentenceId>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` under `fingerprint`. An id is recorded at most once; later adds are no-ops.
    pub fn add(&mut self, fingerprint: Fingerprint, id: SentenceId) {
        if !self.seen.insert(id) {
            return;
        }
        match self.index.get(&fingerprint) {
            Some(&slot) => self.groups[slot].1.push(id),
            None => {
                self.index.insert(fingerprint.clone(), self.groups.len());
                self.groups.push((fingerprint, vec![id]));
            }
        }
    }

    pub fn add_sentence(&mut self, sentence: &Sentence) {
        self.add(Fingerprint::of(sentence), sentence.id);
    }

    /// Folds another tally (typically one chunk's worth) into this one.
    pub fn merge(&mut self, other: Tally) {
        for (fingerprint, ids) in other.groups {
            for id in ids {
                self.add(fingerprint.clone(), id);
            }
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&[SentenceId]> {
        self.index
            .get(fingerprint)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Number of distinct fingerprints.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn records(&self) -> usize {
        self.groups.iter().map(|(_, ids)| ids.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &[SentenceId])> {
        self.groups.iter().map(|(fp, ids)| (fp, ids.as_slice()))
    }

    /// Groups holding more than one record.
    pub fn duplicates(&self) -> impl Iterator<Item = (&Fingerprint, &[SentenceId])> {
        self.iter().filter(|(_, ids)| ids.len() > 1)
    }
}

/// Tallies one batch of records.
pub fn tally<'a>(sentences: impl IntoIterator<Item = &'a Sentence>) -> Tally {
    let mut tally = Tally::new();
    for sentence in sentences {
        tally.add_sentence(sentence);
    }
    tally
}
