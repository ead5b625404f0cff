use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;

use fst::automaton::{Automaton, Str};
use fst::{IntoStreamer, Set, Streamer};
use tracing::{info, warn};

use crate::data::Entry;
use crate::{loader, snapshot};

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// The loaded dictionary: entries in document order plus the lookup indices
/// derived from them. Never mutated after construction.
pub struct Lexicon {
    entries: Vec<Entry>,
    phrases: HashMap<String, Vec<u32>>,
    ids: HashMap<String, Vec<u32>>,
    keys: Option<Set<Vec<u8>>>,
    longest_phrase_chars: usize,
}

impl Lexicon {
    /// Builds the phrase and ID indices over `entries`.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut phrases: HashMap<String, Vec<u32>> = HashMap::new();
        let mut ids: HashMap<String, Vec<u32>> = HashMap::new();
        let mut longest_phrase_chars = 0;

        for (position, entry) in entries.iter().enumerate() {
            let position = position as u32;
            for phrase in entry.phrases() {
                let slot = phrases.entry(phrase.to_string()).or_default();
                // an entry can list the same spelling twice (reading == kana-only form)
                if slot.last() != Some(&position) {
                    slot.push(position);
                }
                longest_phrase_chars = longest_phrase_chars.max(phrase.chars().count());
            }
            ids.entry(entry.entry_id.clone()).or_default().push(position);
        }

        let sorted: BTreeSet<&str> = phrases.keys().map(String::as_str).collect();
        let keys = match Set::from_iter(sorted) {
            Ok(set) => Some(set),
            Err(err) => {
                warn!(error = %err, "failed to build phrase key set; prefix listing disabled");
                None
            }
        };

        Self {
            entries,
            phrases,
            ids,
            keys,
            longest_phrase_chars,
        }
    }

    /// Parses JMdict XML from `source` and indexes it.
    pub fn from_reader<R: BufRead>(source: R) -> Result<Self, LexiconError> {
        let started = Instant::now();
        let entries = loader::parse_entries(source)?;
        let lexicon = Self::from_entries(entries);
        info!(
            entries = lexicon.len(),
            phrases = lexicon.phrase_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded lexicon from XML"
        );
        Ok(lexicon)
    }

    /// Opens either a compiled snapshot or a JMdict XML file, sniffing the magic bytes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let is_snapshot = reader.fill_buf()?.starts_with(snapshot::MAGIC);
        if !is_snapshot {
            return Self::from_reader(reader);
        }

        let started = Instant::now();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let entries = snapshot::decode(&bytes)?;
        let lexicon = Self::from_entries(entries);
        info!(
            path = %path.display(),
            entries = lexicon.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded lexicon from snapshot"
        );
        Ok(lexicon)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Character length of the longest indexed phrase.
    pub fn longest_phrase_chars(&self) -> usize {
        self.longest_phrase_chars
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains_key(phrase)
    }

    /// Entries that spell or read as `phrase`, in lexicon order.
    pub fn lookup(&self, phrase: &str) -> Vec<&Entry> {
        self.resolve(self.phrases.get(phrase))
    }

    /// Entries carrying `entry_id`. Normally at most one.
    pub fn by_id(&self, entry_id: &str) -> Vec<&Entry> {
        self.resolve(self.ids.get(entry_id))
    }

    /// Up to `limit` indexed phrases starting with `prefix`, in sorted order.
    pub fn prefix(&self, prefix: &str, limit: usize) -> Vec<String> {
        let Some(keys) = &self.keys else {
            return Vec::new();
        };
        let automaton = Str::new(prefix).starts_with();
        let mut stream = keys.search(automaton).into_stream();
        let mut results = Vec::new();
        while let Some(key) = stream.next() {
            if results.len() >= limit {
                break;
            }
            results.push(String::from_utf8_lossy(key).into_owned());
        }
        results
    }

    fn resolve(&self, positions: Option<&Vec<u32>>) -> Vec<&Entry> {
        positions
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&position| self.entries.get(position as usize))
                    .collect()
            })
            .unwrap_or_default()
    }
}
