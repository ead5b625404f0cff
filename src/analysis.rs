use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::data::Entry;
use crate::lexicon::Lexicon;
use crate::ngram;

/// Failure to resolve a "pick result N" request.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no analysis has been run in this channel")]
    NoAnalysis,

    #[error("selection {index} is out of range for {len} results")]
    OutOfRange { index: usize, len: usize },

    #[error("no entries are indexed under {0:?}")]
    NoEntries(String),
}

pub struct Selection<'a> {
    pub phrase: String,
    pub entries: Vec<&'a Entry>,
}

/// Finds dictionary words inside arbitrary phrases and remembers, per channel,
/// the most recent result list so a follow-up can pick from it.
pub struct Analyzer {
    lexicon: Arc<Lexicon>,
    recent: RwLock<HashMap<String, Vec<String>>>,
}

impl Analyzer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            recent: RwLock::new(HashMap::new()),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Every distinct substring of `phrase` (whitespace removed) that has a
    /// dictionary entry, shortest windows first, in order of discovery.
    ///
    /// Window sizes run from 1 through the full character length, so the whole
    /// phrase is itself a candidate. Windows too long to match any indexed
    /// phrase even after whitespace removal are skipped.
    pub fn analyse(&self, phrase: &str) -> Vec<String> {
        let chars: Vec<char> = phrase.chars().collect();
        let whitespace = chars.iter().filter(|c| c.is_whitespace()).count();
        let max_window = chars
            .len()
            .min(self.lexicon.longest_phrase_chars().saturating_add(whitespace));

        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for size in 1..=max_window {
            for gram in ngram::windows(&chars, size) {
                let candidate: String = gram.chars().filter(|c| !c.is_whitespace()).collect();
                if candidate.is_empty() || seen.contains(&candidate) {
                    continue;
                }
                if self.lexicon.contains(&candidate) {
                    seen.insert(candidate.clone());
                    matches.push(candidate);
                }
            }
        }
        matches
    }

    /// Runs [`Analyzer::analyse`] and stores the result as the channel's
    /// current pick list, replacing whatever was there.
    pub fn analyse_for_channel(&self, channel_id: &str, phrase: &str) -> Vec<String> {
        let matches = self.analyse(phrase);
        debug!(channel_id, matches = matches.len(), "stored analysis");
        self.recent
            .write()
            .insert(channel_id.to_string(), matches.clone());
        matches
    }

    pub fn remembered(&self, channel_id: &str) -> Option<Vec<String>> {
        self.recent.read().get(channel_id).cloned()
    }

    /// Resolves a 1-based pick from the channel's last analysis.
    pub fn select(&self, channel_id: &str, index: usize) -> Result<Selection<'_>, SelectionError> {
        let phrase = {
            let recent = self.recent.read();
            let list = recent.get(channel_id).ok_or(SelectionError::NoAnalysis)?;
            index
                .checked_sub(1)
                .and_then(|i| list.get(i))
                .cloned()
                .ok_or(SelectionError::OutOfRange {
                    index,
                    len: list.len(),
                })?
        };
        let entries = self.lexicon.lookup(&phrase);
        if entries.is_empty() {
            return Err(SelectionError::NoEntries(phrase));
        }
        Ok(Selection { phrase, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::tests::sample;

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(sample()))
    }

    #[test]
    fn finds_every_indexed_substring_shortest_first() {
        let matches = analyzer().analyse("今日は日本語");
        assert_eq!(matches, vec!["日", "は", "語", "今日", "日本", "日本語"]);
    }

    #[test]
    fn whole_phrase_is_a_candidate() {
        assert_eq!(analyzer().analyse("こんにちは"), vec!["は", "こんにち", "こんにちは"]);
    }

    #[test]
    fn whitespace_is_removed_from_candidates() {
        assert_eq!(analyzer().analyse("日 本"), vec!["日", "日本"]);
        assert_eq!(analyzer().analyse("日\u{3000}本語"), vec!["日", "語", "日本", "日本語"]);
    }

    #[test]
    fn no_matches_yields_empty_list() {
        let analyzer = analyzer();
        assert!(analyzer.analyse("xyz").is_empty());
        assert!(analyzer.analyse("").is_empty());
        assert!(analyzer.analyse("   ").is_empty());
    }

    #[test]
    fn results_are_globally_unique() {
        let matches = analyzer().analyse("はしはしはし");
        let unique: HashSet<_> = matches.iter().collect();
        assert_eq!(unique.len(), matches.len());
        assert_eq!(matches, vec!["は", "はし"]);
    }

    #[test]
    fn select_before_any_analysis_is_not_found() {
        let analyzer = analyzer();
        assert_eq!(
            analyzer.select("chan", 1).err(),
            Some(SelectionError::NoAnalysis)
        );
    }

    #[test]
    fn select_out_of_bounds_is_not_found() {
        let analyzer = analyzer();
        analyzer.analyse_for_channel("chan", "猫");
        assert_eq!(
            analyzer.select("chan", 2).err(),
            Some(SelectionError::OutOfRange { index: 2, len: 1 })
        );
        assert_eq!(
            analyzer.select("chan", 0).err(),
            Some(SelectionError::OutOfRange { index: 0, len: 1 })
        );
    }

    #[test]
    fn select_returns_all_homographs() {
        let analyzer = analyzer();
        let matches = analyzer.analyse_for_channel("chan", "はし");
        assert_eq!(matches, vec!["は", "はし"]);
        let selection = analyzer.select("chan", 2).unwrap();
        assert_eq!(selection.phrase, "はし");
        assert_eq!(selection.entries.len(), 2);
    }

    #[test]
    fn later_analysis_replaces_channel_list() {
        let analyzer = analyzer();
        analyzer.analyse_for_channel("chan", "今日は日本語");
        analyzer.analyse_for_channel("chan", "猫");
        assert_eq!(analyzer.remembered("chan"), Some(vec!["猫".to_string()]));
        assert!(analyzer.select("chan", 2).is_err());
    }

    #[test]
    fn channels_are_independent() {
        let analyzer = analyzer();
        analyzer.analyse_for_channel("a", "猫");
        analyzer.analyse_for_channel("b", "日本");
        assert_eq!(analyzer.select("a", 1).unwrap().phrase, "猫");
        assert_eq!(analyzer.select("b", 2).unwrap().phrase, "日本");
        assert!(analyzer.remembered("c").is_none());
    }

    #[test]
    fn concurrent_channels_do_not_interfere() {
        let analyzer = Arc::new(analyzer());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let analyzer = Arc::clone(&analyzer);
                std::thread::spawn(move || {
                    let channel = format!("chan-{i}");
                    let phrase = if i % 2 == 0 { "猫" } else { "日本語" };
                    for _ in 0..50 {
                        analyzer.analyse_for_channel(&channel, phrase);
                        let first = analyzer.select(&channel, 1).unwrap();
                        assert!(phrase.contains(first.phrase.as_str()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(analyzer.remembered("chan-0").unwrap(), vec!["猫"]);
    }
}
