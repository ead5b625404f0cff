use std::fmt::Write as _;

use crate::data::{Entry, normalize_language};

const FENCE_OPEN: &str = "```\n";
const FENCE_CLOSE: &str = "```";

const FENCE_CHARS: usize = FENCE_OPEN.len() + FENCE_CLOSE.len();

/// Size limit of one outbound message, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    max_chars: usize,
}

impl MessageLimits {
    pub const DEFAULT_MAX_CHARS: usize = 2000;
    /// Smallest limit that still fits the code fence around one character.
    pub const MIN_MAX_CHARS: usize = FENCE_CHARS + 1;

    /// Limits below [`MessageLimits::MIN_MAX_CHARS`] are raised to it.
    pub const fn new(max_chars: usize) -> Self {
        let max_chars = if max_chars < Self::MIN_MAX_CHARS {
            Self::MIN_MAX_CHARS
        } else {
            max_chars
        };
        Self { max_chars }
    }

    pub const fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Characters left for content once the code fence is accounted for.
    pub fn body_budget(&self) -> usize {
        self.max_chars - FENCE_CHARS
    }
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CHARS)
    }
}

/// Renders spellings, readings and the glosses in `lang` (empty means `eng`).
pub fn definition(entry: &Entry, lang: &str) -> String {
    let mut out = String::new();
    for kanji in &entry.kanji {
        out.push_str(&kanji.phrase);
        out.push('\n');
    }
    for reading in &entry.readings {
        match reading.phrase_no_kanji.as_deref() {
            Some(kana) if !kana.is_empty() && kana != reading.phrase => {
                let _ = writeln!(out, "{} ({})", reading.phrase, kana);
            }
            _ => {
                out.push_str(&reading.phrase);
                out.push('\n');
            }
        }
    }
    out.push('\n');
    for gloss in entry.glosses_in(normalize_language(lang)) {
        out.push_str(&gloss.definition);
        out.push('\n');
    }
    out
}

/// Renders every entry for a selection, paginated so no entry straddles two messages.
pub fn definitions(entries: &[&Entry], lang: &str, limits: &MessageLimits) -> Vec<String> {
    let blocks = entries.iter().map(|entry| {
        let mut block = definition(entry, lang);
        block.push('\n');
        block
    });
    paginate(blocks, limits)
}

/// Numbered list of analysis matches with a hint on how to pick one.
pub fn pick_list(matches: &[String], command_hint: &str, limits: &MessageLimits) -> Vec<String> {
    let width = digits(matches.len());
    let mut blocks = Vec::with_capacity(matches.len() + 2);
    blocks.push("Pick a phrase:\n".to_string());
    for (i, gram) in matches.iter().enumerate() {
        let number = i + 1;
        blocks.push(format!(
            "{number}: {}{gram}\n",
            " ".repeat(width - digits(number))
        ));
    }
    blocks.push(format!("\nUse {command_hint} [1-{}]\n", matches.len()));
    paginate(blocks, limits)
}

/// Packs blocks into fenced messages that each fit `limits`.
///
/// Blocks are kept whole; a new message starts when the next block would not
/// fit. A block larger than a whole message is split at line boundaries, and
/// a single overlong line at character boundaries.
pub fn paginate<I>(blocks: I, limits: &MessageLimits) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let budget = limits.body_budget();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for block in blocks {
        let block_chars = block.chars().count();
        if block_chars == 0 {
            continue;
        }
        if current_chars + block_chars > budget && !current.is_empty() {
            chunks.push(fenced(&current));
            current.clear();
            current_chars = 0;
        }
        if block_chars > budget {
            chunks.extend(split_oversized(&block, budget).iter().map(|piece| fenced(piece)));
            continue;
        }
        current.push_str(&block);
        current_chars += block_chars;
    }
    if !current.is_empty() {
        chunks.push(fenced(&current));
    }
    chunks
}

fn fenced(body: &str) -> String {
    format!("{FENCE_OPEN}{body}{FENCE_CLOSE}")
}

fn split_oversized(block: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    for line in block.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars + line_chars > budget && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if line_chars > budget {
            let chars: Vec<char> = line.chars().collect();
            for slice in chars.chunks(budget) {
                pieces.push(slice.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_chars += line_chars;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Gloss, KanjiElement, ReadingElement, Sense};
    use crate::lexicon::tests::sample;

    fn entry_with_glosses(id: &str, count: usize) -> Entry {
        Entry {
            entry_id: id.to_string(),
            kanji: vec![KanjiElement {
                phrase: format!("語{id}"),
                ..Default::default()
            }],
            readings: vec![ReadingElement {
                phrase: "ご".into(),
                ..Default::default()
            }],
            senses: vec![Sense {
                glossary: (0..count)
                    .map(|i| Gloss {
                        language: "eng".into(),
                        definition: format!("meaning number {i} of entry {id}"),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn definition_lists_spellings_readings_then_glosses() {
        let lexicon = sample();
        let kyou = lexicon.lookup("今日")[0];
        assert_eq!(
            definition(kyou, "eng"),
            "今日\nきょう\nこんにち\n\ntoday\nthis day\nthese days\nnowadays\n"
        );
    }

    #[test]
    fn definition_filters_by_language() {
        let lexicon = sample();
        let hello = lexicon.lookup("こんにちは")[0];
        assert_eq!(definition(hello, "spa"), "こんにちは\n\nbuenas tardes\n");
        assert_eq!(definition(hello, ""), definition(hello, "eng"));
    }

    #[test]
    fn foreign_only_entry_has_empty_definitions_section() {
        let lexicon = sample();
        let pan = lexicon.lookup("パン")[0];
        let rendered = definition(pan, "eng");
        assert_eq!(rendered, "パン\n\n");
        let (spellings, definitions) = rendered.split_once("\n\n").unwrap();
        assert!(!spellings.is_empty());
        assert!(definitions.is_empty());
    }

    #[test]
    fn kana_only_variant_is_shown_in_parentheses() {
        let entry = Entry {
            readings: vec![
                ReadingElement {
                    phrase: "いぬ".into(),
                    phrase_no_kanji: Some("イヌ".into()),
                    no_kanji: true,
                    ..Default::default()
                },
                ReadingElement {
                    phrase: "ねこ".into(),
                    phrase_no_kanji: Some("ねこ".into()),
                    no_kanji: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(definition(&entry, "eng"), "いぬ (イヌ)\nねこ\n\n");
    }

    #[test]
    fn long_definition_sets_split_between_entries() {
        let entries: Vec<Entry> = (0..12)
            .map(|i| entry_with_glosses(&i.to_string(), 3))
            .collect();
        let refs: Vec<&Entry> = entries.iter().collect();
        let limits = MessageLimits::new(300);
        let chunks = definitions(&refs, "eng", &limits);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= limits.max_chars(), "{chunk}");
            assert!(chunk.starts_with("```\n") && chunk.ends_with("```"));
        }
        for entry in &entries {
            let rendered = definition(entry, "eng");
            let holders = chunks.iter().filter(|c| c.contains(&rendered)).count();
            assert_eq!(holders, 1, "entry {} split or duplicated", entry.entry_id);
        }
    }

    #[test]
    fn short_output_stays_in_one_message() {
        let lexicon = sample();
        let chunks = definitions(&lexicon.lookup("はし"), "eng", &MessageLimits::default());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("bridge"));
        assert!(chunks[0].contains("chopsticks"));
    }

    #[test]
    fn oversized_block_is_split_as_last_resort() {
        let limits = MessageLimits::new(40);
        let block = "x".repeat(100);
        let chunks = paginate(vec![block], &limits);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn pick_list_aligns_numbers() {
        let matches: Vec<String> = (0..10).map(|i| format!("w{i}")).collect();
        let chunks = pick_list(&matches, "jpn!analyse", &MessageLimits::default());
        assert_eq!(chunks.len(), 1);
        let body = &chunks[0];
        assert!(body.starts_with("```\nPick a phrase:\n1:  w0\n"));
        assert!(body.contains("\n10: w9\n"));
        assert!(body.ends_with("\nUse jpn!analyse [1-10]\n```"));
    }

    #[test]
    fn pick_list_paginates_long_lists() {
        let matches: Vec<String> = (0..400).map(|i| format!("phrase-{i}")).collect();
        let limits = MessageLimits::default();
        let chunks = pick_list(&matches, "jpn!analyse", &limits);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= limits.max_chars()));
        assert!(chunks.last().unwrap().contains("[1-400]"));
    }

    #[test]
    fn tiny_limits_are_raised_to_fit_the_fence() {
        let limits = MessageLimits::new(3);
        assert_eq!(limits.max_chars(), MessageLimits::MIN_MAX_CHARS);
        assert_eq!(limits.body_budget(), 1);
        let chunks = paginate(vec!["abc\n".to_string()], &limits);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= MessageLimits::MIN_MAX_CHARS));
    }

    #[test]
    fn digit_counts() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1234), 4);
    }
}
