use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::Serialize;

pub const DEFAULT_LANGUAGE: &str = "eng";

/// One JMdict headword record.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub entry_id: String,
    pub kanji: Vec<KanjiElement>,
    pub readings: Vec<ReadingElement>,
    pub senses: Vec<Sense>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct KanjiElement {
    pub phrase: String,
    pub info: Vec<String>,
    pub priorities: Vec<String>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ReadingElement {
    pub phrase: String,
    /// Text of `re_nokanji`, when the element carries any.
    pub phrase_no_kanji: Option<String>,
    /// Set whenever `re_nokanji` is present, even as an empty flag element.
    pub no_kanji: bool,
    pub restrictions: Vec<String>,
    pub info: Vec<String>,
    pub priorities: Vec<String>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Sense {
    pub parts_of_speech: Vec<String>,
    pub fields: Vec<String>,
    pub misc: Vec<String>,
    pub dialects: Vec<String>,
    pub cross_references: Vec<String>,
    pub antonyms: Vec<String>,
    pub notes: Vec<String>,
    pub source_languages: Vec<SourceLanguage>,
    pub glossary: Vec<Gloss>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SourceLanguage {
    pub language: String,
    pub kind: Option<String>,
    pub wasei: bool,
    pub text: String,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Gloss {
    pub language: String,
    pub gender: Option<String>,
    pub kind: Option<String>,
    pub definition: String,
}

impl Entry {
    /// Every non-empty phrase this entry can be looked up by, in document order.
    pub fn phrases(&self) -> impl Iterator<Item = &str> + '_ {
        let kanji = self.kanji.iter().map(|k| k.phrase.as_str());
        let readings = self.readings.iter().flat_map(|r| {
            std::iter::once(r.phrase.as_str()).chain(r.phrase_no_kanji.as_deref())
        });
        kanji.chain(readings).filter(|phrase| !phrase.is_empty())
    }

    pub fn glosses(&self) -> impl Iterator<Item = &Gloss> + '_ {
        self.senses.iter().flat_map(|sense| sense.glossary.iter())
    }

    /// Glosses whose language matches `lang`; an empty code on either side means English.
    pub fn glosses_in<'a>(&'a self, lang: &'a str) -> impl Iterator<Item = &'a Gloss> + 'a {
        let lang = normalize_language(lang);
        self.glosses()
            .filter(move |gloss| normalize_language(&gloss.language) == lang)
    }

    /// The phrase a quiz card shows: the first kanji spelling, or the first reading.
    pub fn headword(&self) -> Option<&str> {
        self.kanji
            .first()
            .map(|k| k.phrase.as_str())
            .or_else(|| self.readings.first().map(|r| r.phrase.as_str()))
    }
}

pub fn normalize_language(lang: &str) -> &str {
    if lang.is_empty() {
        DEFAULT_LANGUAGE
    } else {
        lang
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(phrase: &str, no_kanji: Option<&str>) -> ReadingElement {
        ReadingElement {
            phrase: phrase.to_string(),
            phrase_no_kanji: no_kanji.map(str::to_string),
            no_kanji: no_kanji.is_some(),
            ..Default::default()
        }
    }

    #[test]
    fn phrases_skip_empty_spellings() {
        let entry = Entry {
            entry_id: "1".into(),
            kanji: vec![KanjiElement {
                phrase: "今日".into(),
                ..Default::default()
            }],
            readings: vec![reading("きょう", None), reading("", Some("こんにち"))],
            senses: Vec::new(),
        };
        let phrases: Vec<_> = entry.phrases().collect();
        assert_eq!(phrases, vec!["今日", "きょう", "こんにち"]);
    }

    #[test]
    fn glosses_in_treats_empty_language_as_english() {
        let entry = Entry {
            senses: vec![Sense {
                glossary: vec![
                    Gloss {
                        definition: "cat".into(),
                        ..Default::default()
                    },
                    Gloss {
                        language: "spa".into(),
                        definition: "gato".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let eng: Vec<_> = entry.glosses_in("").map(|g| g.definition.as_str()).collect();
        assert_eq!(eng, vec!["cat"]);
        let spa: Vec<_> = entry.glosses_in("spa").map(|g| g.definition.as_str()).collect();
        assert_eq!(spa, vec!["gato"]);
    }
}
