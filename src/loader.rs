use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::data::{
    DEFAULT_LANGUAGE, Entry, Gloss, KanjiElement, ReadingElement, Sense, SourceLanguage,
};
use crate::entities;
use crate::lexicon::LexiconError;

/// Parses a JMdict document into entries, preserving document order.
pub fn parse_entries<R: BufRead>(source: R) -> Result<Vec<Entry>, LexiconError> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    let mut state = ParseState::default();
    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(err) => return Err(parse_error(&reader, err)),
        };
        match event {
            Event::Start(start) => state.open(&start).map_err(|err| parse_error(&reader, err))?,
            Event::Empty(start) => {
                state.open(&start).map_err(|err| parse_error(&reader, err))?;
                state.close(start.name().as_ref());
            }
            Event::Text(text) => {
                let value = text
                    .unescape_with(entities::resolve)
                    .map_err(|err| parse_error(&reader, err))?;
                state.text.push_str(&value);
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let value = std::str::from_utf8(&bytes).map_err(|err| LexiconError::Parse {
                    position: reader.buffer_position(),
                    message: format!("CDATA is not valid UTF-8: {err}"),
                })?;
                state.text.push_str(value);
            }
            Event::End(end) => state.close(end.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !state.stack.is_empty() {
        return Err(LexiconError::Parse {
            position: reader.buffer_position(),
            message: format!(
                "document ended inside <{}>",
                state.stack.last().map(String::as_str).unwrap_or_default()
            ),
        });
    }
    debug!(entries = state.entries.len(), "parsed JMdict document");
    Ok(state.entries)
}

fn parse_error<R>(reader: &Reader<R>, err: quick_xml::Error) -> LexiconError {
    LexiconError::Parse {
        position: reader.buffer_position(),
        message: err.to_string(),
    }
}

#[derive(Default)]
struct ParseState {
    entries: Vec<Entry>,
    stack: Vec<String>,
    text: String,
    entry: Option<Entry>,
    kanji: Option<KanjiElement>,
    reading: Option<ReadingElement>,
    sense: Option<Sense>,
    gloss: Option<Gloss>,
    source: Option<SourceLanguage>,
}

impl ParseState {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        self.text.clear();
        match name.as_str() {
            "entry" => self.entry = Some(Entry::default()),
            "k_ele" => self.kanji = Some(KanjiElement::default()),
            "r_ele" => self.reading = Some(ReadingElement::default()),
            "sense" => self.sense = Some(Sense::default()),
            "gloss" => {
                let mut gloss = Gloss {
                    language: DEFAULT_LANGUAGE.to_string(),
                    ..Default::default()
                };
                for attr in start.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"lang" if !value.is_empty() => gloss.language = value,
                        b"g_gend" => gloss.gender = Some(value),
                        b"g_type" => gloss.kind = Some(value),
                        _ => {}
                    }
                }
                self.gloss = Some(gloss);
            }
            "lsource" => {
                let mut source = SourceLanguage {
                    language: DEFAULT_LANGUAGE.to_string(),
                    ..Default::default()
                };
                for attr in start.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"lang" if !value.is_empty() => source.language = value,
                        b"ls_type" => source.kind = Some(value),
                        b"ls_wasei" => source.wasei = value == "y",
                        _ => {}
                    }
                }
                self.source = Some(source);
            }
            _ => {}
        }
        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        self.stack.pop();
        let text = std::mem::take(&mut self.text);
        match name {
            b"entry" => {
                if let Some(entry) = self.entry.take() {
                    self.entries.push(entry);
                }
            }
            b"ent_seq" => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.entry_id = text;
                }
            }
            b"k_ele" => {
                if let (Some(entry), Some(kanji)) = (self.entry.as_mut(), self.kanji.take()) {
                    entry.kanji.push(kanji);
                }
            }
            b"keb" => with(&mut self.kanji, |k| k.phrase = text),
            b"ke_inf" => with(&mut self.kanji, |k| k.info.push(text)),
            b"ke_pri" => with(&mut self.kanji, |k| k.priorities.push(text)),
            b"r_ele" => {
                if let (Some(entry), Some(reading)) = (self.entry.as_mut(), self.reading.take()) {
                    entry.readings.push(reading);
                }
            }
            b"reb" => with(&mut self.reading, |r| r.phrase = text),
            b"re_nokanji" => with(&mut self.reading, |r| {
                r.no_kanji = true;
                r.phrase_no_kanji = (!text.is_empty()).then_some(text);
            }),
            b"re_restr" => with(&mut self.reading, |r| r.restrictions.push(text)),
            b"re_inf" => with(&mut self.reading, |r| r.info.push(text)),
            b"re_pri" => with(&mut self.reading, |r| r.priorities.push(text)),
            b"sense" => {
                if let (Some(entry), Some(sense)) = (self.entry.as_mut(), self.sense.take()) {
                    entry.senses.push(sense);
                }
            }
            b"pos" => with(&mut self.sense, |s| s.parts_of_speech.push(text)),
            b"field" => with(&mut self.sense, |s| s.fields.push(text)),
            b"misc" => with(&mut self.sense, |s| s.misc.push(text)),
            b"dial" => with(&mut self.sense, |s| s.dialects.push(text)),
            b"xref" => with(&mut self.sense, |s| s.cross_references.push(text)),
            b"ant" => with(&mut self.sense, |s| s.antonyms.push(text)),
            b"s_inf" => with(&mut self.sense, |s| s.notes.push(text)),
            b"lsource" => {
                if let Some(mut source) = self.source.take() {
                    source.text = text;
                    with(&mut self.sense, |s| s.source_languages.push(source));
                }
            }
            b"gloss" => {
                if let Some(mut gloss) = self.gloss.take() {
                    gloss.definition = text;
                    with(&mut self.sense, |s| s.glossary.push(gloss));
                }
            }
            _ => {}
        }
    }
}

fn with<T>(slot: &mut Option<T>, apply: impl FnOnce(&mut T)) {
    if let Some(value) = slot.as_mut() {
        apply(value);
    }
}
