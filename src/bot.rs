use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::{Analyzer, SelectionError};
use crate::command::{self, CommandKind, Invocation};
use crate::config::BotConfig;
use crate::format::{self, MessageLimits};
use crate::lexicon::Lexicon;
use crate::store::{Card, CardRepository, ChannelRepository, ChannelSettings, Store, now_ts};

const NO_PHRASE: &str = "You haven't entered a phrase!";
const NO_DEFINITIONS: &str = "No definitions found :(";
const NO_ANALYSIS: &str = "You haven't specified anything to be defined!";
const INVALID_INDEX: &str = "Definition index is invalid!";
const NO_ENTRY: &str = "No definition for this word!";
const ONE_FEATURE: &str = "Only one feature at a time please!";
const INVALID_FEATURE: &str = "That isn't a valid feature!";
const DONE: &str = "Done :)";
const NO_CARD: &str = "There's no card to answer yet!";
const CORRECT: &str = "Correct!";
const INCORRECT: &str = "Incorrect. Try again!";

/// A text message delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub raw_text: String,
    pub channel_id: String,
    #[serde(default)]
    pub author_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub command_prefix: String,
    pub default_language: String,
    pub limits: MessageLimits,
    pub card_chance: f64,
    pub bot_user_id: Option<String>,
    pub prefix_limit: usize,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

impl From<&BotConfig> for BotSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            command_prefix: config.command_prefix.clone(),
            default_language: config.default_language.clone(),
            limits: config.message_limits(),
            card_chance: config.card_chance,
            bot_user_id: config.bot_user_id.clone(),
            prefix_limit: config.prefix_limit,
        }
    }
}

/// Turns inbound messages into replies. Shared across concurrently running
/// command tasks; the lexicon is read-only and the per-channel state sits
/// behind the analyzer's lock and the repositories.
pub struct Bot {
    analyzer: Analyzer,
    channels: Arc<dyn ChannelRepository>,
    cards: Arc<dyn CardRepository>,
    settings: BotSettings,
}

impl Bot {
    pub fn new(lexicon: Arc<Lexicon>, store: Store, settings: BotSettings) -> Self {
        let channels: Arc<dyn ChannelRepository> = Arc::new(store.clone());
        let cards: Arc<dyn CardRepository> = Arc::new(store);
        Self::with_repositories(lexicon, channels, cards, settings)
    }

    pub fn with_repositories(
        lexicon: Arc<Lexicon>,
        channels: Arc<dyn ChannelRepository>,
        cards: Arc<dyn CardRepository>,
        settings: BotSettings,
    ) -> Self {
        Self {
            analyzer: Analyzer::new(lexicon),
            channels,
            cards,
            settings,
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Replies for one inbound message, in delivery order. Empty when the bot
    /// has nothing to say.
    pub fn handle(&self, event: &InboundEvent) -> Vec<String> {
        if let (Some(author), Some(me)) = (&event.author_id, &self.settings.bot_user_id) {
            if author == me {
                return Vec::new();
            }
        }
        match command::parse(&event.raw_text, &self.settings.command_prefix) {
            Some(invocation) => {
                debug!(
                    channel_id = %event.channel_id,
                    command = %invocation.keyword,
                    args = invocation.args.len(),
                    "dispatching command"
                );
                self.dispatch(&invocation, &event.channel_id)
            }
            None => self.maybe_post_card(&event.channel_id),
        }
    }

    fn dispatch(&self, invocation: &Invocation, channel_id: &str) -> Vec<String> {
        match invocation.kind {
            CommandKind::Analyse => self.analyse(invocation, channel_id),
            CommandKind::Help => vec![self.help()],
            CommandKind::Enable => vec![self.toggle_feature(invocation, channel_id, true)],
            CommandKind::Disable => vec![self.toggle_feature(invocation, channel_id, false)],
            CommandKind::Answer => vec![self.answer(invocation, channel_id)],
            CommandKind::Prefix => self.prefix(invocation),
        }
    }

    fn analyse(&self, invocation: &Invocation, channel_id: &str) -> Vec<String> {
        let phrase = invocation.phrase();
        if phrase.trim().is_empty() {
            return vec![NO_PHRASE.to_string()];
        }
        if is_digits(&phrase) {
            return self.select(invocation, channel_id, &phrase);
        }

        let matches = self.analyzer.analyse_for_channel(channel_id, &phrase);
        if matches.is_empty() {
            return vec![NO_DEFINITIONS.to_string()];
        }
        let hint = format!("{}!analyse", self.settings.command_prefix);
        format::pick_list(&matches, &hint, &self.settings.limits)
    }

    fn select(&self, invocation: &Invocation, channel_id: &str, digits: &str) -> Vec<String> {
        // too many digits for usize is just another out-of-range pick
        let index = digits.parse::<usize>().unwrap_or(usize::MAX);
        let lang = invocation
            .sub_args
            .first()
            .map(String::as_str)
            .unwrap_or(self.settings.default_language.as_str());
        match self.analyzer.select(channel_id, index) {
            Ok(selection) => format::definitions(&selection.entries, lang, &self.settings.limits),
            Err(err) => {
                debug!(channel_id, error = %err, "selection not found");
                let reply = match err {
                    SelectionError::NoAnalysis => NO_ANALYSIS,
                    SelectionError::OutOfRange { .. } => INVALID_INDEX,
                    SelectionError::NoEntries(_) => NO_ENTRY,
                };
                vec![reply.to_string()]
            }
        }
    }

    fn help(&self) -> String {
        let prefix = &self.settings.command_prefix;
        format!(
            "```\nAll commands begin with \"{prefix}!\"\n\n\
             Available Commands:\n\n\
             - analyse/analyze <phrase>: Find every dictionary word in a Japanese phrase.\n\
             - analyse[!lang] <number>: Show the definitions of a result from your last analysis.\n\
             - prefix <text>: List dictionary phrases starting with some text.\n\
             - enable/disable card: Turn the vocabulary card quiz on or off for this channel.\n\
             - answer <meaning>: Answer the latest card.\n\
             - help: This help text, silly!\n```"
        )
    }

    fn toggle_feature(&self, invocation: &Invocation, channel_id: &str, enable: bool) -> String {
        let verb = if enable { "enable" } else { "disable" };
        let feature = match invocation.args.as_slice() {
            [] => return format!("You need to enter the feature you'd like to {verb}!"),
            [feature] => feature.to_lowercase(),
            _ => return ONE_FEATURE.to_string(),
        };
        match feature.as_str() {
            "card" => {
                let settings = ChannelSettings {
                    channel_id: channel_id.to_string(),
                    card_mode: enable,
                };
                match self.channels.upsert(settings) {
                    Ok(()) => DONE.to_string(),
                    Err(err) => {
                        warn!(channel_id, error = %err, "failed to update channel settings");
                        format!("That failed: {err}")
                    }
                }
            }
            _ => INVALID_FEATURE.to_string(),
        }
    }

    fn answer(&self, invocation: &Invocation, channel_id: &str) -> String {
        let card = match self.cards.latest(channel_id) {
            Ok(Some(card)) => card,
            Ok(None) => return NO_CARD.to_string(),
            Err(err) => {
                warn!(channel_id, error = %err, "failed to read latest card");
                return format!("That failed: {err}");
            }
        };
        let answer = invocation.phrase().trim().to_lowercase();
        let correct = self
            .analyzer
            .lexicon()
            .by_id(&card.entry_id)
            .into_iter()
            .flat_map(|entry| entry.glosses())
            .any(|gloss| gloss.definition.to_lowercase() == answer);
        let reply = if correct { CORRECT } else { INCORRECT };
        reply.to_string()
    }

    fn prefix(&self, invocation: &Invocation) -> Vec<String> {
        let Some(prefix) = invocation.args.first() else {
            return vec!["You haven't entered a prefix!".to_string()];
        };
        let phrases = self
            .analyzer
            .lexicon()
            .prefix(prefix, self.settings.prefix_limit);
        if phrases.is_empty() {
            return vec![format!("No phrases start with {prefix}")];
        }
        let blocks = phrases.into_iter().map(|phrase| format!("{phrase}\n"));
        format::paginate(blocks, &self.settings.limits)
    }

    fn maybe_post_card(&self, channel_id: &str) -> Vec<String> {
        let card_mode = match self.channels.get(channel_id) {
            Ok(settings) => settings.is_some_and(|s| s.card_mode),
            Err(err) => {
                warn!(channel_id, error = %err, "failed to read channel settings");
                false
            }
        };
        if !card_mode || !(self.settings.card_chance > 0.0) {
            return Vec::new();
        }
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.settings.card_chance.min(1.0)) {
            return Vec::new();
        }
        let Some(card) = self.draw_card(channel_id, &mut rng) else {
            warn!(channel_id, "could not draw a card from the lexicon");
            return Vec::new();
        };
        let reply = format!("```Card:\nPhrase: {}\n```", card.phrase);
        match self.cards.insert(card) {
            Ok(()) => vec![reply],
            Err(err) => {
                warn!(channel_id, error = %err, "failed to store card");
                Vec::new()
            }
        }
    }

    fn draw_card<R: Rng>(&self, channel_id: &str, rng: &mut R) -> Option<Card> {
        let entry = self.analyzer.lexicon().entries().choose(rng)?;
        let phrase = if entry.kanji.is_empty() {
            entry.readings.choose(rng).map(|r| r.phrase.clone())
        } else {
            entry.kanji.choose(rng).map(|k| k.phrase.clone())
        }?;
        Some(Card {
            channel_id: channel_id.to_string(),
            phrase,
            entry_id: entry.entry_id.clone(),
            timestamp: now_ts(),
        })
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::tests::sample;
    use crate::store::StoreError;
    use crate::store::tests::unwritable_store;

    fn bot_with(settings: BotSettings) -> Bot {
        Bot::new(Arc::new(sample()), Store::ephemeral(), settings)
    }

    fn bot() -> Bot {
        bot_with(BotSettings::default())
    }

    fn say(bot: &Bot, channel: &str, text: &str) -> Vec<String> {
        bot.handle(&InboundEvent {
            raw_text: text.to_string(),
            channel_id: channel.to_string(),
            author_id: Some("user".to_string()),
        })
    }

    #[test]
    fn analyse_lists_matches_then_selection_defines() {
        let bot = bot();
        let replies = say(&bot, "c", "jpn!analyse 今日は");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("Pick a phrase:"));
        assert!(replies[0].contains("1: 日\n2: は\n3: 今日\n"));
        assert!(replies[0].contains("Use jpn!analyse [1-3]"));

        let replies = say(&bot, "c", "jpn!analyse 3");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("today"));
    }

    #[test]
    fn selection_honours_language_sub_argument() {
        let bot = bot();
        say(&bot, "c", "jpn!analyse こんにちは");
        let replies = say(&bot, "c", "jpn!analyse!spa 3");
        assert!(replies[0].contains("buenas tardes"));
        assert!(!replies[0].contains("hello"));
    }

    #[test]
    fn missing_phrase_and_no_matches() {
        let bot = bot();
        assert_eq!(say(&bot, "c", "jpn!analyse"), vec![NO_PHRASE]);
        assert_eq!(say(&bot, "c", "jpn!analyse xyz"), vec![NO_DEFINITIONS]);
    }

    #[test]
    fn selection_errors_become_messages() {
        let bot = bot();
        assert_eq!(say(&bot, "c", "jpn!analyse 1"), vec![NO_ANALYSIS]);
        say(&bot, "c", "jpn!analyse 猫");
        assert_eq!(say(&bot, "c", "jpn!analyse 2"), vec![INVALID_INDEX]);
        assert_eq!(say(&bot, "c", "jpn!analyse 0"), vec![INVALID_INDEX]);
        assert_eq!(
            say(&bot, "c", "jpn!analyse 99999999999999999999999"),
            vec![INVALID_INDEX]
        );
    }

    #[test]
    fn help_mentions_prefix() {
        let replies = say(&bot(), "c", "jpn!help");
        assert!(replies[0].contains("All commands begin with \"jpn!\""));
    }

    #[test]
    fn chatter_without_card_mode_is_silent() {
        assert!(say(&bot(), "c", "just chatting").is_empty());
    }

    #[test]
    fn own_messages_are_ignored() {
        let bot = bot_with(BotSettings {
            bot_user_id: Some("me".into()),
            ..Default::default()
        });
        let replies = bot.handle(&InboundEvent {
            raw_text: "jpn!help".into(),
            channel_id: "c".into(),
            author_id: Some("me".into()),
        });
        assert!(replies.is_empty());
    }

    #[test]
    fn feature_toggle_validates_arguments() {
        let bot = bot();
        assert_eq!(
            say(&bot, "c", "jpn!enable"),
            vec!["You need to enter the feature you'd like to enable!"]
        );
        assert_eq!(say(&bot, "c", "jpn!disable card quiz"), vec![ONE_FEATURE]);
        assert_eq!(say(&bot, "c", "jpn!enable lasers"), vec![INVALID_FEATURE]);
        assert_eq!(say(&bot, "c", "jpn!enable CARD"), vec![DONE]);
    }

    #[test]
    fn card_quiz_round_trip() {
        let bot = bot_with(BotSettings {
            card_chance: 1.0,
            ..Default::default()
        });
        assert_eq!(say(&bot, "c", "jpn!answer cat"), vec![NO_CARD]);
        say(&bot, "c", "jpn!enable card");

        let posted = say(&bot, "c", "anyone here?");
        assert_eq!(posted.len(), 1);
        assert!(posted[0].starts_with("```Card:\nPhrase: "));

        let card = bot.cards.latest("c").unwrap().unwrap();
        let entry = bot.analyzer.lexicon().by_id(&card.entry_id)[0];
        assert!(entry.phrases().any(|p| p == card.phrase));
        let gloss = entry.glosses().next().unwrap().definition.to_uppercase();

        assert_eq!(say(&bot, "c", &format!("jpn!answer {gloss}")), vec![CORRECT]);
        assert_eq!(say(&bot, "c", "jpn!answer definitely wrong"), vec![INCORRECT]);

        say(&bot, "c", "jpn!disable card");
        assert!(say(&bot, "c", "quiet now").is_empty());
    }

    #[test]
    fn prefix_lists_phrases() {
        let bot = bot();
        let replies = say(&bot, "c", "jpn!prefix 日本");
        assert_eq!(replies, vec!["```\n日本\n日本語\n```"]);
        assert_eq!(say(&bot, "c", "jpn!prefix"), vec!["You haven't entered a prefix!"]);
    }

    struct BrokenStore;

    impl ChannelRepository for BrokenStore {
        fn get(&self, _: &str) -> Result<Option<ChannelSettings>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }
        fn upsert(&self, _: ChannelSettings) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }
    }

    #[test]
    fn store_failures_are_reported_not_fatal() {
        let bot = Bot::with_repositories(
            Arc::new(sample()),
            Arc::new(BrokenStore),
            Arc::new(Store::ephemeral()),
            BotSettings::default(),
        );
        assert_eq!(
            say(&bot, "c", "jpn!enable card"),
            vec!["That failed: IO error: disk on fire"]
        );
        assert!(say(&bot, "c", "hello").is_empty());
    }

    #[test]
    fn failed_enable_does_not_turn_card_mode_on() {
        let dir = tempfile::tempdir().unwrap();
        let bot = Bot::new(
            Arc::new(sample()),
            unwritable_store(dir.path()),
            BotSettings {
                card_chance: 1.0,
                ..Default::default()
            },
        );
        let reply = say(&bot, "c", "jpn!enable card");
        assert!(reply[0].starts_with("That failed: IO error:"), "{reply:?}");
        assert_eq!(bot.channels.get("c").unwrap(), None);
        assert!(say(&bot, "c", "hello").is_empty());
    }

    #[test]
    fn unsaved_card_is_neither_posted_nor_answerable() {
        let dir = tempfile::tempdir().unwrap();
        let channels = Store::ephemeral();
        channels
            .upsert(ChannelSettings {
                channel_id: "c".into(),
                card_mode: true,
            })
            .unwrap();
        let bot = Bot::with_repositories(
            Arc::new(sample()),
            Arc::new(channels),
            Arc::new(unwritable_store(dir.path())),
            BotSettings {
                card_chance: 1.0,
                ..Default::default()
            },
        );
        assert!(say(&bot, "c", "anyone here?").is_empty());
        assert_eq!(bot.cards.latest("c").unwrap(), None);
        assert_eq!(say(&bot, "c", "jpn!answer hello"), vec![NO_CARD]);
    }
}
