//! JMdict lookups for chat: find every dictionary word inside a Japanese
//! phrase, let a channel pick one of them, and reply with its definitions in
//! message-sized chunks.
//!
//! [`Lexicon`] owns the parsed dictionary and its phrase index,
//! [`Analyzer`] runs the n-gram search and keeps the per-channel pick lists,
//! and [`Bot`] turns inbound messages into replies.

pub mod analysis;
pub mod bot;
pub mod command;
pub mod config;
pub mod data;
pub mod entities;
pub mod format;
pub mod lexicon;
pub mod loader;
#[cfg(feature = "cli")]
pub mod logging;
pub mod ngram;
pub mod snapshot;
pub mod store;
#[cfg(feature = "web")]
pub mod web;

pub use analysis::{Analyzer, Selection, SelectionError};
pub use bot::{Bot, BotSettings, InboundEvent};
pub use config::{BotConfig, ConfigError};
pub use data::{Entry, Gloss, KanjiElement, ReadingElement, Sense, SourceLanguage};
pub use format::MessageLimits;
pub use lexicon::{Lexicon, LexiconError};
pub use ngram::{NgramError, create_ngrams};
pub use store::{Card, CardRepository, ChannelRepository, ChannelSettings, Store, StoreError};
