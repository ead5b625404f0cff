//! Per-channel bot state: feature toggles and quiz cards.
//!
//! Each persisted entity gets a small repository trait. [`Store`] implements
//! both over one JSON document, written through on every change.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MAX_CARDS_PER_CHANNEL: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("store document is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub channel_id: String,
    pub card_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub channel_id: String,
    pub phrase: String,
    pub entry_id: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

pub trait ChannelRepository: Send + Sync {
    fn get(&self, channel_id: &str) -> Result<Option<ChannelSettings>, StoreError>;
    fn upsert(&self, settings: ChannelSettings) -> Result<(), StoreError>;
}

pub trait CardRepository: Send + Sync {
    /// Newest card posted in the channel.
    fn latest(&self, channel_id: &str) -> Result<Option<Card>, StoreError>;
    fn insert(&self, card: Card) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct Store {
    shared: Arc<StoreShared>,
}

struct StoreShared {
    inner: Mutex<StoreData>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    channels: Vec<ChannelSettings>,
    #[serde(default)]
    cards: Vec<Card>,
}

impl Store {
    /// Opens (or starts) a store backed by the JSON document at `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let bytes = fs::read(&path)?;
            let data: StoreData = serde_json::from_slice(&bytes)?;
            info!(
                path = %path.display(),
                channels = data.channels.len(),
                cards = data.cards.len(),
                "opened store"
            );
            data
        } else {
            StoreData::default()
        };
        Ok(Self::with_data(data, Some(path)))
    }

    /// A store that lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self::with_data(StoreData::default(), None)
    }

    fn with_data(data: StoreData, path: Option<PathBuf>) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                inner: Mutex::new(data),
                path,
            }),
        }
    }

    /// Applies `change` to a copy of the document and keeps it only once the
    /// copy has been written out.
    fn update(&self, change: impl FnOnce(&mut StoreData)) -> Result<(), StoreError> {
        let mut guard = self.shared.inner.lock();
        let mut next = guard.clone();
        change(&mut next);
        if let Some(path) = &self.shared.path {
            write_document(path, &next)?;
            debug!(path = %path.display(), "flushed store");
        }
        *guard = next;
        Ok(())
    }
}

fn write_document(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(data)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ChannelRepository for Store {
    fn get(&self, channel_id: &str) -> Result<Option<ChannelSettings>, StoreError> {
        let guard = self.shared.inner.lock();
        Ok(guard
            .channels
            .iter()
            .find(|c| c.channel_id == channel_id)
            .cloned())
    }

    fn upsert(&self, settings: ChannelSettings) -> Result<(), StoreError> {
        self.update(|data| {
            match data
                .channels
                .iter_mut()
                .find(|c| c.channel_id == settings.channel_id)
            {
                Some(existing) => *existing = settings,
                None => data.channels.push(settings),
            }
        })
    }
}

impl CardRepository for Store {
    fn latest(&self, channel_id: &str) -> Result<Option<Card>, StoreError> {
        let guard = self.shared.inner.lock();
        Ok(guard
            .cards
            .iter()
            .filter(|card| card.channel_id == channel_id)
            .max_by_key(|card| card.timestamp)
            .cloned())
    }

    fn insert(&self, card: Card) -> Result<(), StoreError> {
        self.update(|data| {
            let channel_id = card.channel_id.clone();
            data.cards.push(card);
            let in_channel = data
                .cards
                .iter()
                .filter(|c| c.channel_id == channel_id)
                .count();
            if in_channel > MAX_CARDS_PER_CHANNEL {
                if let Some(oldest) = data
                    .cards
                    .iter()
                    .position(|c| c.channel_id == channel_id)
                {
                    data.cards.remove(oldest);
                }
            }
        })
    }
}

pub fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
