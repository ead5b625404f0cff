//! Compiled lexicon snapshots.
//!
//! Layout: `JMLX`, one version byte, then a zstd frame holding the rkyv
//! archive of the entry list. Parsing the full JMdict XML takes seconds; a
//! snapshot only has to be decompressed and validated.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use zstd::stream::decode_all;

use crate::data::Entry;
use crate::lexicon::LexiconError;

pub const MAGIC: &[u8] = b"JMLX";
pub const VERSION: u8 = 1;

const COMPRESSION_LEVEL: i32 = 9;

pub fn encode(entries: &[Entry]) -> Result<Vec<u8>, LexiconError> {
    let archived = rkyv::to_bytes::<RkyvError>(&entries.to_vec())
        .map_err(|err| LexiconError::Snapshot(format!("failed to archive entries: {err}")))?;
    let compressed = zstd::bulk::compress(&archived, COMPRESSION_LEVEL)?;

    let mut out = Vec::with_capacity(MAGIC.len() + 1 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&compressed);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>, LexiconError> {
    let body = bytes
        .strip_prefix(MAGIC)
        .ok_or_else(|| LexiconError::Snapshot("missing JMLX magic".to_string()))?;
    let (&version, payload) = body
        .split_first()
        .ok_or_else(|| LexiconError::Snapshot("missing version byte".to_string()))?;
    if version != VERSION {
        return Err(LexiconError::Snapshot(format!(
            "unsupported snapshot version {version}, expected {VERSION}"
        )));
    }

    let decompressed = decode_all(Cursor::new(payload))?;
    let mut aligned: AlignedVec = AlignedVec::with_capacity(decompressed.len());
    aligned.extend_from_slice(&decompressed);
    rkyv::from_bytes::<Vec<Entry>, RkyvError>(&aligned)
        .map_err(|err| LexiconError::Snapshot(format!("invalid archive: {err}")))
}

pub fn write(entries: &[Entry], path: impl AsRef<Path>) -> Result<u64, LexiconError> {
    let path = path.as_ref();
    let bytes = encode(entries)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &bytes)?;
    Ok(bytes.len() as u64)
}

pub fn read(path: impl AsRef<Path>) -> Result<Vec<Entry>, LexiconError> {
    decode(&fs::read(path)?)
}
