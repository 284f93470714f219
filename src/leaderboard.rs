use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

pub const MAX_ENTRIES: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Best scores, highest first. Equal scores keep insertion order, so a
/// newcomer tying the last place does not displace it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn from_entries(mut entries: Vec<ScoreEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);
        Self { entries }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Inserts a score and returns its rank (0 = best), or `None` if it did
    /// not make the list.
    pub fn record(&mut self, name: impl Into<String>, score: u32) -> Option<usize> {
        let rank = self.entries.iter().take_while(|e| e.score >= score).count();
        if rank >= MAX_ENTRIES {
            return None;
        }
        self.entries.insert(
            rank,
            ScoreEntry {
                name: name.into(),
                score,
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        Some(rank)
    }
}

pub trait ScoreStore {
    fn load(&self) -> Result<Vec<ScoreEntry>, StoreError>;
    fn save(&self, entries: &[ScoreEntry]) -> Result<(), StoreError>;
}

/// Keeps the list as a JSON array of `{ "name", "score" }` records.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, entries: &[ScoreEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), entries = entries.len(), "leaderboard saved");
        Ok(())
    }
}

/// Loads the list, starting empty when the store is unreadable.
pub fn load_or_default(store: &impl ScoreStore) -> Leaderboard {
    match store.load() {
        Ok(entries) => Leaderboard::from_entries(entries),
        Err(err) => {
            warn!(%err, "could not load leaderboard, starting empty");
            Leaderboard::default()
        }
    }
}
