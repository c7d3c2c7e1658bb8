use anyhow::Result;
use chrono::Utc;

use super::schema::Database;
use super::types::{Food, HistoryItem};

const HISTORY_KEY: &str = "food-roulette-history";

/// Maximum number of history entries kept. The 51st insertion evicts the oldest.
pub const HISTORY_LIMIT: usize = 50;

/// Bounded, most-recent-first log of past spins.
///
/// Ids are monotonically increasing per store lifetime; after a reload the
/// counter is recomputed from the stored entries so ids never collide.
pub struct HistoryLog {
    db: Database,
    entries: Vec<HistoryItem>,
    next_id: i64,
}

impl HistoryLog {
    /// Load the history from storage. An absent or corrupt blob yields an
    /// empty log.
    pub async fn load(db: Database) -> Result<Self> {
        let entries: Vec<HistoryItem> = db.get(HISTORY_KEY, Vec::new()).await?;
        let next_id = entries.iter().map(|e| e.id).max().map_or(1, |max| max + 1);
        Ok(Self {
            db,
            entries,
            next_id,
        })
    }

    pub fn entries(&self) -> &[HistoryItem] {
        &self.entries
    }

    /// Record a spin result. The food is snapshotted, the entry goes to the
    /// front, and the log is truncated to [`HISTORY_LIMIT`] before persisting.
    pub async fn add(&mut self, food: Food) -> Result<HistoryItem> {
        let item = HistoryItem {
            id: self.next_id,
            food,
            created_at: Utc::now(),
        };
        self.next_id += 1;

        self.entries.insert(0, item.clone());
        self.entries.truncate(HISTORY_LIMIT);
        self.persist().await?;
        Ok(item)
    }

    /// Remove one entry by id and persist. Returns whether anything was removed.
    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Empty the log and persist.
    pub async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        self.db.set(HISTORY_KEY, &self.entries).await
    }
}
