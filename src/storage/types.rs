use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of nyam appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates the database file is held by another process.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A menu category. The five categories are fixed at seed time; `active` is
/// the only field that ever changes and controls whether the category's items
/// enter the candidate pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub active: bool,
}

/// A selectable menu item.
///
/// `category_id` should reference a live category, but the catalog does not
/// enforce referential integrity at write time. A dangling reference simply
/// never shows up in the filtered candidate pool.
///
/// Serialized with the same camelCase keys the web client wrote to
/// localStorage, so an exported blob round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub category_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A new menu item before the catalog assigns it an id.
#[derive(Debug, Clone)]
pub struct FoodDraft {
    pub name: String,
    pub emoji: String,
    pub category_id: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl FoodDraft {
    pub(crate) fn into_food(self, id: i64) -> Food {
        Food {
            id,
            name: self.name,
            emoji: self.emoji,
            category_id: self.category_id,
            description: self.description,
            image_url: self.image_url,
        }
    }
}

/// A partial update to a menu item.
///
/// The outer `Option` distinguishes "leave unchanged" (`None`) from "change"
/// (`Some`). For the optional text fields the inner `Option` then
/// distinguishes "set to this value" from "clear the field":
/// `description: Some(None)` removes a description while
/// `description: None` keeps whatever is stored.
#[derive(Debug, Clone, Default)]
pub struct FoodPatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub category_id: Option<i64>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

/// One past spin result. `food` is a snapshot taken at spin time, not a live
/// reference; later edits or deletion of the menu item leave history intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: i64,
    pub food: Food,
    pub created_at: DateTime<Utc>,
}
