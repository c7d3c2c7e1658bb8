mod catalog;
mod history;
mod kv;
mod schema;
mod seed;
mod types;

pub use catalog::CatalogStore;
pub use history::{HistoryLog, HISTORY_LIMIT};
pub use schema::Database;
pub use seed::{default_categories, default_menus};
pub use types::{Category, DatabaseError, Food, FoodDraft, FoodPatch, HistoryItem};
