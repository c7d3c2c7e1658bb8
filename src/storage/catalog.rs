use anyhow::Result;

use crate::util::{validate_draft, validate_patch};

use super::schema::Database;
use super::seed::{default_categories, default_menus};
use super::types::{Category, Food, FoodDraft, FoodPatch};

/// localStorage-era keys, kept so a blob exported from the web client loads as-is.
const MENUS_KEY: &str = "food-roulette-menus";
const CATEGORIES_KEY: &str = "food-roulette-categories";

/// Sole owner of the menu items and their categories.
///
/// Other components (the selection engine, the CLI) read the collections by
/// reference; nothing else holds a parallel copy of the categories, so there
/// is exactly one `active` flag per category to toggle.
///
/// Every mutating operation writes the affected collection back to the
/// database in full before returning.
pub struct CatalogStore {
    db: Database,
    menus: Vec<Food>,
    categories: Vec<Category>,
}

impl CatalogStore {
    /// Load the catalog, installing the built-in seed data on first run.
    ///
    /// An absent or unparsable stored collection falls back to the seed list
    /// and is persisted immediately; content problems never fail the load.
    pub async fn load(db: Database) -> Result<Self> {
        let menus = match db.get_opt::<Vec<Food>>(MENUS_KEY).await? {
            Some(menus) => menus,
            None => {
                let menus = default_menus();
                db.set(MENUS_KEY, &menus).await?;
                tracing::info!(count = menus.len(), "Installed default menu list");
                menus
            }
        };

        let categories = match db.get_opt::<Vec<Category>>(CATEGORIES_KEY).await? {
            Some(categories) => categories,
            None => {
                let categories = default_categories();
                db.set(CATEGORIES_KEY, &categories).await?;
                categories
            }
        };

        Ok(Self {
            db,
            menus,
            categories,
        })
    }

    pub fn menus(&self) -> &[Food] {
        &self.menus
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn menus_by_category(&self, category_id: i64) -> Vec<&Food> {
        self.menus
            .iter()
            .filter(|m| m.category_id == category_id)
            .collect()
    }

    pub fn category_by_id(&self, category_id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Next id a new menu item would receive: `max(existing) + 1`, or 1 when
    /// the catalog is empty. Ids are not recycled while larger ones exist.
    pub fn next_id(&self) -> i64 {
        self.menus.iter().map(|m| m.id).max().map_or(1, |max| max + 1)
    }

    /// Add a new menu item and persist. Returns the created item.
    ///
    /// The draft is sanitized and validated first; there is no uniqueness
    /// check on the name.
    pub async fn add(&mut self, draft: FoodDraft) -> Result<Food> {
        let draft = validate_draft(draft)?;
        let food = draft.into_food(self.next_id());
        self.menus.push(food.clone());
        self.persist_menus().await?;
        tracing::debug!(id = food.id, name = %food.name, "Added menu item");
        Ok(food)
    }

    /// Apply a partial update and persist.
    ///
    /// Returns `Ok(None)` when no item has the given id; the stored
    /// collection is left untouched in that case. See [`FoodPatch`] for the
    /// leave-unchanged / set / clear convention on optional fields.
    pub async fn update(&mut self, id: i64, patch: FoodPatch) -> Result<Option<Food>> {
        let patch = validate_patch(patch)?;

        let Some(food) = self.menus.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            food.name = name;
        }
        if let Some(emoji) = patch.emoji {
            food.emoji = emoji;
        }
        if let Some(category_id) = patch.category_id {
            food.category_id = category_id;
        }
        if let Some(description) = patch.description {
            food.description = description;
        }
        if let Some(image_url) = patch.image_url {
            food.image_url = image_url;
        }

        let updated = food.clone();
        self.persist_menus().await?;
        Ok(Some(updated))
    }

    /// Remove a menu item by id and persist. Returns whether anything was removed.
    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.menus.len();
        self.menus.retain(|m| m.id != id);
        if self.menus.len() == before {
            return Ok(false);
        }
        self.persist_menus().await?;
        Ok(true)
    }

    /// Flip a category's `active` flag and persist. Returns the new flag, or
    /// `None` if the id is unknown (no-op).
    pub async fn toggle_category(&mut self, category_id: i64) -> Result<Option<bool>> {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) else {
            return Ok(None);
        };
        category.active = !category.active;
        let active = category.active;
        self.persist_categories().await?;
        Ok(Some(active))
    }

    /// Discard the current menu list and reinstall the seed list.
    pub async fn reset_to_default(&mut self) -> Result<()> {
        self.menus = default_menus();
        self.persist_menus().await?;
        tracing::info!("Menu list reset to defaults");
        Ok(())
    }

    async fn persist_menus(&self) -> Result<()> {
        self.db.set(MENUS_KEY, &self.menus).await
    }

    async fn persist_categories(&self) -> Result<()> {
        self.db.set(CATEGORIES_KEY, &self.categories).await
    }
}
