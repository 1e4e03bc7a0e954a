use std::collections::HashMap;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemId},
};

/// Genre filter value that disables genre filtering
pub const ALL_GENRES: &str = "all";

/// Immutable catalog snapshot
///
/// Ids are unique within a snapshot. The catalog is swapped wholesale and never
/// edited in place.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids
    pub fn new(items: Vec<Item>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.id, position).is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate item id {} in catalog",
                    item.id
                )));
            }
        }

        Ok(Self { items, index })
    }

    /// Loads a catalog from a JSON array of items
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read catalog {}: {}", path.display(), e))?;
        let items: Vec<Item> = serde_json::from_str(&contents)?;
        Ok(Self::new(items)?)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items matching an optional search query and genre, in catalog order
    ///
    /// The query is a case-insensitive substring match on title or genre. The
    /// genre must match a tag exactly; `all` disables the filter.
    pub fn filter(&self, query: Option<&str>, genre: Option<&str>) -> Vec<Item> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let genre = genre.filter(|g| !g.is_empty() && *g != ALL_GENRES);

        self.items
            .iter()
            .filter(|item| query.map_or(true, |q| item.matches_query(q)))
            .filter(|item| genre.map_or(true, |g| item.has_genre(g)))
            .cloned()
            .collect()
    }
}
