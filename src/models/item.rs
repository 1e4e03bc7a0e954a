use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};

/// Closed genre vocabulary of the MovieLens catalog
pub const GENRE_VOCABULARY: [&str; 19] = [
    "Unknown",
    "Action",
    "Adventure",
    "Animation",
    "Children's",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "Film-Noir",
    "Horror",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
];

/// Sentinel tag for items that carry no genre at all
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Catalog item identifier, stable across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ItemId)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId(id)
    }
}

/// Genre tag
///
/// Tags are opaque: anything outside [`GENRE_VOCABULARY`] is still a valid tag and
/// simply compares by string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genre(String);

impl Genre {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_GENRE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tag belongs to the closed vocabulary
    pub fn is_known(&self) -> bool {
        GENRE_VOCABULARY.contains(&self.0.as_str())
    }
}

impl Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Genre {
    fn from(tag: &str) -> Self {
        Genre::new(tag)
    }
}

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Ordered, duplicate-free, never empty
    #[serde(deserialize_with = "deserialize_genres", default = "default_genres")]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub release_year: Option<i32>,
}

impl Item {
    /// Creates an item, normalizing its genre list
    pub fn new(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        genres: Vec<Genre>,
        release_year: Option<i32>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genres: normalize_genres(genres),
            release_year,
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.as_str() == genre)
    }

    /// Case-insensitive substring match on the title or any genre tag
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self
                .genres
                .iter()
                .any(|g| g.as_str().to_lowercase().contains(&query))
    }
}

/// Drops blank and duplicate tags, falling back to the `Unknown` sentinel
fn normalize_genres(genres: Vec<Genre>) -> Vec<Genre> {
    let mut normalized: Vec<Genre> = Vec::with_capacity(genres.len());
    for genre in genres {
        let tag = genre.as_str().trim();
        if tag.is_empty() || normalized.iter().any(|g| g.as_str() == tag) {
            continue;
        }
        normalized.push(Genre::new(tag));
    }

    if normalized.is_empty() {
        normalized.push(Genre::unknown());
    }
    normalized
}

fn default_genres() -> Vec<Genre> {
    vec![Genre::unknown()]
}

fn deserialize_genres<'de, D>(deserializer: D) -> Result<Vec<Genre>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Genre>>::deserialize(deserializer)?;
    Ok(normalize_genres(raw.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_genres_fall_back_to_unknown() {
        let item = Item::new(1u64, "Heat", vec![], Some(1995));
        assert_eq!(item.genres, vec![Genre::unknown()]);
    }

    #[test]
    fn test_duplicate_genres_collapse_in_order() {
        let item = Item::new(
            1u64,
            "Heat",
            vec!["Crime".into(), "Action".into(), "Crime".into(), " ".into()],
            None,
        );
        assert_eq!(item.genres, vec![Genre::from("Crime"), Genre::from("Action")]);
    }

    #[test]
    fn test_deserialize_normalizes_genres() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Fargo",
            "genres": ["Crime", "Drama", "Crime"]
        }))
        .unwrap();
        assert_eq!(item.id, ItemId(7));
        assert_eq!(item.genres.len(), 2);
        assert_eq!(item.release_year, None);

        let item: Item = serde_json::from_value(serde_json::json!({
            "id": 8,
            "title": "Untagged",
            "genres": null
        }))
        .unwrap();
        assert_eq!(item.genres, vec![Genre::unknown()]);
    }

    #[test]
    fn test_unknown_tags_are_accepted() {
        let genre = Genre::from("Mumblecore");
        assert!(!genre.is_known());
        assert!(Genre::from("Film-Noir").is_known());

        let item = Item::new(1u64, "Funny Ha Ha", vec![genre.clone()], None);
        assert_eq!(item.genres, vec![genre]);
    }

    #[test]
    fn test_matches_query() {
        let item = Item::new(1u64, "Toy Story", vec!["Animation".into()], Some(1995));
        assert!(item.matches_query("toy"));
        assert!(item.matches_query("ANIM"));
        assert!(!item.matches_query("western"));
    }

    #[test]
    fn test_item_id_parses_from_provider_string() {
        assert_eq!(" 42".parse::<ItemId>().unwrap(), ItemId(42));
        assert!("tt0114369".parse::<ItemId>().is_err());
    }
}
