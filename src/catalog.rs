// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::models::{ALL_GENRES, Category, Channel, Episode, Genre, Item, Tab};
use std::collections::HashMap;

/// One row of the category/genre sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub id: String,
    pub name: String,
    /// Known only for live genres; the portal does not count VOD categories.
    pub count: Option<usize>,
}

impl std::fmt::Display for SidebarEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.count {
            Some(count) => write!(f, "{} ({})", self.name, count),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Last-fetched collections for the connected portal. Pure in-memory state;
/// nothing here performs I/O.
#[derive(Debug, Default)]
pub struct CatalogStore {
    genres: HashMap<String, String>,
    channels: Vec<Channel>,
    vod_categories: Vec<Category>,
    series_categories: Vec<Category>,
    items: HashMap<(Tab, String), Vec<Item>>,
    episodes: HashMap<String, Vec<Episode>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_genres(&mut self, genres: Vec<Genre>) {
        self.genres = genres.into_iter().map(|g| (g.id, g.title)).collect();
    }

    pub fn set_channels(&mut self, channels: Vec<Channel>) {
        self.channels = channels;
    }

    pub fn has_channels(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn set_vod_categories(&mut self, categories: Vec<Category>) {
        self.vod_categories = categories;
    }

    pub fn set_series_categories(&mut self, categories: Vec<Category>) {
        self.series_categories = categories;
    }

    /// Replace, or with `append` extend in arrival order, the items of a
    /// `(tab, category)` pair.
    pub fn set_items(&mut self, tab: Tab, category_id: &str, list: Vec<Item>, append: bool) {
        let slot = self.items.entry((tab, category_id.to_string())).or_default();
        if append {
            slot.extend(list);
        } else {
            *slot = list;
        }
    }

    pub fn items(&self, tab: Tab, category_id: &str) -> &[Item] {
        self.items
            .get(&(tab, category_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop every cached item list of a tab so the next visit refetches.
    pub fn clear_items(&mut self, tab: Tab) {
        self.items.retain(|(t, _), _| *t != tab);
    }

    pub fn set_episodes(&mut self, series_id: &str, episodes: Vec<Episode>) {
        self.episodes.insert(series_id.to_string(), episodes);
    }

    pub fn episodes(&self, series_id: &str) -> &[Episode] {
        self.episodes
            .get(series_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn clear_episodes(&mut self) {
        self.episodes.clear();
    }

    pub fn genre_name_for(&self, genre_id: &str) -> String {
        self.genres
            .get(genre_id)
            .cloned()
            .unwrap_or_else(|| format!("Genre {}", genre_id))
    }

    pub fn filtered_channels(&self, category_id: &str) -> Vec<&Channel> {
        if category_id == ALL_GENRES {
            return self.channels.iter().collect();
        }
        self.channels
            .iter()
            .filter(|c| c.genre_id.as_deref() == Some(category_id))
            .collect()
    }

    /// Channels of a genre whose name contains `term` (already lowercased).
    pub fn search_channels(&self, category_id: &str, term: &str) -> Vec<&Channel> {
        self.filtered_channels(category_id)
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(term))
            .collect()
    }

    pub fn categories(&self, tab: Tab) -> &[Category] {
        match tab {
            Tab::Live => &[],
            Tab::Movies => &self.vod_categories,
            Tab::Series => &self.series_categories,
        }
    }

    pub fn category_title(&self, tab: Tab, category_id: &str) -> Option<&str> {
        self.categories(tab)
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.title.as_str())
    }

    pub fn filter_categories(&self, tab: Tab, term: &str) -> Vec<&Category> {
        self.categories(tab)
            .iter()
            .filter(|c| c.title.to_lowercase().contains(term))
            .collect()
    }

    /// "All Channels" followed by every genre present among the channels, in
    /// first-seen order, with counts.
    pub fn live_genres(&self) -> Vec<SidebarEntry> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for genre_id in self.channels.iter().filter_map(|c| c.genre_id.as_deref()) {
            let count = counts.entry(genre_id).or_insert(0);
            if *count == 0 {
                order.push(genre_id);
            }
            *count += 1;
        }

        let mut entries = vec![SidebarEntry {
            id: ALL_GENRES.to_string(),
            name: "All Channels".to_string(),
            count: Some(self.channels.len()),
        }];
        entries.extend(order.into_iter().map(|id| SidebarEntry {
            id: id.to_string(),
            name: self.genre_name_for(id),
            count: counts.get(id).copied(),
        }));
        entries
    }

    pub fn sidebar(&self, tab: Tab) -> Vec<SidebarEntry> {
        let all_label = match tab {
            Tab::Live => return self.live_genres(),
            Tab::Movies => "All Movies",
            Tab::Series => "All Series",
        };

        let mut entries = vec![SidebarEntry {
            id: tab.all_category_id().to_string(),
            name: all_label.to_string(),
            count: None,
        }];
        entries.extend(self.categories(tab).iter().map(|c| SidebarEntry {
            id: c.id.clone(),
            name: c.title.clone(),
            count: None,
        }));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaItem;

    fn channel(id: &str, name: &str, genre: Option<&str>) -> Channel {
        Channel {
            id: id.to_string(),
            name: name.to_string(),
            cmd: format!("ffrt http://localhost/ch/{}", id),
            number: None,
            logo: None,
            genre_id: genre.map(str::to_string),
        }
    }

    fn vod(id: &str) -> Item {
        Item::Vod(MediaItem {
            id: id.to_string(),
            name: format!("Movie {}", id),
            cmd: format!("/media/{}.mpg", id),
            screenshot_uri: None,
            icon: None,
            year: None,
            description: None,
            rating_imdb: None,
            category_id: None,
        })
    }

    #[test]
    fn genre_name_falls_back() {
        let mut store = CatalogStore::new();
        store.set_genres(vec![Genre {
            id: "1".into(),
            title: "News".into(),
        }]);
        assert_eq!(store.genre_name_for("1"), "News");
        assert_eq!(store.genre_name_for("9"), "Genre 9");
    }

    #[test]
    fn filters_channels_by_genre() {
        let mut store = CatalogStore::new();
        store.set_channels(vec![
            channel("1", "BBC News", Some("1")),
            channel("2", "Cartoons", Some("2")),
            channel("3", "Sky News", Some("1")),
            channel("4", "Unsorted", None),
        ]);

        assert_eq!(store.filtered_channels("all").len(), 4);
        let news: Vec<_> = store.filtered_channels("1").iter().map(|c| &c.id).collect();
        assert_eq!(news, vec!["1", "3"]);
        assert!(store.filtered_channels("7").is_empty());

        let found: Vec<_> = store.search_channels("1", "sky").iter().map(|c| &c.id).collect();
        assert_eq!(found, vec!["3"]);
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut store = CatalogStore::new();
        store.set_items(Tab::Movies, "5", vec![vod("a"), vod("b")], false);
        store.set_items(Tab::Movies, "5", vec![vod("c")], true);
        let ids: Vec<_> = store.items(Tab::Movies, "5").iter().map(Item::id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        store.set_items(Tab::Movies, "5", vec![vod("z")], false);
        assert_eq!(store.items(Tab::Movies, "5").len(), 1);
        assert!(store.items(Tab::Series, "5").is_empty());
    }

    #[test]
    fn clear_items_only_touches_one_tab() {
        let mut store = CatalogStore::new();
        store.set_items(Tab::Movies, "1", vec![vod("a")], false);
        store.set_items(Tab::Series, "1", vec![vod("b")], false);
        store.clear_items(Tab::Movies);
        assert!(store.items(Tab::Movies, "1").is_empty());
        assert_eq!(store.items(Tab::Series, "1").len(), 1);
    }

    #[test]
    fn live_genres_in_first_seen_order() {
        let mut store = CatalogStore::new();
        store.set_genres(vec![Genre {
            id: "2".into(),
            title: "Kids".into(),
        }]);
        store.set_channels(vec![
            channel("1", "A", Some("2")),
            channel("2", "B", Some("1")),
            channel("3", "C", Some("2")),
        ]);

        let sidebar = store.sidebar(Tab::Live);
        assert_eq!(sidebar[0].id, "all");
        assert_eq!(sidebar[0].count, Some(3));
        assert_eq!(sidebar[1].name, "Kids");
        assert_eq!(sidebar[1].count, Some(2));
        assert_eq!(sidebar[2].name, "Genre 1");
        assert_eq!(sidebar[1].to_string(), "Kids (2)");
    }

    #[test]
    fn vod_sidebar_starts_with_all() {
        let mut store = CatalogStore::new();
        store.set_vod_categories(vec![Category {
            id: "4".into(),
            title: "Drama".into(),
        }]);
        let sidebar = store.sidebar(Tab::Movies);
        assert_eq!(sidebar[0].id, "*");
        assert_eq!(sidebar[0].name, "All Movies");
        assert_eq!(sidebar[1].name, "Drama");
        assert_eq!(store.filter_categories(Tab::Movies, "dra").len(), 1);
        assert_eq!(store.category_title(Tab::Movies, "4"), Some("Drama"));
    }
}
