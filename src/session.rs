// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::catalog::{CatalogStore, SidebarEntry};
use crate::episode::flatten_episodes;
use crate::error::{Error, Result};
use crate::history::{History, HistoryRecord, KeyValueStore};
use crate::models::{AccountInfo, Category, Item, MediaItem, StreamKind, Tab};
use crate::navigation::{NavState, NavigationFrame, Navigator, SidebarAction};
use crate::pagination::{LoadOutcome, PageCursor, PaginationController};
use crate::player::{PlaybackRequest, PlaybackSink};
use crate::portal::{ListKind, Portal};
use crate::resolver::StreamResolver;
use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Categories,
    Items,
    Episodes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewEntry {
    Category(Category),
    Item(Item),
}

impl ViewEntry {
    pub fn name(&self) -> &str {
        match self {
            ViewEntry::Category(c) => &c.title,
            ViewEntry::Item(i) => i.name(),
        }
    }
}

/// What the UI should render after a navigation, search or page event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewProjection {
    pub kind: ViewKind,
    pub entries: Vec<ViewEntry>,
    pub has_more: bool,
}

fn list_kind(tab: Tab) -> Result<ListKind> {
    match tab {
        Tab::Movies => Ok(ListKind::Vod),
        Tab::Series => Ok(ListKind::Series),
        Tab::Live => Err(Error::InvalidTransition(
            "live TV has no paged listing".to_string(),
        )),
    }
}

fn wrap_items(tab: Tab, items: Vec<MediaItem>) -> Vec<Item> {
    items
        .into_iter()
        .map(|item| match tab {
            Tab::Series => Item::Series(item),
            _ => Item::Vod(item),
        })
        .collect()
}

/// One connected portal: catalog, navigation, paging and playback state.
///
/// Navigation operations take `&mut self`, so a transition and its fetch run
/// to completion before another transition can start. Playback only needs
/// `&self`; overlapping calls to [`Session::play`] resolve last-wins.
pub struct Session<P, S> {
    portal: P,
    history: History<S>,
    catalog: CatalogStore,
    navigator: Navigator,
    pagination: PaginationController,
    resolver: StreamResolver,
    account: Option<AccountInfo>,
    search_results: Vec<Item>,
    /// Category stream cursor saved while a server search owns the paginator
    category_cursor: Option<PageCursor>,
    sidebar_filter: Option<String>,
}

impl<P: Portal, S: KeyValueStore> Session<P, S> {
    pub fn new(portal: P, history: History<S>, items_per_page: usize) -> Self {
        Self {
            portal,
            history,
            catalog: CatalogStore::new(),
            navigator: Navigator::default(),
            pagination: PaginationController::new(items_per_page),
            resolver: StreamResolver::new(),
            account: None,
            search_results: Vec::new(),
            category_cursor: None,
            sidebar_filter: None,
        }
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn state(&self) -> NavState {
        self.navigator.state()
    }

    pub fn account(&self) -> Option<&AccountInfo> {
        self.account.as_ref()
    }

    pub fn cursor(&self) -> PageCursor {
        self.pagination.cursor()
    }

    /// Account info, live genres and the content of the current tab. A genre
    /// failure only costs genre names, so it is logged and ignored.
    pub async fn connect(&mut self) -> Result<ViewProjection> {
        let account = self.portal.get_account_info().await?;
        if let Some(expires) = account.expires_at() {
            info!("Account expires {}", expires.format("%Y-%m-%d"));
        }
        self.account = Some(account);

        match self.portal.get_genres().await {
            Ok(genres) => {
                debug!("Loaded {} genres", genres.len());
                self.catalog.set_genres(genres);
            }
            Err(e) => warn!("Failed to load genres: {}", e),
        }

        self.load_tab_content().await?;
        info!("Connected, showing {}", self.navigator.tab());
        Ok(self.view())
    }

    async fn load_tab_content(&mut self) -> Result<()> {
        match self.navigator.tab() {
            Tab::Live => {
                if !self.catalog.has_channels() {
                    let channels = self.portal.get_live_channels().await?;
                    info!("Loaded {} channels", channels.len());
                    self.catalog.set_channels(channels);
                }
            }
            Tab::Movies => {
                let categories = self.portal.get_vod_categories().await?;
                info!("Loaded {} movie categories", categories.len());
                self.catalog.set_vod_categories(categories);
            }
            Tab::Series => {
                let categories = self.portal.get_series_categories().await?;
                info!("Loaded {} series categories", categories.len());
                self.catalog.set_series_categories(categories);
            }
        }
        Ok(())
    }

    /// Back to the root of `tab`. Movie and series items are dropped so they
    /// are refetched; live channels are kept.
    pub async fn switch_tab(&mut self, tab: Tab) -> Result<ViewProjection> {
        self.navigator.switch_tab(tab);
        self.pagination.reset();
        self.search_results.clear();
        self.category_cursor = None;
        self.sidebar_filter = None;
        if tab.has_drilldown() {
            self.catalog.clear_items(tab);
        }
        self.catalog.clear_episodes();

        self.load_tab_content().await?;
        Ok(self.view())
    }

    /// A click on a sidebar entry. Its meaning depends on where we are.
    pub async fn sidebar_click(&mut self, category_id: &str) -> Result<ViewProjection> {
        match self.navigator.sidebar_action() {
            SidebarAction::Drilldown => self.drill_into_category(category_id).await,
            SidebarAction::Filter | SidebarAction::Highlight => {
                self.navigator.select_category(category_id)?;
                Ok(self.view())
            }
        }
    }

    pub async fn drill_into_category(&mut self, category_id: &str) -> Result<ViewProjection> {
        let before = self.navigator.clone();
        self.navigator.drill_into_category(category_id)?;
        self.search_results.clear();
        self.category_cursor = None;

        if let Err(e) = self.load_category_items().await {
            warn!("Failed to open category {}: {}", category_id, e);
            self.navigator = before;
            return Err(e);
        }
        Ok(self.view())
    }

    async fn load_category_items(&mut self) -> Result<()> {
        let NavState::CategoryDrilldown { tab, category_id } = self.navigator.state() else {
            return Ok(());
        };
        let kind = list_kind(tab)?;

        let items = self
            .pagination
            .load_first(|page| self.portal.get_ordered_list(kind, &category_id, page, None))
            .await?;

        info!(
            "Loaded {} items for {} category {}",
            items.len(),
            tab,
            category_id
        );
        self.catalog.set_items(tab, &category_id, wrap_items(tab, items), false);
        Ok(())
    }

    /// Open a series from the current category. The frame is only kept when
    /// at least one episode could be listed.
    pub async fn drill_into_series(
        &mut self,
        series_id: &str,
        series_name: &str,
    ) -> Result<ViewProjection> {
        let before = self.navigator.clone();
        self.navigator.drill_into_series(series_id, series_name)?;

        if let Err(e) = self.load_episodes(series_id, series_name).await {
            warn!("Failed to open series {}: {}", series_name, e);
            self.navigator = before;
            return Err(e);
        }
        Ok(self.view())
    }

    async fn load_episodes(&mut self, series_id: &str, series_name: &str) -> Result<()> {
        let seasons = self.portal.get_episodes_of_series(series_id).await?;
        let episodes = flatten_episodes(&seasons, series_name);
        if episodes.is_empty() {
            return Err(Error::MalformedResponse(
                "no episodes found in the series data".to_string(),
            ));
        }

        info!(
            "Loaded {} episodes in {} seasons for {}",
            episodes.len(),
            seasons.len(),
            series_name
        );
        self.catalog.set_episodes(series_id, episodes);
        Ok(())
    }

    /// Enter a series, or do nothing useful for anything else.
    pub async fn open(&mut self, item: &Item) -> Result<ViewProjection> {
        match item {
            Item::Series(series) => self.drill_into_series(&series.id, &series.name).await,
            _ => Err(Error::InvalidTransition(format!(
                "{} is played, not opened",
                item.name()
            ))),
        }
    }

    pub fn go_back(&mut self) -> ViewProjection {
        match self.navigator.go_back() {
            Some(NavigationFrame::Categories { tab, .. }) => {
                self.catalog.clear_items(tab);
                self.pagination.reset();
                self.category_cursor = None;
            }
            Some(NavigationFrame::SeriesItems { .. }) => {
                self.catalog.clear_episodes();
                self.leave_search_stream();
            }
            None => debug!("Already at the root of {}", self.navigator.tab()),
        }
        self.search_results.clear();
        self.view()
    }

    fn leave_search_stream(&mut self) {
        if let Some(cursor) = self.category_cursor.take() {
            self.pagination.restore(cursor);
        }
        self.search_results.clear();
    }

    /// Apply a search query to the current view. Only a drilled-down movie or
    /// series category searches the portal; everything else filters locally.
    /// A failed portal search leaves search mode on with no results.
    pub async fn search(&mut self, query: &str) -> Result<ViewProjection> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            self.navigator.set_search(None);
            self.leave_search_stream();
            return Ok(self.view());
        }

        self.navigator.set_search(Some(term.clone()));

        if let NavState::CategoryDrilldown { tab, category_id } = self.navigator.state() {
            let kind = list_kind(tab)?;
            self.search_results.clear();
            if self.category_cursor.is_none() {
                self.category_cursor = Some(self.pagination.cursor());
            }

            let found = self
                .pagination
                .load_first(|page| {
                    self.portal
                        .get_ordered_list(kind, &category_id, page, Some(term.as_str()))
                })
                .await
                .inspect_err(|e| warn!("Search for {:?} failed: {}", term, e))?;

            info!("Found {} results for {:?} in {}", found.len(), term, tab);
            self.search_results = wrap_items(tab, found);
        }

        Ok(self.view())
    }

    /// Fetch the next page of the active item stream. Returns how many items
    /// were added (0 when there was nothing to load).
    pub async fn load_more(&mut self) -> Result<usize> {
        let NavState::CategoryDrilldown { tab, category_id } = self.navigator.state() else {
            return Ok(0);
        };
        let kind = list_kind(tab)?;
        let search = self.navigator.search().map(str::to_string);

        let outcome = self
            .pagination
            .load_more(|page| {
                self.portal
                    .get_ordered_list(kind, &category_id, page, search.as_deref())
            })
            .await?;

        let LoadOutcome::Loaded { page, items } = outcome else {
            return Ok(0);
        };

        let added = items.len();
        debug!("Appending {} items from page {}", added, page);
        let items = wrap_items(tab, items);
        if search.is_some() {
            self.search_results.extend(items);
        } else {
            self.catalog.set_items(tab, &category_id, items, true);
        }
        Ok(added)
    }

    pub fn filter_sidebar(&mut self, term: &str) -> Vec<SidebarEntry> {
        let term = term.trim().to_lowercase();
        self.sidebar_filter = (!term.is_empty()).then_some(term);
        self.sidebar()
    }

    pub fn sidebar(&self) -> Vec<SidebarEntry> {
        let entries = self.catalog.sidebar(self.navigator.tab());
        match &self.sidebar_filter {
            Some(term) => entries
                .into_iter()
                .filter(|e| e.name.to_lowercase().contains(term.as_str()))
                .collect(),
            None => entries,
        }
    }

    pub fn view(&self) -> ViewProjection {
        let search = self.navigator.search();

        match self.navigator.state() {
            NavState::TabRoot(Tab::Live) => {
                let selected = self.navigator.selected_category();
                let channels = match search {
                    Some(term) => self.catalog.search_channels(selected, term),
                    None => self.catalog.filtered_channels(selected),
                };
                ViewProjection {
                    kind: ViewKind::Items,
                    entries: channels
                        .into_iter()
                        .map(|c| ViewEntry::Item(Item::Channel(c.clone())))
                        .collect(),
                    has_more: false,
                }
            }
            NavState::TabRoot(tab) => {
                let categories = match search {
                    Some(term) => self.catalog.filter_categories(tab, term),
                    None => self.catalog.categories(tab).iter().collect(),
                };
                ViewProjection {
                    kind: ViewKind::Categories,
                    entries: categories
                        .into_iter()
                        .map(|c| ViewEntry::Category(c.clone()))
                        .collect(),
                    has_more: false,
                }
            }
            NavState::CategoryDrilldown { tab, category_id } => {
                let items = match search {
                    Some(_) => &self.search_results[..],
                    None => self.catalog.items(tab, &category_id),
                };
                ViewProjection {
                    kind: ViewKind::Items,
                    entries: items.iter().cloned().map(ViewEntry::Item).collect(),
                    has_more: self.pagination.has_more(),
                }
            }
            NavState::SeriesEpisodes { series_id, .. } => ViewProjection {
                kind: ViewKind::Episodes,
                entries: self
                    .catalog
                    .episodes(&series_id)
                    .iter()
                    .filter(|e| search.is_none_or(|term| e.name.to_lowercase().contains(term)))
                    .map(|e| ViewEntry::Item(Item::Episode(e.clone())))
                    .collect(),
                has_more: false,
            },
        }
    }

    /// Resolve a playback command and hand the stream to `sink`. Returns
    /// `Ok(None)` when a newer request superseded this one.
    pub async fn play_command<K: PlaybackSink>(
        &self,
        cmd: &str,
        kind: StreamKind,
        title: &str,
        subtitle: Option<String>,
        sink: &K,
    ) -> anyhow::Result<Option<PlaybackRequest>> {
        let stream_url = match self.resolver.resolve(&self.portal, cmd, kind).await {
            Ok(url) => url,
            Err(e) if e.is_cancellation() => {
                debug!("Dropping superseded playback of {}", title);
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to resolve stream for {}", title));
            }
        };

        let request = PlaybackRequest {
            stream_url,
            title: title.to_string(),
            subtitle,
            kind,
        };
        sink.deliver(&request)?;
        Ok(Some(request))
    }

    /// Play a channel, movie or episode and remember it as recently watched.
    pub async fn play<K: PlaybackSink>(
        &self,
        item: &Item,
        sink: &K,
    ) -> anyhow::Result<Option<PlaybackRequest>> {
        let Some(kind) = item.stream_kind() else {
            anyhow::bail!("{} is a series, open it to list episodes", item.name());
        };
        let subtitle = match item {
            Item::Channel(_) => "Live TV".to_string(),
            Item::Vod(_) => "Movie".to_string(),
            Item::Episode(e) => format!("Episode - {}", e.series_name),
            Item::Series(_) => String::new(),
        };

        let played = self
            .play_command(item.cmd(), kind, item.name(), Some(subtitle), sink)
            .await?;
        if played.is_some() {
            if let Err(e) = self.history.add_recent(item) {
                warn!("Failed to record recently watched: {:#}", e);
            }
        }
        Ok(played)
    }

    /// Replay a favourite or recently watched entry.
    pub async fn play_record<K: PlaybackSink>(
        &self,
        record: &HistoryRecord,
        sink: &K,
    ) -> anyhow::Result<Option<PlaybackRequest>> {
        let Some(kind) = record.stream_kind() else {
            anyhow::bail!("{} is a series, open it to list episodes", record.name);
        };

        let played = self
            .play_command(&record.cmd, kind, &record.name, None, sink)
            .await?;
        if played.is_some() {
            if let Err(e) = self.history.push_recent(record.clone().touched_now()) {
                warn!("Failed to record recently watched: {:#}", e);
            }
        }
        Ok(played)
    }

    pub fn cancel_playback(&self) {
        self.resolver.cancel();
    }

    pub fn toggle_favourite(&self, item: &Item) -> anyhow::Result<bool> {
        self.history.toggle_favourite(item)
    }
}
