// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::history::{HistoryRecord, KeyValueStore};
use crate::models::{ALL_CATEGORIES, Item, Tab};
use crate::navigation::NavState;
use crate::player::CommandPlayer;
use crate::portal::Portal;
use crate::session::{Session, ViewEntry, ViewKind, ViewProjection};
use anyhow::Result;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Select, Text};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum MainMenuOption {
    Browse(Tab),
    Favourites,
    Recent,
}

impl std::fmt::Display for MainMenuOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainMenuOption::Browse(tab) => write!(f, "{}", tab),
            MainMenuOption::Favourites => write!(f, "🌟 Favourites"),
            MainMenuOption::Recent => write!(f, "🕘 Recently Watched"),
        }
    }
}

#[derive(Debug, Clone)]
enum MenuEntry {
    Search,
    ChooseGenre,
    AllCategories,
    Entry(usize, String),
    LoadMore,
    Back,
}

impl std::fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuEntry::Search => write!(f, "🔎 Search"),
            MenuEntry::ChooseGenre => write!(f, "📂 Choose genre"),
            MenuEntry::AllCategories => write!(f, "📂 All"),
            MenuEntry::Entry(_, label) => write!(f, "{}", label),
            MenuEntry::LoadMore => write!(f, "⏬ Load more"),
            MenuEntry::Back => write!(f, "⬅ Back"),
        }
    }
}

enum ItemAction {
    Play,
    ToggleFavourite(bool),
}

impl std::fmt::Display for ItemAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemAction::Play => write!(f, "▶ Play"),
            ItemAction::ToggleFavourite(true) => write!(f, "🗑 Remove from Favourites"),
            ItemAction::ToggleFavourite(false) => write!(f, "⭐ Add to Favourites"),
        }
    }
}

struct RecordEntry {
    record: HistoryRecord,
    age: String,
}

impl std::fmt::Display for RecordEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({})", self.record.kind, self.record.name, self.age)
    }
}

fn entry_label(entry: &ViewEntry) -> String {
    match entry {
        ViewEntry::Category(category) => format!("📁 {}", category.title),
        ViewEntry::Item(Item::Channel(channel)) => match &channel.number {
            Some(number) => format!("{:>4}  {}", number, channel.name),
            None => channel.name.clone(),
        },
        ViewEntry::Item(Item::Vod(movie)) => match &movie.year {
            Some(year) => format!("🎬 {} ({})", movie.name, year),
            None => format!("🎬 {}", movie.name),
        },
        ViewEntry::Item(Item::Series(series)) => format!("📺 {}", series.name),
        ViewEntry::Item(Item::Episode(episode)) => format!("▶ {}", episode.name),
    }
}

fn menu_entries(view: &ViewProjection, state: &NavState) -> Vec<MenuEntry> {
    let mut entries = vec![MenuEntry::Search];
    match state {
        NavState::TabRoot(Tab::Live) => entries.push(MenuEntry::ChooseGenre),
        NavState::TabRoot(_) => entries.push(MenuEntry::AllCategories),
        _ => {}
    }
    entries.extend(
        view.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| MenuEntry::Entry(i, entry_label(entry))),
    );
    if view.has_more {
        entries.push(MenuEntry::LoadMore);
    }
    entries.push(MenuEntry::Back);
    entries
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn with_spinner<T, F: Future<Output = T>>(message: &str, future: F) -> T {
    let pb = spinner(message);
    let result = future.await;
    pb.finish_and_clear();
    result
}

fn pause() {
    println!("Press Enter to continue...");
    let _ = std::io::stdin().read_line(&mut String::new());
}

/// Interactive text browser over a connected [`Session`]
pub struct MenuSystem<P, S> {
    session: Session<P, S>,
    player: CommandPlayer,
    page_size: usize,
}

impl<P: Portal, S: KeyValueStore> MenuSystem<P, S> {
    pub fn new(session: Session<P, S>, player: CommandPlayer, page_size: usize) -> Self {
        Self {
            session,
            player,
            page_size,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        with_spinner("Connecting...", self.session.connect()).await?;

        if let Some(days) = self
            .session
            .account()
            .and_then(|account| account.days_left(Utc::now()))
        {
            println!("Account expires in {} day(s)", days);
        }

        if !self.player.is_available() {
            println!("Warning: Media player not found. Videos may not play correctly.");
        }

        while let Some(option) = self.show_main_menu()? {
            let result = match option {
                MainMenuOption::Browse(tab) => self.browse_tab(tab).await,
                MainMenuOption::Favourites => self.browse_favourites().await,
                MainMenuOption::Recent => self.browse_recent().await,
            };
            if let Err(e) = result {
                println!("❌ Error: {:#}", e);
                pause();
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn show_main_menu(&self) -> Result<Option<MainMenuOption>> {
        let mut options: Vec<MainMenuOption> =
            Tab::ALL.iter().map(|&tab| MainMenuOption::Browse(tab)).collect();
        options.push(MainMenuOption::Favourites);
        options.push(MainMenuOption::Recent);

        Ok(Select::new("Select option:", options)
            .with_page_size(self.page_size)
            .prompt_skippable()?)
    }

    async fn browse_tab(&mut self, tab: Tab) -> Result<()> {
        let mut view = with_spinner(
            &format!("Loading {}...", tab),
            self.session.switch_tab(tab),
        )
        .await?;
        let mut cursor = 0;

        loop {
            let state = self.session.state();
            let entries = menu_entries(&view, &state);
            if view.entries.is_empty() {
                println!("Nothing to show here.");
            }

            let prompt = match (&state, self.session.navigator().search()) {
                (_, Some(term)) => format!("{} matching '{}':", tab, term),
                (NavState::SeriesEpisodes { series_name, .. }, None) => {
                    format!("{} episodes:", series_name)
                }
                (NavState::CategoryDrilldown { category_id, .. }, None) => {
                    match self.session.catalog().category_title(tab, category_id) {
                        Some(title) => format!("{} / {}:", tab, title),
                        None => format!("{}:", tab),
                    }
                }
                _ => format!("{}:", tab),
            };

            let selection = Select::new(&prompt, entries.clone())
                .with_page_size(self.page_size)
                .with_starting_cursor(cursor.min(entries.len().saturating_sub(1)))
                .prompt_skippable()?;

            let Some(selection) = selection else {
                return Ok(());
            };
            cursor = entries
                .iter()
                .position(|e| e.to_string() == selection.to_string())
                .unwrap_or(0);

            let result = match selection {
                MenuEntry::Search => self.prompt_search().await,
                MenuEntry::ChooseGenre => self.choose_genre().await,
                MenuEntry::AllCategories => {
                    with_spinner("Loading...", self.session.sidebar_click(ALL_CATEGORIES))
                        .await
                        .map(Some)
                        .map_err(Into::into)
                }
                MenuEntry::LoadMore => {
                    match with_spinner("Loading more...", self.session.load_more()).await {
                        Ok(added) => {
                            debug!("Loaded {} more items", added);
                            Ok(None)
                        }
                        Err(e) => Err(e.into()),
                    }
                }
                MenuEntry::Back => {
                    if self.session.navigator().depth() == 0 {
                        return Ok(());
                    }
                    cursor = 0;
                    Ok(Some(self.session.go_back()))
                }
                MenuEntry::Entry(index, _) => match view.entries.get(index).cloned() {
                    Some(entry) => self.select_entry(&view, entry).await,
                    None => Ok(None),
                },
            };

            match result {
                Ok(Some(next)) => view = next,
                Ok(None) => view = self.session.view(),
                Err(e) => {
                    println!("❌ Error: {:#}", e);
                    view = self.session.view();
                }
            }
        }
    }

    async fn prompt_search(&mut self) -> Result<Option<ViewProjection>> {
        let current = self.session.navigator().search().unwrap_or_default().to_string();
        let Some(query) = Text::new("Search (empty to clear):")
            .with_initial_value(&current)
            .prompt_skippable()?
        else {
            return Ok(None);
        };
        Ok(Some(
            with_spinner("Searching...", self.session.search(&query)).await?,
        ))
    }

    async fn choose_genre(&mut self) -> Result<Option<ViewProjection>> {
        let genres = self.session.sidebar();
        let labels: Vec<String> = genres.iter().map(ToString::to_string).collect();
        let Some(choice) = Select::new("Select genre:", labels.clone())
            .with_page_size(self.page_size)
            .prompt_skippable()?
        else {
            return Ok(None);
        };

        let Some(genre) = labels
            .iter()
            .position(|l| *l == choice)
            .and_then(|i| genres.get(i))
        else {
            return Ok(None);
        };
        Ok(Some(self.session.sidebar_click(&genre.id).await?))
    }

    async fn select_entry(
        &mut self,
        view: &ViewProjection,
        entry: ViewEntry,
    ) -> Result<Option<ViewProjection>> {
        match (view.kind, entry) {
            (_, ViewEntry::Category(category)) => Ok(Some(
                with_spinner(
                    &format!("Loading {}...", category.title),
                    self.session.sidebar_click(&category.id),
                )
                .await?,
            )),
            (ViewKind::Items, ViewEntry::Item(item @ Item::Series(_))) => Ok(Some(
                with_spinner("Loading episodes...", self.session.open(&item)).await?,
            )),
            (_, ViewEntry::Item(item)) => {
                self.item_actions(&item).await?;
                Ok(None)
            }
        }
    }

    async fn item_actions(&mut self, item: &Item) -> Result<()> {
        let is_favourite = self.session.history().is_favourite(item)?;
        let actions = vec![ItemAction::Play, ItemAction::ToggleFavourite(is_favourite)];

        match Select::new(&format!("Action for '{}':", item.name()), actions)
            .prompt_skippable()?
        {
            Some(ItemAction::Play) => {
                let played = with_spinner(
                    &format!("Resolving {}...", item.name()),
                    self.session.play(item, &self.player),
                )
                .await?;
                if let Some(request) = played {
                    println!("Playing: {}", request.title);
                }
            }
            Some(ItemAction::ToggleFavourite(_)) => {
                if self.session.toggle_favourite(item)? {
                    println!("⭐ Added to favourites");
                } else {
                    println!("🗑 Removed from favourites");
                }
            }
            None => {}
        }
        Ok(())
    }

    async fn browse_favourites(&mut self) -> Result<()> {
        let records = self.session.history().favourites()?;
        self.browse_records("Select a favourite:", records).await
    }

    async fn browse_recent(&mut self) -> Result<()> {
        let records = self.session.history().recent()?;
        self.browse_records("Recently watched:", records).await
    }

    async fn browse_records(&mut self, prompt: &str, records: Vec<HistoryRecord>) -> Result<()> {
        if records.is_empty() {
            println!("Nothing here yet.");
            return Ok(());
        }

        let now = Utc::now().timestamp_millis();
        let entries: Vec<RecordEntry> = records
            .into_iter()
            .map(|record| RecordEntry {
                age: record.age(now),
                record,
            })
            .collect();

        let Some(selected) = Select::new(prompt, entries)
            .with_page_size(self.page_size)
            .prompt_skippable()?
        else {
            return Ok(());
        };

        let played = with_spinner(
            &format!("Resolving {}...", selected.record.name),
            self.session.play_record(&selected.record, &self.player),
        )
        .await?;
        if let Some(request) = played {
            println!("Playing: {}", request.title);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{category, channel, media};

    #[test]
    fn labels_by_entry_kind() {
        let mut ch = channel("1", "BBC One", "1");
        ch.number = Some("1".into());
        assert_eq!(entry_label(&ViewEntry::Item(Item::Channel(ch))), "   1  BBC One");

        let mut movie = media("2", "Heat");
        movie.year = Some("1995".into());
        assert_eq!(entry_label(&ViewEntry::Item(Item::Vod(movie))), "🎬 Heat (1995)");

        assert_eq!(
            entry_label(&ViewEntry::Category(category("3", "Drama"))),
            "📁 Drama"
        );
    }

    #[test]
    fn drilled_view_offers_load_more_and_back() {
        let view = ViewProjection {
            kind: ViewKind::Items,
            entries: vec![ViewEntry::Item(Item::Vod(media("1", "Heat")))],
            has_more: true,
        };
        let state = NavState::CategoryDrilldown {
            tab: Tab::Movies,
            category_id: "5".into(),
        };

        let entries = menu_entries(&view, &state);
        assert!(matches!(entries[0], MenuEntry::Search));
        assert!(matches!(entries[1], MenuEntry::Entry(0, _)));
        assert!(matches!(entries[2], MenuEntry::LoadMore));
        assert!(matches!(entries[3], MenuEntry::Back));
    }

    #[test]
    fn root_views_offer_sidebar_shortcuts() {
        let view = ViewProjection {
            kind: ViewKind::Items,
            entries: Vec::new(),
            has_more: false,
        };
        let live = menu_entries(&view, &NavState::TabRoot(Tab::Live));
        assert!(matches!(live[1], MenuEntry::ChooseGenre));

        let movies = menu_entries(&view, &NavState::TabRoot(Tab::Movies));
        assert!(matches!(movies[1], MenuEntry::AllCategories));
        assert_eq!(movies.len(), 3);
    }
}
