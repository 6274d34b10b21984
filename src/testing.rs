// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! In-memory portal used by the unit tests.

use crate::error::{Error, Result};
use crate::models::{AccountInfo, Category, Channel, Genre, MediaItem, Season};
use crate::portal::{ListKind, Portal, StreamRequest};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tokio::sync::Notify;

type PageKey = (ListKind, String, u32, Option<String>);

#[derive(Default)]
pub(crate) struct ScriptedPortal {
    pub account: AccountInfo,
    pub genres: Vec<Genre>,
    pub channels: Vec<Channel>,
    pub vod_categories: Vec<Category>,
    pub series_categories: Vec<Category>,
    pub pages: HashMap<PageKey, Vec<MediaItem>>,
    pub seasons: HashMap<String, Vec<Season>>,
    pub links: HashMap<String, String>,
    /// create_link for these commands waits until notified
    pub gates: HashMap<String, Rc<Notify>>,
    pub failing: RefCell<HashSet<&'static str>>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedPortal {
    pub fn page(
        mut self,
        kind: ListKind,
        category_id: &str,
        page: u32,
        search: Option<&str>,
        items: Vec<MediaItem>,
    ) -> Self {
        self.pages.insert(
            (kind, category_id.to_string(), page, search.map(str::to_string)),
            items,
        );
        self
    }

    pub fn link(mut self, cmd: &str, response_cmd: &str) -> Self {
        self.links.insert(cmd.to_string(), response_cmd.to_string());
        self
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.borrow_mut().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.borrow_mut().remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, op: &'static str, detail: String) -> Result<()> {
        self.calls.borrow_mut().push(format!("{} {}", op, detail));
        if self.failing.borrow().contains(op) {
            return Err(Error::transport(Some(500), format!("{} failed", op)));
        }
        Ok(())
    }
}

impl Portal for ScriptedPortal {
    async fn get_account_info(&self) -> Result<AccountInfo> {
        self.record("account_info", String::new())?;
        Ok(self.account.clone())
    }

    async fn get_genres(&self) -> Result<Vec<Genre>> {
        self.record("genres", String::new())?;
        Ok(self.genres.clone())
    }

    async fn get_live_channels(&self) -> Result<Vec<Channel>> {
        self.record("channels", String::new())?;
        Ok(self.channels.clone())
    }

    async fn get_vod_categories(&self) -> Result<Vec<Category>> {
        self.record("vod_categories", String::new())?;
        Ok(self.vod_categories.clone())
    }

    async fn get_series_categories(&self) -> Result<Vec<Category>> {
        self.record("series_categories", String::new())?;
        Ok(self.series_categories.clone())
    }

    async fn get_ordered_list(
        &self,
        kind: ListKind,
        category_id: &str,
        page: u32,
        search: Option<&str>,
    ) -> Result<Vec<MediaItem>> {
        self.record(
            "ordered_list",
            format!("{:?} {} p{} {:?}", kind, category_id, page, search),
        )?;
        let key = (
            kind,
            category_id.to_string(),
            page,
            search.map(str::to_string),
        );
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }

    async fn get_episodes_of_series(&self, series_id: &str) -> Result<Vec<Season>> {
        self.record("episodes", series_id.to_string())?;
        Ok(self.seasons.get(series_id).cloned().unwrap_or_default())
    }

    async fn create_stream_link(&self, request: &StreamRequest) -> Result<String> {
        self.record("create_link", request.cmd().to_string())?;
        if let Some(gate) = self.gates.get(request.cmd()) {
            gate.notified().await;
        }
        self.links
            .get(request.cmd())
            .cloned()
            .ok_or_else(|| Error::MalformedResponse("no stream command received".into()))
    }
}

pub(crate) fn media(id: &str, name: &str) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        name: name.to_string(),
        cmd: format!("/media/{}.mpg", id),
        screenshot_uri: None,
        icon: None,
        year: None,
        description: None,
        rating_imdb: None,
        category_id: None,
    }
}

pub(crate) fn channel(id: &str, name: &str, genre_id: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: name.to_string(),
        cmd: format!("ffrt http://localhost/ch/{}", id),
        number: None,
        logo: None,
        genre_id: Some(genre_id.to_string()),
    }
}

pub(crate) fn category(id: &str, title: &str) -> Category {
    Category {
        id: id.to_string(),
        title: title.to_string(),
    }
}

pub(crate) fn season(id: &str, name: &str, episodes: &[u32]) -> Season {
    Season {
        id: id.to_string(),
        name: Some(name.to_string()),
        series: episodes.to_vec(),
        screenshot_uri: None,
        description: None,
        year: None,
        rating_imdb: None,
        actors: None,
        director: None,
    }
}
