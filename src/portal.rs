// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::config::HttpConfig;
use crate::episode::EpisodeRef;
use crate::error::{Error, Result};
use crate::models::{AccountInfo, Category, Channel, Genre, MediaItem, Season};
use anyhow::Context;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").expect("MAC address pattern")
});

/// Which paginated listing to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Vod,
    Series,
}

/// A create_link request, one per stream kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    Live { cmd: String },
    Vod { cmd: String },
    Episode { cmd: String, episode: EpisodeRef },
}

impl StreamRequest {
    pub fn cmd(&self) -> &str {
        match self {
            StreamRequest::Live { cmd }
            | StreamRequest::Vod { cmd }
            | StreamRequest::Episode { cmd, .. } => cmd,
        }
    }
}

/// The remote Stalker-style portal. Every call is a single request; failures
/// are returned as-is and never retried here.
#[allow(async_fn_in_trait)]
pub trait Portal {
    async fn get_account_info(&self) -> Result<AccountInfo>;
    async fn get_genres(&self) -> Result<Vec<Genre>>;
    async fn get_live_channels(&self) -> Result<Vec<Channel>>;
    async fn get_vod_categories(&self) -> Result<Vec<Category>>;
    async fn get_series_categories(&self) -> Result<Vec<Category>>;
    async fn get_ordered_list(
        &self,
        kind: ListKind,
        category_id: &str,
        page: u32,
        search: Option<&str>,
    ) -> Result<Vec<MediaItem>>;
    async fn get_episodes_of_series(&self, series_id: &str) -> Result<Vec<Season>>;
    /// Returns the raw `js.cmd` of the create_link response.
    async fn create_stream_link(&self, request: &StreamRequest) -> Result<String>;
}

/// Endpoints exposed for raw inspection from the command line
#[derive(Debug, Clone)]
pub enum Endpoint {
    AccountInfo,
    Genres,
    LiveChannels,
    VodCategories,
    SeriesCategories,
    OrderedList {
        kind: ListKind,
        category_id: String,
        page: u32,
        search: Option<String>,
    },
    Episodes {
        series_id: String,
    },
    CreateLink(StreamRequest),
}

#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
    mac: String,
}

impl PortalClient {
    pub fn new(server_url: &str, mac: &str, http: &HttpConfig) -> anyhow::Result<Self> {
        let url = url::Url::parse(server_url.trim()).with_context(|| "Invalid server URL")?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported URL scheme: {}", url.scheme());
        }

        let mac = mac.trim();
        if !MAC_PATTERN.is_match(mac) {
            anyhow::bail!("Invalid MAC address: {} (expected XX:XX:XX:XX:XX:XX)", mac);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: url.as_str().trim_end_matches('/').to_string(),
            mac: mac.to_uppercase(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    fn load_url(&self, query: &str) -> String {
        format!("{}/server/load.php?{}", self.base_url, query)
    }

    pub fn endpoint_url(&self, endpoint: &Endpoint) -> String {
        let mac = &self.mac;
        match endpoint {
            Endpoint::AccountInfo => self.load_url(&format!(
                "type=account_info&action=get_main_info&mac={}&JsHttpRequest=1-xml",
                mac
            )),
            Endpoint::Genres => self.load_url(&format!(
                "type=itv&action=get_genres&mac={}&JsHttpRequest=1-xml",
                mac
            )),
            Endpoint::LiveChannels => self.load_url(&format!(
                "type=itv&action=get_all_channels&mac={}&JsHttpRequest=1-xml",
                mac
            )),
            Endpoint::VodCategories => {
                self.load_url(&format!("type=vod&action=get_categories&mac={}", mac))
            }
            Endpoint::SeriesCategories => {
                self.load_url(&format!("type=series&action=get_categories&mac={}", mac))
            }
            Endpoint::OrderedList {
                kind,
                category_id,
                page,
                search,
            } => {
                let search = search
                    .as_deref()
                    .map(|term| format!("&search={}", urlencoding::encode(term)))
                    .unwrap_or_default();
                match kind {
                    ListKind::Vod => self.load_url(&format!(
                        "action=get_ordered_list&category={}&p={}&type=vod&sortby=added{}&mac={}",
                        category_id, page, search, mac
                    )),
                    ListKind::Series => self.load_url(&format!(
                        "type=series&action=get_ordered_list&category={}&p={}{}&mac={}",
                        category_id, page, search, mac
                    )),
                }
            }
            Endpoint::Episodes { series_id } => self.load_url(&format!(
                "movie_id={}&type=series&action=get_ordered_list&sortby=added&p=1&mac={}",
                series_id, mac
            )),
            Endpoint::CreateLink(request) => {
                let cmd = urlencoding::encode(request.cmd());
                match request {
                    StreamRequest::Live { .. } => format!(
                        "{}/portal.php?type=itv&action=create_link&cmd={}&mac={}",
                        self.base_url, cmd, mac
                    ),
                    StreamRequest::Vod { .. } => self.load_url(&format!(
                        "action=create_link&cmd={}&type=vod&mac={}&disable_ad=1",
                        cmd, mac
                    )),
                    StreamRequest::Episode { episode, .. } => self.load_url(&format!(
                        "series={}&action=create_link&disable_ad=1&type=vod&cmd={}&mac={}",
                        episode.episode_id, cmd, mac
                    )),
                }
            }
        }
    }

    fn redact(&self, url: &str) -> String {
        url.replace(&self.mac, "<mac>")
    }

    async fn fetch_body(&self, url: &str) -> Result<Value> {
        debug!("Requesting: {}", self.redact(url));

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(
                Some(status.as_u16()),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }

        let mut response_bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = futures_util::StreamExt::next(&mut stream).await {
            response_bytes.extend_from_slice(&chunk?);
        }

        debug!("Response size: {} bytes", response_bytes.len());
        parse_body(&response_bytes)
    }

    /// Full decoded response body, without unwrapping `js`.
    pub async fn request_raw(&self, endpoint: &Endpoint) -> Result<Value> {
        self.fetch_body(&self.endpoint_url(endpoint)).await
    }

    async fn request_js<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let body = self.request_raw(endpoint).await?;
        decode(extract_js(body)?)
    }

    async fn request_list<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<Vec<T>> {
        let body = self.request_raw(endpoint).await?;
        decode_list(extract_js(body)?)
    }

    async fn request_data<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<Vec<T>> {
        let body = self.request_raw(endpoint).await?;
        decode_list(extract_data(extract_js(body)?)?)
    }

    /// Logo and poster paths are often relative to the portal.
    pub fn absolute_url(&self, path: &str) -> Option<String> {
        absolute_url(&self.base_url, path)
    }
}

pub(crate) fn absolute_url(base_url: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        None
    } else if path.starts_with("http://") || path.starts_with("https://") {
        Some(path.to_string())
    } else if path.starts_with('/') {
        Some(format!("{}{}", base_url, path))
    } else {
        Some(format!("{}/{}", base_url, path))
    }
}

pub(crate) fn parse_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::MalformedResponse("empty response from server".to_string()));
    }

    serde_json::from_slice(bytes).map_err(|e| {
        warn!(
            "JSON parsing failed at line {}, column {}: {}",
            e.line(),
            e.column(),
            e
        );
        Error::MalformedResponse(format!("invalid JSON: {}", e))
    })
}

pub(crate) fn extract_js(body: Value) -> Result<Value> {
    match body {
        Value::Object(mut map) => match map.remove("js") {
            Some(Value::Null) | None => Err(Error::MalformedResponse(
                "missing `js` field".to_string(),
            )),
            Some(js) => Ok(js),
        },
        _ => Err(Error::MalformedResponse(
            "response is not a JSON object".to_string(),
        )),
    }
}

pub(crate) fn extract_data(js: Value) -> Result<Value> {
    match js {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Array(_)) => Ok(data),
            Some(_) => Err(Error::MalformedResponse(
                "`js.data` is not a list".to_string(),
            )),
            None => Err(Error::MalformedResponse(
                "missing `js.data` field".to_string(),
            )),
        },
        _ => Err(Error::MalformedResponse(
            "`js` is not an object".to_string(),
        )),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::MalformedResponse(e.to_string()))
}

/// Entries are decoded one by one; an entry that does not fit is logged and
/// dropped instead of failing the whole list.
pub(crate) fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    let Value::Array(entries) = value else {
        return Err(Error::MalformedResponse("expected a list".to_string()));
    };

    let total = entries.len();
    let items: Vec<T> = entries
        .into_iter()
        .filter_map(|entry| {
            serde_json::from_value(entry)
                .inspect_err(|e| warn!("Skipping malformed entry: {}", e))
                .ok()
        })
        .collect();

    if items.len() < total {
        debug!("Decoded {} of {} entries", items.len(), total);
    }
    Ok(items)
}

pub(crate) fn extract_link_cmd(js: Value) -> Result<String> {
    match js.get("cmd") {
        Some(Value::String(cmd)) if !cmd.is_empty() => Ok(cmd.clone()),
        _ => Err(Error::MalformedResponse("no stream command received".to_string())),
    }
}

impl Portal for PortalClient {
    async fn get_account_info(&self) -> Result<AccountInfo> {
        self.request_js(&Endpoint::AccountInfo).await
    }

    async fn get_genres(&self) -> Result<Vec<Genre>> {
        self.request_list(&Endpoint::Genres).await
    }

    async fn get_live_channels(&self) -> Result<Vec<Channel>> {
        self.request_data(&Endpoint::LiveChannels).await
    }

    async fn get_vod_categories(&self) -> Result<Vec<Category>> {
        self.request_list(&Endpoint::VodCategories).await
    }

    async fn get_series_categories(&self) -> Result<Vec<Category>> {
        self.request_list(&Endpoint::SeriesCategories).await
    }

    async fn get_ordered_list(
        &self,
        kind: ListKind,
        category_id: &str,
        page: u32,
        search: Option<&str>,
    ) -> Result<Vec<MediaItem>> {
        self.request_data(&Endpoint::OrderedList {
            kind,
            category_id: category_id.to_string(),
            page,
            search: search.map(str::to_string),
        })
        .await
    }

    async fn get_episodes_of_series(&self, series_id: &str) -> Result<Vec<Season>> {
        self.request_data(&Endpoint::Episodes {
            series_id: series_id.to_string(),
        })
        .await
    }

    async fn create_stream_link(&self, request: &StreamRequest) -> Result<String> {
        let body = self
            .request_raw(&Endpoint::CreateLink(request.clone()))
            .await?;
        extract_link_cmd(extract_js(body)?)
    }
}
