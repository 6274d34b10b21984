// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Accepts a JSON string or number, used for portal ids which arrive as both.
pub(crate) fn deserialize_number_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Value = Deserialize::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("Expected string or number")),
    }
}

/// Like [`deserialize_number_as_string`] but tolerant: anything that is not a
/// non-empty string or a number becomes `None`.
pub(crate) fn deserialize_optional_number_as_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Display text that may arrive as a number (a film called "1917") or null.
pub(crate) fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn deserialize_episode_numbers<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::Array(arr) => arr
            .into_iter()
            .filter_map(|v| match v {
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Top-level tab of the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Live,
    Movies,
    Series,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Live, Tab::Movies, Tab::Series];

    /// Movies and series are browsed category -> items; live TV is filtered in place.
    pub fn has_drilldown(&self) -> bool {
        matches!(self, Tab::Movies | Tab::Series)
    }

    /// Sidebar id meaning "everything" for this tab.
    pub fn all_category_id(&self) -> &'static str {
        match self {
            Tab::Live => ALL_GENRES,
            Tab::Movies | Tab::Series => ALL_CATEGORIES,
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tab::Live => write!(f, "Live TV"),
            Tab::Movies => write!(f, "Movies"),
            Tab::Series => write!(f, "TV Series"),
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" | "itv" | "tv" => Ok(Tab::Live),
            "movies" | "movie" | "vod" => Ok(Tab::Movies),
            "series" => Ok(Tab::Series),
            _ => Err(format!(
                "Invalid tab: {}. Use 'live', 'movies', or 'series'",
                s
            )),
        }
    }
}

/// Genre id selecting every live channel
pub const ALL_GENRES: &str = "all";
/// Portal category id meaning "all categories" for VOD and series
pub const ALL_CATEGORIES: &str = "*";

/// How a playback command is turned into a stream link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Live,
    Vod,
    Episode,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Live => "live",
            StreamKind::Vod => "vod",
            StreamKind::Episode => "episode",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" | "itv" => Ok(StreamKind::Live),
            "vod" | "movie" => Ok(StreamKind::Vod),
            "episode" | "series" => Ok(StreamKind::Episode),
            _ => Err(format!(
                "Invalid stream kind: {}. Use 'live', 'vod', or 'episode'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: String,
    #[serde(default)]
    pub cmd: String,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub logo: Option<String>,
    #[serde(
        default,
        rename = "tv_genre_id",
        deserialize_with = "deserialize_optional_number_as_string"
    )]
    pub genre_id: Option<String>,
}

/// VOD or series category. `id == "*"` is the "all" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: String,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Item of a VOD or series ordered list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: String,
    #[serde(default)]
    pub cmd: String,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub screenshot_uri: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub rating_imdb: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub category_id: Option<String>,
}

impl MediaItem {
    pub fn screenshot(&self) -> Option<&str> {
        self.screenshot_uri
            .as_deref()
            .or(self.icon.as_deref())
            .filter(|s| !s.is_empty())
    }
}

pub type VodItem = MediaItem;
pub type SeriesItem = MediaItem;

/// Raw season as returned by the series episode listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(deserialize_with = "deserialize_number_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_episode_numbers")]
    pub series: Vec<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub screenshot_uri: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub rating_imdb: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub actors: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub director: Option<String>,
}

/// One playable episode, flattened out of a [`Season`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// `<seasonId>:<episodeNumber>`
    pub id: String,
    pub season_id: String,
    pub episode_number: u32,
    pub name: String,
    pub series_name: String,
    pub cmd: String,
    pub screenshot: Option<String>,
    pub description: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub actors: Option<String>,
    pub director: Option<String>,
}

/// Anything that can appear in an item list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Item {
    Channel(Channel),
    Vod(VodItem),
    Series(SeriesItem),
    Episode(Episode),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Item::Channel(c) => &c.id,
            Item::Vod(v) | Item::Series(v) => &v.id,
            Item::Episode(e) => &e.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Channel(c) => &c.name,
            Item::Vod(v) | Item::Series(v) => &v.name,
            Item::Episode(e) => &e.name,
        }
    }

    pub fn cmd(&self) -> &str {
        match self {
            Item::Channel(c) => &c.cmd,
            Item::Vod(v) | Item::Series(v) => &v.cmd,
            Item::Episode(e) => &e.cmd,
        }
    }

    /// Logo or poster path as the portal sent it, possibly relative.
    pub fn image(&self) -> Option<&str> {
        match self {
            Item::Channel(c) => c.logo.as_deref(),
            Item::Vod(v) | Item::Series(v) => v.screenshot(),
            Item::Episode(e) => e.screenshot.as_deref(),
        }
    }

    /// Type tag used for favourites and recently-watched records.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Item::Channel(_) => "live",
            Item::Vod(_) => "vod",
            Item::Series(_) => "series",
            Item::Episode(_) => "episode",
        }
    }

    /// Series entries are drilled into rather than played.
    pub fn stream_kind(&self) -> Option<StreamKind> {
        match self {
            Item::Channel(_) => Some(StreamKind::Live),
            Item::Vod(_) => Some(StreamKind::Vod),
            Item::Series(_) => None,
            Item::Episode(_) => Some(StreamKind::Episode),
        }
    }

    pub fn matches(&self, term_lower: &str) -> bool {
        self.name().to_lowercase().contains(term_lower)
    }
}

/// Subset of `get_main_info`; the portal reports the expiry date in `phone`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number_as_string")]
    pub fname: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl AccountInfo {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.phone.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(Utc.from_utc_datetime(&dt));
        }
        ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    /// Whole days until expiry, rounded up. Negative once expired.
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        let expires = self.expires_at()?;
        let secs = (expires - now).num_seconds();
        Some(secs.div_euclid(86_400) + i64::from(secs.rem_euclid(86_400) != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let genre: Genre = serde_json::from_value(json!({"id": 7, "title": "News"})).unwrap();
        assert_eq!(genre.id, "7");

        let channel: Channel = serde_json::from_value(json!({
            "id": "101",
            "name": "BBC One",
            "cmd": "ffrt http://localhost/ch/101",
            "number": 1,
            "logo": "",
            "tv_genre_id": 7
        }))
        .unwrap();
        assert_eq!(channel.genre_id.as_deref(), Some("7"));
        assert_eq!(channel.number.as_deref(), Some("1"));
        assert_eq!(channel.logo, None);
    }

    #[test]
    fn numeric_and_null_names_still_decode() {
        let items: Vec<MediaItem> = serde_json::from_value(json!([
            {"id": 1, "name": 1917, "cmd": "/media/1.mpg"},
            {"id": 2, "name": null},
            {"id": 3, "name": "Heat"}
        ]))
        .unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["1917", "", "Heat"]);

        let channel: Channel = serde_json::from_value(json!({"id": 4, "name": 300})).unwrap();
        assert_eq!(channel.name, "300");
    }

    #[test]
    fn screenshot_falls_back_to_icon() {
        let item: MediaItem = serde_json::from_value(json!({
            "id": 1,
            "name": "Film",
            "cmd": "/media/1.mpg",
            "icon": "http://img/1.png"
        }))
        .unwrap();
        assert_eq!(item.screenshot(), Some("http://img/1.png"));
        assert_eq!(Item::Vod(item).image(), Some("http://img/1.png"));
    }

    #[test]
    fn season_episode_numbers_are_lenient() {
        let season: Season = serde_json::from_value(json!({
            "id": "10",
            "name": "S1",
            "series": [1, "2", null, "x"]
        }))
        .unwrap();
        assert_eq!(season.series, vec![1, 2]);
    }

    #[test]
    fn item_dispatch_by_tag() {
        let series = Item::Series(MediaItem {
            id: "5".into(),
            name: "Show".into(),
            cmd: String::new(),
            screenshot_uri: None,
            icon: None,
            year: None,
            description: None,
            rating_imdb: None,
            category_id: None,
        });
        assert_eq!(series.type_tag(), "series");
        assert_eq!(series.stream_kind(), None);
        assert!(series.matches("sho"));
    }

    #[test]
    fn account_expiry_rounds_up() {
        let info: AccountInfo =
            serde_json::from_value(json!({"phone": "2025-01-10 12:00:00", "mac": "x"})).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(info.days_left(now), Some(3));
        assert!(info.extra.contains_key("mac"));

        let info: AccountInfo = serde_json::from_value(json!({"phone": "March 3, 2026"})).unwrap();
        assert_eq!(
            info.expires_at(),
            Some(Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap())
        );

        assert_eq!(AccountInfo::default().expires_at(), None);
    }

    #[test]
    fn tab_parsing() {
        assert_eq!("VOD".parse::<Tab>(), Ok(Tab::Movies));
        assert!("radio".parse::<Tab>().is_err());
        assert_eq!("episode".parse::<StreamKind>(), Ok(StreamKind::Episode));
    }
}
