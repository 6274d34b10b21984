// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::error::{Error, Result};
use crate::models::{Episode, Season};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use tracing::{debug, warn};

// `/media/<seriesId>:<seasonId>:<episodeId>.mpg`
static THREE_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/media/(\d+):(\d+):(\d+)\.mpg").expect("three-part episode pattern")
});

// `/media/<seasonId>:<episodeId>.mpg`, season id already identifies the series
static TWO_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/media/([^:]+):(\d+)\.mpg").expect("two-part episode pattern")
});

/// Parsed episode playback command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub series_id: Option<String>,
    pub season_id: String,
    pub episode_id: String,
}

/// Parse an episode `cmd`. Portals disagree on the format, so both the
/// three-part and the two-part form are accepted.
pub fn parse_episode_cmd(cmd: &str) -> Result<EpisodeRef> {
    if let Some(caps) = THREE_PART.captures(cmd) {
        let episode = EpisodeRef {
            series_id: Some(caps[1].to_string()),
            season_id: caps[2].to_string(),
            episode_id: caps[3].to_string(),
        };
        debug!(
            "Episode command {} -> season={}, episode={}",
            cmd, episode.season_id, episode.episode_id
        );
        return Ok(episode);
    }

    if let Some(caps) = TWO_PART.captures(cmd) {
        let episode = EpisodeRef {
            series_id: None,
            season_id: caps[1].to_string(),
            episode_id: caps[2].to_string(),
        };
        debug!(
            "Episode command {} -> season={}, episode={}",
            cmd, episode.season_id, episode.episode_id
        );
        return Ok(episode);
    }

    Err(Error::InvalidCommandFormat(cmd.to_string()))
}

pub fn episode_id(season_id: &str, episode_number: u32) -> String {
    format!("{}:{}", season_id, episode_number)
}

/// Inverse of [`episode_id`].
pub fn split_episode_id(id: &str) -> Option<(&str, u32)> {
    let (season, episode) = id.rsplit_once(':')?;
    if season.is_empty() {
        return None;
    }
    Some((season, episode.parse().ok()?))
}

fn compare_season_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Flatten the seasons of a series into playable episodes ordered by
/// `(season, episode)`, both compared numerically.
pub fn flatten_episodes(seasons: &[Season], series_name: &str) -> Vec<Episode> {
    let mut episodes = Vec::new();

    for season in seasons {
        if season.series.is_empty() {
            warn!("Season {} has no episodes", season.id);
            continue;
        }

        let season_label = season.name.as_deref().unwrap_or(&season.id);

        for &number in &season.series {
            episodes.push(Episode {
                id: episode_id(&season.id, number),
                season_id: season.id.clone(),
                episode_number: number,
                name: format!("Season {} Episode {}", season_label, number),
                series_name: series_name.to_string(),
                cmd: format!("/media/{}.mpg", episode_id(&season.id, number)),
                screenshot: season.screenshot_uri.clone(),
                description: season.description.clone(),
                year: season.year.clone(),
                rating: season.rating_imdb.clone(),
                actors: season.actors.clone(),
                director: season.director.clone(),
            });
        }
    }

    episodes.sort_by(|a, b| {
        compare_season_ids(&a.season_id, &b.season_id)
            .then(a.episode_number.cmp(&b.episode_number))
    });
    // Ids must be unique within a series; the first listing of a repeated
    // episode wins.
    episodes.dedup_by(|later, earlier| later.id == earlier.id);

    debug!("Flattened {} episodes for {}", episodes.len(), series_name);
    episodes
}
