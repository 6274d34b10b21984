// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::episode::parse_episode_cmd;
use crate::error::{Error, Result};
use crate::models::StreamKind;
use crate::portal::{Portal, StreamRequest};
use regex::Regex;
use std::sync::{LazyLock, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

static STREAM_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("stream url pattern"));

/// First absolute http(s) URL embedded in a create_link `cmd`, e.g. the URL
/// in `ffmpeg http://host/live/1.ts`.
pub fn extract_stream_url(cmd: &str) -> Result<String> {
    STREAM_URL
        .find(cmd)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::NoStreamUrlFound(cmd.to_string()))
}

pub fn stream_request(cmd: &str, kind: StreamKind) -> Result<StreamRequest> {
    let cmd = cmd.to_string();
    Ok(match kind {
        StreamKind::Live => StreamRequest::Live { cmd },
        StreamKind::Vod => StreamRequest::Vod { cmd },
        StreamKind::Episode => {
            let episode = parse_episode_cmd(&cmd)?;
            StreamRequest::Episode { cmd, episode }
        }
    })
}

/// Turns playback commands into stream URLs. Only the most recent call to
/// [`StreamResolver::resolve`] can produce a URL; starting a new one cancels
/// whatever was in flight.
#[derive(Debug, Default)]
pub struct StreamResolver {
    current: Mutex<Option<CancellationToken>>,
}

impl StreamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&self) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *current = Some(token.clone());
        token
    }

    /// Abandon the in-flight resolution, if any.
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = current.take() {
            token.cancel();
        }
    }

    pub async fn resolve<P: Portal>(
        &self,
        portal: &P,
        cmd: &str,
        kind: StreamKind,
    ) -> Result<String> {
        let token = self.begin();
        let request = stream_request(cmd, kind)?;
        debug!("Resolving {} stream: {}", kind, cmd);

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Stream request superseded: {}", cmd);
                return Err(Error::StreamRequestCancelled);
            }
            response = portal.create_stream_link(&request) => response?,
        };

        if token.is_cancelled() {
            return Err(Error::StreamRequestCancelled);
        }

        let url = extract_stream_url(&response)?;
        debug!("Resolved stream URL: {}", url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPortal;
    use std::rc::Rc;
    use tokio::sync::Notify;

    #[test]
    fn extracts_first_url() {
        assert_eq!(
            extract_stream_url("ffmpeg http://host:8080/live/1.ts").unwrap(),
            "http://host:8080/live/1.ts"
        );
        assert_eq!(
            extract_stream_url("auto https://a/1.m3u8 http://b/2.ts").unwrap(),
            "https://a/1.m3u8"
        );
        assert!(matches!(
            extract_stream_url("ffmpeg /media/1.mpg"),
            Err(Error::NoStreamUrlFound(_))
        ));
    }

    #[test]
    fn episode_requests_need_a_valid_cmd() {
        let request = stream_request("/media/12:3:7.mpg", StreamKind::Episode).unwrap();
        match request {
            StreamRequest::Episode { episode, .. } => {
                assert_eq!(episode.season_id, "3");
                assert_eq!(episode.episode_id, "7");
            }
            other => panic!("unexpected request {:?}", other),
        }

        assert!(matches!(
            stream_request("/media/bad.mpg", StreamKind::Episode),
            Err(Error::InvalidCommandFormat(_))
        ));
        assert!(stream_request("/media/bad.mpg", StreamKind::Vod).is_ok());
    }

    #[tokio::test]
    async fn resolves_vod() {
        let portal = ScriptedPortal::default().link("/media/5.mpg", "ffmpeg http://s/5.mkv");
        let resolver = StreamResolver::new();
        let url = resolver
            .resolve(&portal, "/media/5.mpg", StreamKind::Vod)
            .await
            .unwrap();
        assert_eq!(url, "http://s/5.mkv");
    }

    #[tokio::test]
    async fn missing_url_is_reported() {
        let portal = ScriptedPortal::default().link("ch1", "ffrt /no/url");
        let resolver = StreamResolver::new();
        let result = resolver.resolve(&portal, "ch1", StreamKind::Live).await;
        assert!(matches!(result, Err(Error::NoStreamUrlFound(_))));
    }

    #[tokio::test]
    async fn last_request_wins() {
        let gate = Rc::new(Notify::new());
        let mut portal = ScriptedPortal::default()
            .link("slow", "ffmpeg http://s/slow.ts")
            .link("fast", "ffmpeg http://s/fast.ts");
        portal.gates.insert("slow".into(), gate.clone());
        let resolver = StreamResolver::new();

        let (first, second) = tokio::join!(
            resolver.resolve(&portal, "slow", StreamKind::Live),
            async {
                let url = resolver.resolve(&portal, "fast", StreamKind::Live).await;
                gate.notify_one();
                url
            }
        );

        assert!(matches!(first, Err(Error::StreamRequestCancelled)));
        assert_eq!(second.unwrap(), "http://s/fast.ts");
        assert_eq!(portal.count("create_link"), 2);
    }

    #[tokio::test]
    async fn cancel_abandons_pending() {
        let gate = Rc::new(Notify::new());
        let mut portal = ScriptedPortal::default().link("slow", "ffmpeg http://s/slow.ts");
        portal.gates.insert("slow".into(), gate.clone());
        let resolver = StreamResolver::new();

        let (result, _) = tokio::join!(
            resolver.resolve(&portal, "slow", StreamKind::Vod),
            async {
                resolver.cancel();
                gate.notify_one();
            }
        );
        assert!(result.unwrap_err().is_cancellation());
    }
}
