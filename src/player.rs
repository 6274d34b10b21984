// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::config::PlayerConfig;
use crate::models::StreamKind;
use anyhow::{Context, Result};
use serde::Serialize;
use std::process::{Command, Stdio};
use tracing::info;

/// What the core hands to the media player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackRequest {
    pub stream_url: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub kind: StreamKind,
}

pub trait PlaybackSink {
    fn deliver(&self, request: &PlaybackRequest) -> Result<()>;
}

/// Runs an external player (mpv by default) on the stream URL
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    config: PlayerConfig,
}

impl CommandPlayer {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    fn command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);
        cmd.arg(url);
        cmd
    }

    /// Run in the foreground until the player exits.
    pub fn play(&self, request: &PlaybackRequest) -> Result<()> {
        println!("Starting player: {} {}", self.config.command, request.stream_url);

        let status = self.command(&request.stream_url).status().with_context(|| {
            format!("Failed to execute player command: {}", self.config.command)
        })?;

        if !status.success() {
            anyhow::bail!("Player process failed with exit code: {}", status);
        }
        Ok(())
    }

    /// Start detached with all stdio closed.
    pub fn play_background(&self, request: &PlaybackRequest) -> Result<()> {
        let mut cmd = self.command(&request.stream_url);
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());

        cmd.spawn().with_context(|| {
            format!(
                "Failed to start player in background: {}",
                self.config.command
            )
        })?;

        info!("Playing {} ({})", request.title, request.kind);
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.config.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl PlaybackSink for CommandPlayer {
    fn deliver(&self, request: &PlaybackRequest) -> Result<()> {
        self.play_background(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_follows_configured_args() {
        let player = CommandPlayer::new(PlayerConfig {
            command: "mpv".into(),
            args: vec!["--fs".into()],
        });
        let cmd = player.command("http://s/1.ts");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), "mpv");
        assert_eq!(args, vec!["--fs", "http://s/1.ts"]);
    }

    #[test]
    fn missing_player_is_unavailable() {
        let player = CommandPlayer::new(PlayerConfig {
            command: "stalker-no-such-player".into(),
            args: Vec::new(),
        });
        assert!(!player.is_available());
    }
}
