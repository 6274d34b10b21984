// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::CommandContext;
use anyhow::Result;
use stalker::CommandPlayer;
use stalker::models::StreamKind;
use stalker::player::{PlaybackRequest, PlaybackSink};

/// Runs the player in the foreground so the command exits with it
struct ForegroundPlayer(CommandPlayer);

impl PlaybackSink for ForegroundPlayer {
    fn deliver(&self, request: &PlaybackRequest) -> Result<()> {
        self.0.play(request)
    }
}

struct PrintUrl;

impl PlaybackSink for PrintUrl {
    fn deliver(&self, request: &PlaybackRequest) -> Result<()> {
        println!("{}", request.stream_url);
        Ok(())
    }
}

pub struct PlayCommand {
    pub cmd: String,
    pub kind: StreamKind,
    pub title: Option<String>,
    /// Print the resolved URL instead of starting the player
    pub url_only: bool,
}

impl PlayCommand {
    pub async fn execute(self, context: CommandContext, player: CommandPlayer) -> Result<()> {
        let (session, portal_name) = context.session()?;
        tracing::debug!("Resolving {} on {}", self.cmd, portal_name);

        let title = self.title.unwrap_or_else(|| self.cmd.clone());
        if self.url_only {
            session
                .play_command(&self.cmd, self.kind, &title, None, &PrintUrl)
                .await?;
        } else {
            session
                .play_command(&self.cmd, self.kind, &title, None, &ForegroundPlayer(player))
                .await?;
        }
        Ok(())
    }
}
