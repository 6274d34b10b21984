// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use inquire::Select;

use stalker::config::PortalConfig;
use stalker::{Config, History, JsonFileStore, PortalClient, Session};

pub mod api;
pub mod history;
pub mod play;
pub mod search;

pub use api::ApiCommand;
pub use history::{HistoryCommand, HistoryList};
pub use play::PlayCommand;
pub use search::SearchCommand;

pub type PortalSession = Session<PortalClient, JsonFileStore>;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format: {}. Use 'text' or 'json'", s),
        }
    }
}

/// Context for command execution with portal selection
pub struct CommandContext {
    pub config: Config,
    pub selected_portal: Option<String>,
}

impl CommandContext {
    pub fn new(config: Config, selected_portal: Option<String>) -> Self {
        Self {
            config,
            selected_portal,
        }
    }

    /// Pick one portal by name, the only one configured, or by prompting.
    pub fn select_portal(&self) -> Result<&PortalConfig> {
        let portals = &self.config.portals;
        if portals.is_empty() {
            anyhow::bail!("No portals configured. Please add portal details to config.toml.");
        }

        if let Some(name) = &self.selected_portal {
            self.config
                .find_portal(name)
                .ok_or_else(|| anyhow::anyhow!("Portal '{}' not found", name))
        } else if portals.len() == 1 {
            Ok(&portals[0])
        } else {
            self.prompt_portal_selection()
        }
    }

    pub fn client(&self) -> Result<(PortalClient, String)> {
        let portal = self.select_portal()?;
        let client = PortalClient::new(&portal.url, &portal.mac, &self.config.http)?;
        Ok((client, portal.display_name()))
    }

    /// Client plus the per-portal favourites and history store.
    pub fn session(&self) -> Result<(PortalSession, String)> {
        let (client, name) = self.client()?;
        let history = History::new(JsonFileStore::for_portal(client.base_url())?);
        Ok((Session::new(client, history, self.config.ui.items_per_page), name))
    }

    fn prompt_portal_selection(&self) -> Result<&PortalConfig> {
        let names: Vec<String> = self.config.portals.iter().map(|p| p.display_name()).collect();

        let selection = Select::new("Select portal:", names).prompt()?;

        self.config
            .portals
            .iter()
            .find(|p| p.display_name() == selection)
            .ok_or_else(|| anyhow::anyhow!("Portal not found"))
    }
}
