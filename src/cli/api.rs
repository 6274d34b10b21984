// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::CommandContext;
use anyhow::Result;
use stalker::models::StreamKind;
use stalker::portal::{Endpoint, ListKind};
use stalker::resolver::stream_request;

/// Raw portal calls, printed as returned
pub enum ApiCommand {
    AccountInfo,
    Genres,
    Channels,
    VodCategories,
    SeriesCategories,
    OrderedList {
        kind: ListKind,
        category: String,
        page: u32,
        search: Option<String>,
    },
    Episodes {
        series_id: String,
    },
    CreateLink {
        cmd: String,
        kind: StreamKind,
    },
}

impl ApiCommand {
    fn endpoint(self) -> Result<Endpoint> {
        Ok(match self {
            ApiCommand::AccountInfo => Endpoint::AccountInfo,
            ApiCommand::Genres => Endpoint::Genres,
            ApiCommand::Channels => Endpoint::LiveChannels,
            ApiCommand::VodCategories => Endpoint::VodCategories,
            ApiCommand::SeriesCategories => Endpoint::SeriesCategories,
            ApiCommand::OrderedList {
                kind,
                category,
                page,
                search,
            } => Endpoint::OrderedList {
                kind,
                category_id: category,
                page,
                search,
            },
            ApiCommand::Episodes { series_id } => Endpoint::Episodes { series_id },
            ApiCommand::CreateLink { cmd, kind } => {
                Endpoint::CreateLink(stream_request(&cmd, kind)?)
            }
        })
    }

    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let (client, portal_name) = context.client()?;
        eprintln!("Using portal: {}", portal_name);

        let endpoint = self.endpoint()?;
        tracing::debug!("GET {}", client.endpoint_url(&endpoint));

        let result = client.request_raw(&endpoint).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_links_carry_the_parsed_command() {
        let endpoint = ApiCommand::CreateLink {
            cmd: "/media/123:4.mpg".to_string(),
            kind: StreamKind::Episode,
        }
        .endpoint()
        .unwrap();
        assert!(matches!(endpoint, Endpoint::CreateLink(_)));
    }

    #[test]
    fn malformed_episode_command_is_rejected() {
        let result = ApiCommand::CreateLink {
            cmd: "/media/123.mpg".to_string(),
            kind: StreamKind::Episode,
        }
        .endpoint();
        assert!(result.is_err());
    }
}
