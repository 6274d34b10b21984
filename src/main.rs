// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use stalker::models::{StreamKind, Tab};
use stalker::portal::ListKind;
use stalker::{CommandPlayer, Config, MenuSystem};

mod cli;
use cli::{
    ApiCommand, CommandContext, HistoryCommand, HistoryList, OutputFormat, PlayCommand,
    SearchCommand,
};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

fn parse_list_kind(s: &str) -> Result<ListKind, String> {
    match s.to_lowercase().as_str() {
        "vod" | "movie" | "movies" => Ok(ListKind::Vod),
        "series" => Ok(ListKind::Series),
        _ => Err(format!("Invalid list kind: {}. Use 'vod' or 'series'", s)),
    }
}

#[derive(Parser)]
#[command(name = "stalker")]
#[command(about = "A terminal client for Stalker middleware IPTV portals")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (stalker_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Portal name to use (case-insensitive, or set STALKER_PORTAL)
    #[arg(short, long, global = true)]
    portal: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the portal interactively (default if no command given)
    Browse,

    /// Resolve a playback command and start the player
    Play {
        /// Command as listed by the portal, e.g. "ffrt http://..." or "/media/1:2.mpg"
        cmd: String,
        /// Stream kind (live, vod, episode)
        #[arg(short, long, default_value = "live")]
        kind: StreamKind,
        /// Title shown in logs
        #[arg(short, long)]
        title: Option<String>,
        /// Print the stream URL instead of playing it
        #[arg(long)]
        url_only: bool,
    },

    /// Search channels, movies or series
    Search {
        /// Search query
        query: String,
        /// Tab to search (live, movies, series)
        #[arg(short, long, default_value = "live")]
        tab: Tab,
        /// Category or genre id to search in
        #[arg(short, long)]
        category: Option<String>,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List favourites
    Favourites {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List recently watched
    Recent {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Execute raw portal calls
    #[command(subcommand)]
    Api(ApiSubcommand),
}

#[derive(Subcommand)]
enum ApiSubcommand {
    /// Get account info
    AccountInfo,
    /// Get live TV genres
    Genres,
    /// Get all live channels
    Channels,
    /// Get VOD categories
    VodCategories,
    /// Get series categories
    SeriesCategories,
    /// Get one page of movies or series
    OrderedList {
        #[arg(short, long, default_value = "vod", value_parser = parse_list_kind)]
        kind: ListKind,
        #[arg(short, long, default_value = "*")]
        category: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Get the seasons of a series
    Episodes { series_id: String },
    /// Create a stream link for a playback command
    CreateLink {
        cmd: String,
        #[arg(short, long, default_value = "live")]
        kind: StreamKind,
    },
}

impl From<ApiSubcommand> for ApiCommand {
    fn from(cmd: ApiSubcommand) -> Self {
        match cmd {
            ApiSubcommand::AccountInfo => ApiCommand::AccountInfo,
            ApiSubcommand::Genres => ApiCommand::Genres,
            ApiSubcommand::Channels => ApiCommand::Channels,
            ApiSubcommand::VodCategories => ApiCommand::VodCategories,
            ApiSubcommand::SeriesCategories => ApiCommand::SeriesCategories,
            ApiSubcommand::OrderedList {
                kind,
                category,
                page,
                search,
            } => ApiCommand::OrderedList {
                kind,
                category,
                page,
                search,
            },
            ApiSubcommand::Episodes { series_id } => ApiCommand::Episodes { series_id },
            ApiSubcommand::CreateLink { cmd, kind } => ApiCommand::CreateLink { cmd, kind },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.debug_log {
        let file = File::create("stalker_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("stalker=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    // Load configuration, writing a template on first run
    let config_path = Config::default_path();
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        let config = Config::default();
        Config::ensure_config_dir()?;
        config.save(&config_path)?;
        eprintln!(
            "Created example configuration at {}. Add your portal details and run again.",
            config_path.display()
        );
        return Ok(());
    };

    let selected_portal = cli
        .portal
        .clone()
        .or_else(|| std::env::var("STALKER_PORTAL").ok());
    let player = CommandPlayer::new(config.player.clone());
    let page_size = config.ui.page_size;
    let context = CommandContext::new(config, selected_portal);

    match cli.command {
        None | Some(Commands::Browse) => {
            let (session, portal_name) = context.session()?;
            println!("Connected to {}", portal_name);
            let mut menu = MenuSystem::new(session, player, page_size);
            menu.run().await?;
        }

        Some(Commands::Play {
            cmd,
            kind,
            title,
            url_only,
        }) => {
            let cmd = PlayCommand {
                cmd,
                kind,
                title,
                url_only,
            };
            cmd.execute(context, player).await?;
        }

        Some(Commands::Search {
            query,
            tab,
            category,
            format,
        }) => {
            let cmd = SearchCommand {
                query,
                tab,
                category,
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(context).await?;
        }

        Some(Commands::Favourites { format }) => {
            let cmd = HistoryCommand {
                list: HistoryList::Favourites,
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(context).await?;
        }

        Some(Commands::Recent { format }) => {
            let cmd = HistoryCommand {
                list: HistoryList::Recent,
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(context).await?;
        }

        Some(Commands::Api(api_cmd)) => {
            ApiCommand::from(api_cmd).execute(context).await?;
        }
    }

    Ok(())
}
