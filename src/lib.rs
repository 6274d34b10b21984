// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod catalog;
pub mod config;
pub mod episode;
pub mod error;
pub mod history;
pub mod menu;
pub mod models;
pub mod navigation;
pub mod pagination;
pub mod player;
pub mod portal;
pub mod resolver;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use history::{History, JsonFileStore};
pub use menu::MenuSystem;
pub use player::CommandPlayer;
pub use portal::{Portal, PortalClient};
pub use session::Session;
