// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use serde_json::json;
use stalker::models::{ALL_CATEGORIES, Tab};
use stalker::session::ViewEntry;

pub struct SearchCommand {
    pub query: String,
    pub tab: Tab,
    /// Category to search in; movies and series default to all categories.
    pub category: Option<String>,
    pub format: OutputFormat,
}

impl SearchCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let (mut session, portal_name) = context.session()?;
        eprintln!("Searching {} in {}...", self.tab, portal_name);

        session.connect().await?;
        session.switch_tab(self.tab).await?;

        match (&self.category, self.tab) {
            (Some(category), _) => {
                session.sidebar_click(category).await?;
            }
            (None, Tab::Movies | Tab::Series) => {
                session.sidebar_click(ALL_CATEGORIES).await?;
            }
            (None, Tab::Live) => {}
        }

        let view = session.search(&self.query).await?;

        let portal = session.portal();
        let results: Vec<serde_json::Value> = view
            .entries
            .iter()
            .map(|entry| match entry {
                ViewEntry::Item(item) => json!({
                    "id": item.id(),
                    "name": item.name(),
                    "type": item.type_tag(),
                    "cmd": item.cmd(),
                    "image": item.image().and_then(|path| portal.absolute_url(path)),
                }),
                ViewEntry::Category(category) => json!({
                    "id": category.id,
                    "name": category.title,
                    "type": "category",
                }),
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&json!(results))?);
            }
            OutputFormat::Text => {
                if results.is_empty() {
                    println!("No results found for '{}'", self.query);
                } else {
                    for result in &results {
                        Self::print_text_result(result);
                    }
                    if view.has_more {
                        eprintln!("More results are available on the portal.");
                    }
                }
            }
        }

        Ok(())
    }

    fn print_text_result(result: &serde_json::Value) {
        let id = result["id"].as_str().unwrap_or("");
        let name = result["name"].as_str().unwrap_or("");
        let kind = result["type"].as_str().unwrap_or("");
        println!("[{}] {} ({})", kind, name, id);
    }
}
