// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use chrono::Utc;
use stalker::history::HistoryRecord;

#[derive(Debug, Clone, Copy)]
pub enum HistoryList {
    Favourites,
    Recent,
}

pub struct HistoryCommand {
    pub list: HistoryList,
    pub format: OutputFormat,
}

impl HistoryCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let (session, _) = context.session()?;
        let records = match self.list {
            HistoryList::Favourites => session.history().favourites()?,
            HistoryList::Recent => session.history().recent()?,
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
            OutputFormat::Text => {
                if records.is_empty() {
                    println!("Nothing here yet.");
                }
                let now = Utc::now().timestamp_millis();
                for record in &records {
                    println!("{}", format_record(record, now));
                }
            }
        }
        Ok(())
    }
}

fn format_record(record: &HistoryRecord, now_millis: i64) -> String {
    format!(
        "[{}] {} ({}) {}  {}",
        record.kind,
        record.name,
        record.id,
        record.age(now_millis),
        record.cmd
    )
}
