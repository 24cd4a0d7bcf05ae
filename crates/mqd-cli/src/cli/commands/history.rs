//! `mqd history` – list recently fetched media.

use anyhow::Result;
use mqd_core::history::HistoryDb;

pub async fn run_history(limit: u32) -> Result<()> {
    let db = HistoryDb::open_default().await?;
    let entries = db.recent(limit).await?;
    if entries.is_empty() {
        println!("No history.");
        return Ok(());
    }
    println!("{:<6} {:<12} {:<40} {}", "ID", "FETCHED", "TITLE", "URL");
    for e in entries {
        println!("{:<6} {:<12} {:<40} {}", e.id, e.created_at, e.title, e.url);
    }
    Ok(())
}
