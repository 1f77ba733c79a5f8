//! The `studyduel leaderboard` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyduel_core::leaderboard::leaderboard;
use studyduel_store::config::load_config_from;
use studyduel_store::create_store;

pub async fn execute(top: usize, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(top >= 1, "--top must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let store = create_store(&config.store)?;
    let rows = leaderboard(store.as_ref(), &config.tiers, top).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No profiles yet. Play a duel with `studyduel play`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Account", "Points", "Tier"]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(row.position),
            Cell::new(&row.account_id),
            Cell::new(row.points),
            Cell::new(&row.tier),
        ]);
    }

    println!("{table}");
    Ok(())
}
