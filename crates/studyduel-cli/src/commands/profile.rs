//! The `studyduel profile` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use studyduel_store::config::load_config_from;
use studyduel_store::create_store;

pub async fn execute(account: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let account = account.unwrap_or_else(|| config.default_account.clone());
    let store = create_store(&config.store)?;

    let points = store
        .get_points(&account)
        .await
        .with_context(|| format!("failed to read profile for '{account}'"))?;
    let tier = config.tiers.tier_for(points);
    let next = match config.tiers.next_tier(points) {
        Some(next) => format!("{} in {} points", next.name, next.min_points - points),
        None => "top tier".to_string(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Account", "Points", "Tier", "Win", "Loss", "Next"]);
    table.add_row(vec![
        Cell::new(&account),
        Cell::new(points),
        Cell::new(&tier.name),
        Cell::new(format!("+{}", tier.win_bonus)),
        Cell::new(format!("-{}", tier.lose_penalty)),
        Cell::new(next),
    ]);

    println!("{table}");
    Ok(())
}
