//! The `studyduel tiers` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyduel_store::config::load_config_from;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Tier", "From", "Win bonus", "Loss penalty"]);
    for tier in config.tiers.tiers() {
        table.add_row(vec![
            Cell::new(&tier.name),
            Cell::new(tier.min_points),
            Cell::new(format!("+{}", tier.win_bonus)),
            Cell::new(format!("-{}", tier.lose_penalty)),
        ]);
    }

    println!("{table}");
    Ok(())
}
