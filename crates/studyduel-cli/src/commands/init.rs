//! The `studyduel init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("studyduel.toml").exists() {
        println!("studyduel.toml already exists, skipping.");
    } else {
        std::fs::write("studyduel.toml", SAMPLE_CONFIG)?;
        println!("Created studyduel.toml");
    }

    std::fs::create_dir_all("questions")?;
    let example_path = Path::new("questions/example.toml");
    if example_path.exists() {
        println!("questions/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUESTION_SET)?;
        println!("Created questions/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add your own questions under questions/");
    println!("  2. Run: studyduel validate --questions questions");
    println!("  3. Run: studyduel play");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyduel configuration

default_account = "player"
questions = "questions"

[store]
type = "file"
path = "studyduel-profiles.json"

# Remote profile service instead:
# [store]
# type = "http"
# base_url = "https://ranks.example.com/api"
# api_key = "${STUDYDUEL_API_KEY}"

[rules]
king_hp_start = 100
tower_hp_start = 50
energy_start = 3
energy_cap = 5
draw_cost = 1
attack_damage = 15
defense_damage = 10
opponent_tower_damage = 10
opponent_king_damage = 5
p_tower_hit = 0.6
p_king_hit = 0.5
energy_recharge = 1
minor_reward = 2
think_delay_ms = 1500

# Override the arena ladder with [[tiers]] entries:
# [[tiers]]
# name = "Bronze"
# min_points = 0
# win_bonus = 30
# lose_penalty = 10
"#;

const EXAMPLE_QUESTION_SET: &str = r#"[question_set]
id = "example"
name = "Example Questions"
subject = "general"
description = "A few questions to get started"

[[questions]]
prompt = "What is the chemical symbol for gold?"
answer = "Au"

[[questions]]
prompt = "How many sides does a hexagon have?"
answer = "6"

[[questions]]
prompt = "Which planet is known as the Red Planet?"
answer = "Mars"

[[questions]]
prompt = "What is the capital of Japan?"
answer = "Tokyo"

[[questions]]
prompt = "What gas do plants absorb from the air?"
answer = "Carbon dioxide"
"#;
