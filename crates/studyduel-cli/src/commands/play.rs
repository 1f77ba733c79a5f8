//! The `studyduel play` command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use studyduel_core::duel::MatchSnapshot;
use studyduel_core::opponent::{OpponentAction, OpponentReport};
use studyduel_core::pool::QuestionPool;
use studyduel_core::rank::{RankChange, TierTransition};
use studyduel_core::session::{DrawReport, TurnReport};
use studyduel_core::{DuelError, DuelObserver, DuelSession, MatchStatus, RankEngine};
use studyduel_store::config::load_config_from;
use studyduel_store::{create_store, QuestionSetSource};

/// Prints duel events as they happen.
struct ConsoleObserver;

impl DuelObserver for ConsoleObserver {
    fn on_turn(&self, report: &TurnReport) {
        let strike = report.outcome.strike;
        let damage = strike.tower_damage + strike.king_damage;
        if report.outcome.correct {
            println!("Correct! You hit the opponent for {damage}.");
            if strike.tower_destroyed {
                println!("The opponent's tower falls.");
            }
        } else {
            println!("Wrong. You take {damage} damage.");
            if strike.tower_destroyed {
                println!("Your tower falls.");
            }
        }
        if let Some(reward) = report.reward {
            println!("+{} rank points ({} total)", reward.applied(), reward.after);
        }
        print_board(&report.snapshot);
    }

    fn on_opponent_turn(&self, report: &OpponentReport) {
        match report.action {
            OpponentAction::TowerHit => {
                println!("Opponent hits your tower for {}.", report.strike.tower_damage);
                if report.strike.king_damage > 0 {
                    println!(
                        "The blow carries through to your king for {}.",
                        report.strike.king_damage
                    );
                }
            }
            OpponentAction::KingHit => {
                println!("Opponent hits your king for {}.", report.strike.king_damage);
            }
            OpponentAction::Miss => println!("Opponent misses."),
        }
        println!("Energy: {}", report.energy);
    }

    fn on_settled(&self, change: &RankChange) {
        if change.won {
            println!("\nYou won the duel!");
        } else {
            println!("\nYou lost the duel.");
        }
        println!(
            "Rank points: {} -> {} ({:+}), tier {}",
            change.points_before, change.points_after, change.amount, change.tier
        );
        match &change.transition {
            Some(TierTransition::Promoted { from, to }) => println!("Promoted: {from} -> {to}"),
            Some(TierTransition::Demoted { from, to }) => println!("Demoted: {from} -> {to}"),
            None => {}
        }
    }
}

fn print_board(snap: &MatchSnapshot) {
    println!(
        "You: king {} tower {} | Opponent: king {} tower {} | Energy {}/{}",
        snap.player_king_hp,
        snap.player_tower_hp,
        snap.opponent_king_hp,
        snap.opponent_tower_hp,
        snap.energy,
        snap.energy_cap
    );
}

pub async fn execute(
    questions: Option<PathBuf>,
    subject: Option<String>,
    account: Option<String>,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let account = account.unwrap_or_else(|| config.default_account.clone());
    let questions = questions.unwrap_or_else(|| config.questions.clone());

    let source = QuestionSetSource::from_path(&questions)?;
    let subject = match subject {
        Some(s) => s,
        None => source
            .subjects()
            .first()
            .map(|s| s.to_string())
            .with_context(|| format!("no question sets found in {}", questions.display()))?,
    };
    let pool = QuestionPool::from_source(&source, &subject).await?;
    tracing::info!(
        account = %account,
        subject = %subject,
        questions = pool.len(),
        store = ?config.store,
        "preparing duel"
    );

    let store = create_store(&config.store)?;
    store
        .create_profile(&account)
        .await
        .with_context(|| format!("failed to open profile for '{account}'"))?;
    let rank = RankEngine::new(store, Arc::new(config.tiers.clone()), config.rules.minor_reward);

    let mut session = DuelSession::new(account.clone(), config.rules.clone(), pool, rank)
        .with_observer(Box::new(ConsoleObserver));
    if let Some(seed) = seed {
        session = session.with_seed(seed);
    }

    session
        .start()
        .with_context(|| format!("cannot start a duel on subject '{subject}'"))?;
    println!("Duel started: {account} vs. the computer ({subject})");
    println!("Type your answer, or 'quit' to leave.\n");
    print_board(&session.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if session.opponent_pending() {
            println!("Opponent is thinking...");
            session.wait_for_opponent().await?;
        }
        if session.status() != MatchStatus::Playing {
            break;
        }

        let item = match session.request_question().await {
            Ok(DrawReport::Question(item)) => item,
            Ok(DrawReport::Exhausted(_)) => {
                println!("No questions left to draw.");
                break;
            }
            Ok(DrawReport::Defeated(_)) => break,
            Err(DuelError::InsufficientEnergy { energy, cost }) => {
                println!("Not enough energy to draw (have {energy}, need {cost}).");
                session.leave();
                break;
            }
            Err(e) => return Err(e.into()),
        };

        println!("\nQ: {}", item.prompt);
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            session.leave();
            println!("\nYou left the match.");
            break;
        };
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("quit") {
            session.leave();
            println!("You left the match.");
            break;
        }

        session.submit_answer(answer).await?;
    }

    if let Ok((points, tier)) = session.rank().standing(&account).await {
        println!("\n{account}: {points} points ({})", tier.name);
    }

    Ok(())
}
