//! Subcommand implementations.

pub mod init;
pub mod leaderboard;
pub mod play;
pub mod profile;
pub mod tiers;
pub mod validate;
