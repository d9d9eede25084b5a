//! SeaORM entity definitions for the challenge engine.

pub mod challenge;
pub mod invitation;
pub mod leaderboard_entry;
pub mod participant;
pub mod team;
pub mod team_leaderboard_entry;
pub mod team_member;

pub use challenge::{ChallengeCategory, ChallengeStatus, ChallengeType};
