//! Completion rules and scoring.
//!
//! Pure functions only: the challenge configuration is folded into a [`Rule`]
//! once, and evaluation takes the participant's numbers as plain values so
//! tests never need a database or a clock.

use crate::entity::challenge::{self, ChallengeType};

/// Flat bonus for finishing a challenge at all.
pub const COMPLETION_BONUS: f64 = 1000.0;

/// Finishers faster than this many seconds earn an extra bonus that decays
/// linearly to zero; slower finishers are never penalized below zero.
pub const FAST_FINISH_WINDOW_SECS: i64 = 500;

/// Completion predicate for one challenge, one variant per challenge type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
  /// Progress must reach the configured target (distance, time, speed).
  Target(f64),
  /// Progress counts occurrences and must reach the minimum (frequency).
  Occurrences(i32),
  /// The streak counter must reach the minimum (streak).
  Streak(i32),
  /// Logical AND of whichever sub-targets the challenge configures.
  Combined {
    target: Option<f64>,
    occurrences: Option<i32>,
    streak: Option<i32>,
  },
  /// Evaluated by an external rule engine, never by us.
  External,
}

impl Rule {
  pub fn for_challenge(ch: &challenge::Model) -> Self {
    match ch.challenge_type {
      ChallengeType::Distance | ChallengeType::Time | ChallengeType::Speed => {
        Rule::Target(ch.target_value)
      }
      ChallengeType::Frequency => Rule::Occurrences(ch.min_occurrences),
      ChallengeType::Streak => Rule::Streak(ch.min_streak),
      ChallengeType::Combined => Rule::Combined {
        target: (ch.target_value > 0.0).then_some(ch.target_value),
        occurrences: (ch.min_occurrences > 0).then_some(ch.min_occurrences),
        streak: (ch.min_streak > 0).then_some(ch.min_streak),
      },
      ChallengeType::Custom => Rule::External,
    }
  }

  pub fn is_complete(&self, progress: f64, streak: i32) -> bool {
    match *self {
      Rule::Target(target) => progress >= target,
      Rule::Occurrences(min) => progress >= min as f64,
      Rule::Streak(min) => streak >= min,
      Rule::Combined { target, occurrences, streak: min_streak } => {
        // a combined challenge with no sub-targets can never complete
        if target.is_none() && occurrences.is_none() && min_streak.is_none() {
          return false;
        }
        target.is_none_or(|t| progress >= t)
          && occurrences.is_none_or(|o| progress >= o as f64)
          && min_streak.is_none_or(|s| streak >= s)
      }
      Rule::External => false,
    }
  }
}

/// Ranking score: raw progress, consistency, and a completion bonus that
/// rewards fast finishers without ever going negative.
pub fn score(progress: f64, streak: i32, completion_time_secs: Option<i64>) -> f64 {
  let base = progress * 10.0 + streak as f64 * 50.0;
  match completion_time_secs {
    Some(secs) => {
      base + COMPLETION_BONUS + (FAST_FINISH_WINDOW_SECS - secs).max(0) as f64
    }
    None => base,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_target_rule() {
    let rule = Rule::Target(100.0);
    assert!(!rule.is_complete(99.9, 0));
    assert!(rule.is_complete(100.0, 0));
    assert!(rule.is_complete(250.0, 0));
  }

  #[test]
  fn test_streak_rule_ignores_progress() {
    let rule = Rule::Streak(7);
    assert!(!rule.is_complete(1000.0, 6));
    assert!(rule.is_complete(0.0, 7));
  }

  #[test]
  fn test_combined_is_logical_and() {
    let rule =
      Rule::Combined { target: Some(50.0), occurrences: None, streak: Some(3) };
    assert!(!rule.is_complete(50.0, 2));
    assert!(!rule.is_complete(49.0, 3));
    assert!(rule.is_complete(50.0, 3));
  }

  #[test]
  fn test_empty_combined_never_completes() {
    let rule = Rule::Combined { target: None, occurrences: None, streak: None };
    assert!(!rule.is_complete(f64::MAX, i32::MAX));
  }

  #[test]
  fn test_custom_is_external() {
    assert!(!Rule::External.is_complete(f64::MAX, i32::MAX));
  }

  #[test]
  fn test_score_formula() {
    // progress and streak only
    assert_eq!(score(50.0, 2, None), 600.0);
    // fast finish: full decay window remaining
    assert_eq!(score(100.0, 0, Some(0)), 2500.0);
    assert_eq!(score(100.0, 0, Some(200)), 2300.0);
    // slow finish: time bonus clamps at zero, never negative
    assert_eq!(score(100.0, 0, Some(86_400)), 2000.0);
  }

  #[test]
  fn test_score_non_negative() {
    assert!(score(0.0, 0, None) >= 0.0);
    assert!(score(0.0, 0, Some(i64::MAX)) >= 0.0);
  }
}
