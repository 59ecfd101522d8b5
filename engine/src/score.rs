use log::debug;

use crate::resolver::is_tracked_team;
use crate::{ClubConfig, MatchRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Win iff `side` took strictly more sets. Equal sets fall to Loss; volleyball
    /// has no draws so a tie only shows up with bad source data.
    pub fn for_side(result: SetResult, side: Side) -> Self {
        let (own, opp) = result.for_side(side);
        if own > opp { Outcome::Win } else { Outcome::Loss }
    }

    /// "V"ittoria / "P"ersa, as shown next to results.
    pub fn badge(self) -> &'static str {
        match self {
            Outcome::Win => "V",
            Outcome::Loss => "P",
        }
    }
}

/// Sets won by each side, parsed from the "Risultato" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetResult {
    pub home: u32,
    pub away: u32,
}

impl SetResult {
    /// Exactly two `-`-separated integer fields; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (home, away) = raw.trim().split_once('-')?;
        if away.contains('-') {
            return None;
        }
        Some(Self {
            home: home.trim().parse().ok()?,
            away: away.trim().parse().ok()?,
        })
    }

    pub fn is_tie(&self) -> bool {
        self.home == self.away
    }

    /// (own, opponent) from the perspective of `side`.
    pub fn for_side(&self, side: Side) -> (u32, u32) {
        match side {
            Side::Home => (self.home, self.away),
            Side::Away => (self.away, self.home),
        }
    }
}

/// Points of a single set, home first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPoints {
    pub home: u32,
    pub away: u32,
}

impl SetPoints {
    pub fn for_side(&self, side: Side) -> (u32, u32) {
        match side {
            Side::Home => (self.home, self.away),
            Side::Away => (self.away, self.home),
        }
    }
}

/// Parse the "Parziali" column: `(25-20) (25-18)` or `25-20 25-18`. Tokens that
/// don't yield two numbers are skipped.
pub fn parse_set_points(raw: &str) -> Vec<SetPoints> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let cleaned: String = token.chars().filter(|c| *c != '(' && *c != ')').collect();
            let mut parts = cleaned.split('-');
            let home = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
            let away = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
            match home.zip(away) {
                Some((home, away)) => Some(SetPoints { home, away }),
                None => {
                    debug!("skipping set score token {token:?}");
                    None
                }
            }
        })
        .collect()
}

/// Outcome of a single row for `team`, without aggregation.
///
/// The team must appear on a tracked side of the row; `None` when it doesn't, or
/// when the row has no well-formed result.
pub fn match_result(row: &MatchRow, team: &str, config: &ClubConfig) -> Option<Outcome> {
    let side = if is_tracked_team(&row.home_team, config) && row.home_team == team {
        Side::Home
    } else if is_tracked_team(&row.away_team, config) && row.away_team == team {
        Side::Away
    } else {
        return None;
    };
    let result = row.set_result()?;
    Some(Outcome::for_side(result, side))
}
