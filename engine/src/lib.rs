pub mod aggregate;
pub mod date;
pub mod post;
pub mod query;
pub mod resolver;
pub mod score;
pub mod source;
pub mod standings;
pub mod status;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::score::{SetPoints, SetResult};
use crate::status::MatchStatus;

pub use aggregate::{
    AggregateOptions, BATCH_SIZE, InternalFixturePolicy, StatsAggregator, aggregate,
    aggregate_with,
};
pub use date::MissingDatePolicy;
pub use resolver::{derive_category, is_tracked_team};
pub use score::{Outcome, Side, match_result};

/// Output of the aggregator, keyed by the team's display name as it appears in the rows.
pub type TeamStatsMap = BTreeMap<String, TeamStats>;

// ---------------------------------------------------------------------------
// Input rows: one per spreadsheet line, canonical column names preserved
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    #[serde(rename = "Data", default, deserialize_with = "source::lenient_cell")]
    pub date: String, // "DD/MM/YYYY"
    #[serde(rename = "Ora", default, deserialize_with = "source::lenient_cell")]
    pub time: String, // "HH:MM"
    #[serde(rename = "SquadraCasa", default, deserialize_with = "source::lenient_cell")]
    pub home_team: String,
    #[serde(rename = "SquadraOspite", default, deserialize_with = "source::lenient_cell")]
    pub away_team: String,
    #[serde(rename = "Impianto", default, deserialize_with = "source::lenient_cell")]
    pub venue: String,
    #[serde(rename = "Campionato", default, deserialize_with = "source::lenient_cell")]
    pub league: String,
    #[serde(rename = "StatoDescrizione", default, deserialize_with = "source::lenient_cell")]
    pub status_label: String,
    #[serde(rename = "Risultato", default, deserialize_with = "source::lenient_cell")]
    pub result: String, // "3-1"
    #[serde(rename = "Parziali", default, deserialize_with = "source::lenient_cell")]
    pub set_scores: String, // "(25-20) (25-18) ..."
}

impl MatchRow {
    pub fn status(&self) -> MatchStatus {
        MatchStatus::parse(&self.status_label)
    }

    /// Sets won by each side, when `result` is well formed.
    pub fn set_result(&self) -> Option<SetResult> {
        SetResult::parse(&self.result)
    }

    pub fn set_points(&self) -> Vec<SetPoints> {
        score::parse_set_points(&self.set_scores)
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        date::parse_match_date(&self.date)
    }

    pub fn parsed_time(&self) -> Option<NaiveTime> {
        date::parse_match_time(&self.time)
    }

    pub fn has_result(&self) -> bool {
        !self.result.trim().is_empty()
    }

    /// Short human label used in logs: "HOME vs AWAY (date)".
    pub fn describe(&self) -> String {
        format!("{} vs {} ({})", self.home_team, self.away_team, self.date)
    }
}

// ---------------------------------------------------------------------------
// Club configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClubConfig {
    #[serde(default)]
    pub team: TeamIdentity,
    /// Numeric tag found in a team name ("#12") -> category label.
    #[serde(rename = "categories", default)]
    pub category_by_tag: HashMap<String, String>,
    #[serde(default)]
    pub output: Option<OutputFiles>,
}

impl ClubConfig {
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            team: TeamIdentity {
                match_patterns: patterns.into_iter().map(Into::into).collect(),
                ..TeamIdentity::default()
            },
            ..Self::default()
        }
    }

    pub fn with_category(mut self, tag: impl Into<String>, label: impl Into<String>) -> Self {
        self.category_by_tag.insert(tag.into(), label.into());
        self
    }

    pub fn match_patterns(&self) -> &[String] {
        &self.team.match_patterns
    }

    /// A config with no patterns tracks nothing; callers should read an empty
    /// stats map as a likely configuration problem.
    pub fn tracks_anything(&self) -> bool {
        self.team.match_patterns.iter().any(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamIdentity {
    #[serde(default = "default_club_name")]
    pub name: String,
    #[serde(default)]
    pub match_patterns: Vec<String>,
}

impl Default for TeamIdentity {
    fn default() -> Self {
        Self { name: default_club_name(), match_patterns: Vec::new() }
    }
}

fn default_club_name() -> String {
    "RM Volley".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFiles {
    pub matches_file: Option<String>,
    pub standings_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Aggregated per-team statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Form {
    #[serde(rename = "W")]
    W,
    #[serde(rename = "L")]
    L,
}

impl Form {
    pub fn as_char(self) -> char {
        match self {
            Form::W => 'W',
            Form::L => 'L',
        }
    }
}

impl From<Outcome> for Form {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Win => Form::W,
            Outcome::Loss => Form::L,
        }
    }
}

/// A row retained under a team, tagged with the side that team played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMatch {
    #[serde(flatten)]
    pub row: MatchRow,
    #[serde(rename = "isHome")]
    pub is_home: bool,
}

impl TeamMatch {
    pub fn side(&self) -> Side {
        if self.is_home { Side::Home } else { Side::Away }
    }

    pub fn opponent(&self) -> &str {
        if self.is_home { &self.row.away_team } else { &self.row.home_team }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub name: String,
    pub category: String,
    pub total_matches: u32,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub home_wins: u32,
    pub away_wins: u32,
    pub home_losses: u32,
    pub away_losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub points_scored: u32,
    pub points_conceded: u32,
    /// Positive: consecutive wins; negative: consecutive losses.
    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub recent_form: Vec<Form>,
    pub matches: Vec<TeamMatch>,
}

impl TeamStats {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn recent_form_string(&self) -> String {
        self.recent_form.iter().map(|f| f.as_char()).collect()
    }
}
