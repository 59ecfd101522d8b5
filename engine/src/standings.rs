use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::ClubConfig;
use crate::resolver::is_tracked_team;
use crate::source::{lenient_cell, lenient_count};

/// League picked by default when present.
const PREFERRED_LEAGUE: &str = "Serie D";

/// One line of a league table, keyed by the standings export's column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    #[serde(rename = "Pos.", default, deserialize_with = "lenient_count")]
    pub position: u32,
    #[serde(rename = "Squadra", default, deserialize_with = "lenient_cell")]
    pub team: String,
    #[serde(rename = "Punti", default, deserialize_with = "lenient_count")]
    pub points: u32,
    #[serde(rename = "PG", default, deserialize_with = "lenient_count")]
    pub played: u32,
    #[serde(rename = "PV", default, deserialize_with = "lenient_count")]
    pub won: u32,
    #[serde(rename = "PP", default, deserialize_with = "lenient_count")]
    pub lost: u32,
    #[serde(rename = "SF", default, deserialize_with = "lenient_count")]
    pub sets_won: u32,
    #[serde(rename = "SS", default, deserialize_with = "lenient_count")]
    pub sets_lost: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueTable {
    pub league: String,
    pub rows: Vec<StandingRow>,
}

impl LeagueTable {
    pub fn is_highlighted(&self, row: &StandingRow, config: &ClubConfig) -> bool {
        is_tracked_team(&row.team, config)
    }

    pub fn tracked_rows<'a>(
        &'a self,
        config: &'a ClubConfig,
    ) -> impl Iterator<Item = &'a StandingRow> + 'a {
        self.rows.iter().filter(move |row| self.is_highlighted(row, config))
    }
}

/// All league tables, in the order the file lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Standings {
    pub leagues: Vec<LeagueTable>,
}

impl Standings {
    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn get(&self, league: &str) -> Option<&LeagueTable> {
        self.leagues.iter().find(|t| t.league == league)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.leagues.iter().map(|t| t.league.as_str())
    }

    /// Index of the first league whose name contains "Serie D", else 0.
    pub fn default_league_index(&self) -> Option<usize> {
        if self.leagues.is_empty() {
            return None;
        }
        Some(
            self.leagues
                .iter()
                .position(|t| t.league.contains(PREFERRED_LEAGUE))
                .unwrap_or(0),
        )
    }

    pub fn default_league(&self) -> Option<&LeagueTable> {
        self.default_league_index().map(|idx| &self.leagues[idx])
    }
}

// ---------------------------------------------------------------------------
// Serde: a JSON object `{ league: [rows] }`, order preserved
// ---------------------------------------------------------------------------

impl Serialize for Standings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.leagues.len()))?;
        for table in &self.leagues {
            map.serialize_entry(&table.league, &table.rows)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Standings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StandingsVisitor)
    }
}

struct StandingsVisitor;

impl<'de> Visitor<'de> for StandingsVisitor {
    type Value = Standings;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of league name to standing rows")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut leagues = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((league, rows)) = access.next_entry::<String, Option<Vec<StandingRow>>>()? {
            leagues.push(LeagueTable { league, rows: rows.unwrap_or_default() });
        }
        Ok(Standings { leagues })
    }
}
