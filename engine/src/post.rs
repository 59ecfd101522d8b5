use chrono::{Days, NaiveDate};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;

use crate::date::{self, MissingDatePolicy};
use crate::query::involves_tracked_team;
use crate::resolver::is_tracked_team;
use crate::score::{Outcome, match_result};
use crate::{ClubConfig, MatchRow};

const HEADER: &str = "🏐 RISULTATI SETTIMANALI 🏐\n\n";
const UNKNOWN_LEAGUE: &str = "Altro";
const LOOKBACK_DAYS: u64 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    InvalidRange { start: NaiveDate, end: NaiveDate },
    NoMatches { in_range: usize, tracked: usize },
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostError::InvalidRange { start, end } => {
                write!(f, "Invalid range: {start} is after {end}")
            }
            PostError::NoMatches { in_range, tracked } => write!(
                f,
                "Nessuna partita trovata ({in_range} partite nel periodo, {tracked} del club)"
            ),
        }
    }
}

impl std::error::Error for PostError {}

/// Emoji shown in front of each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Won, and won the previous match too.
    OnFire,
    Win,
    Loss,
}

impl Trend {
    pub fn new(current: Option<Outcome>, previous: Option<Outcome>) -> Self {
        match (current, previous) {
            (Some(Outcome::Win), Some(Outcome::Win)) => Trend::OnFire,
            (Some(Outcome::Win), _) => Trend::Win,
            _ => Trend::Loss,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Trend::OnFire => "🔥",
            Trend::Win => "🟢",
            Trend::Loss => "🔻",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPost {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub text: String,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub categories: usize,
}

/// The week ending today.
pub fn default_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Days::new(7), today)
}

/// Build the weekly results post for completed fixtures dated in `[start, end]`.
pub fn weekly_post(
    rows: &[MatchRow],
    config: &ClubConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<WeeklyPost, PostError> {
    if end < start {
        return Err(PostError::InvalidRange { start, end });
    }

    let completed_between = |from: NaiveDate, to_inclusive: Option<NaiveDate>| {
        rows.iter().filter(move |row| {
            row.status().is_final()
                && row
                    .parsed_date()
                    .is_some_and(|d| d >= from && to_inclusive.is_none_or(|to| d <= to))
        })
    };

    let week: Vec<&MatchRow> = completed_between(start, Some(end)).collect();
    let tracked: Vec<&MatchRow> = week
        .iter()
        .copied()
        .filter(|row| involves_tracked_team(row, config))
        .collect();
    debug!("weekly post {start}..={end}: {} completed, {} tracked", week.len(), tracked.len());

    if tracked.is_empty() {
        return Err(PostError::NoMatches { in_range: week.len(), tracked: 0 });
    }

    let mut by_league: BTreeMap<&str, Vec<&MatchRow>> = BTreeMap::new();
    for row in tracked.iter().copied() {
        let league = row.league.trim();
        let league = if league.is_empty() { UNKNOWN_LEAGUE } else { league };
        by_league.entry(league).or_default().push(row);
    }

    let lookback_start = start - Days::new(LOOKBACK_DAYS);
    let mut previous: Vec<&MatchRow> = completed_between(lookback_start, None)
        .filter(|row| row.parsed_date().is_some_and(|d| d < start))
        .collect();
    date::sort_by_date_desc(&mut previous, MissingDatePolicy::Last, |row| row.parsed_date());

    let mut text = String::from(HEADER);
    let mut wins = 0;
    for (league, league_rows) in &by_league {
        for row in league_rows {
            let team = if is_tracked_team(&row.home_team, config) {
                &row.home_team
            } else {
                &row.away_team
            };
            let current = match_result(row, team, config);
            let last = previous
                .iter()
                .find(|prev| played_by(prev, team, config))
                .and_then(|prev| match_result(prev, team, config));
            if current == Some(Outcome::Win) {
                wins += 1;
            }

            let trend = Trend::new(current, last);
            let score = if row.result.trim().is_empty() { "?" } else { row.result.as_str() };
            text.push_str(&format!("{} {}\n", trend.emoji(), league.to_uppercase()));
            text.push_str(&format!("{} 🆚 {} → {}\n", row.home_team, row.away_team, score));
            if !row.set_scores.trim().is_empty() {
                text.push_str(&format!("({})\n", row.set_scores.replace(',', ", ")));
            }
            text.push('\n');
        }
    }

    Ok(WeeklyPost {
        start,
        end,
        text,
        total: tracked.len(),
        wins,
        losses: tracked.len() - wins,
        categories: by_league.len(),
    })
}

fn played_by(row: &MatchRow, team: &str, config: &ClubConfig) -> bool {
    (row.home_team == team && is_tracked_team(&row.home_team, config))
        || (row.away_team == team && is_tracked_team(&row.away_team, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, league: &str, home: &str, away: &str, result: &str, sets: &str) -> MatchRow {
        MatchRow {
            date: date.into(),
            league: league.into(),
            home_team: home.into(),
            away_team: away.into(),
            status_label: "gara omologata".into(),
            result: result.into(),
            set_scores: sets.into(),
            ..MatchRow::default()
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config() -> ClubConfig {
        ClubConfig::with_patterns(["RM VOLLEY"])
    }

    #[test]
    fn formats_groups_sorted_by_league() {
        let rows = vec![
            row("08/03/2025", "Under 14 F", "Alfa", "RM VOLLEY #14", "1-3", "25-20,20-25"),
            row("09/03/2025", "Serie D", "RM VOLLEY #18", "Beta", "0-3", ""),
            row("09/03/2025", "Serie D", "Gamma", "Delta", "3-0", ""),
        ];
        let post = weekly_post(&rows, &config(), d(2025, 3, 3), d(2025, 3, 10)).unwrap();
        let expected = "🏐 RISULTATI SETTIMANALI 🏐\n\n\
            🔻 SERIE D\nRM VOLLEY #18 🆚 Beta → 0-3\n\n\
            🟢 UNDER 14 F\nAlfa 🆚 RM VOLLEY #14 → 1-3\n(25-20, 20-25)\n\n";
        assert_eq!(post.text, expected);
        assert_eq!((post.total, post.wins, post.losses, post.categories), (2, 1, 1, 2));
    }

    #[test]
    fn win_after_previous_win_is_on_fire() {
        let rows = vec![
            row("01/03/2025", "Serie D", "RM VOLLEY #18", "Old", "3-1", ""),
            row("22/02/2025", "Serie D", "RM VOLLEY #18", "Older", "0-3", ""),
            row("08/03/2025", "Serie D", "Beta", "RM VOLLEY #18", "2-3", ""),
        ];
        let post = weekly_post(&rows, &config(), d(2025, 3, 3), d(2025, 3, 10)).unwrap();
        assert!(post.text.contains("🔥 SERIE D\n"));
    }

    #[test]
    fn previous_result_outside_lookback_is_ignored() {
        let rows = vec![
            row("10/02/2025", "Serie D", "RM VOLLEY #18", "Old", "3-1", ""),
            row("08/03/2025", "Serie D", "RM VOLLEY #18", "Beta", "3-0", ""),
        ];
        let post = weekly_post(&rows, &config(), d(2025, 3, 3), d(2025, 3, 10)).unwrap();
        assert!(post.text.contains("🟢 SERIE D\n"));
    }

    #[test]
    fn missing_league_and_result_fall_back() {
        let mut unscored = row("05/03/2025", "", "RM VOLLEY #12", "Alfa", "", "");
        unscored.status_label = "risultato ufficioso".into();
        let post = weekly_post(&[unscored], &config(), d(2025, 3, 3), d(2025, 3, 10)).unwrap();
        assert!(post.text.contains("🔻 ALTRO\nRM VOLLEY #12 🆚 Alfa → ?\n\n"));
        assert_eq!(post.losses, 1);
    }

    #[test]
    fn range_bounds_are_inclusive_and_need_final_status() {
        let mut pending = row("05/03/2025", "Serie D", "RM VOLLEY #18", "Beta", "", "");
        pending.status_label = "Da disputare".into();
        let rows = vec![
            row("03/03/2025", "Serie D", "RM VOLLEY #18", "First", "3-0", ""),
            row("10/03/2025", "Serie D", "RM VOLLEY #18", "Last", "3-0", ""),
            row("11/03/2025", "Serie D", "RM VOLLEY #18", "After", "3-0", ""),
            pending,
        ];
        let post = weekly_post(&rows, &config(), d(2025, 3, 3), d(2025, 3, 10)).unwrap();
        assert_eq!(post.total, 2);
        assert!(post.text.contains("First") && post.text.contains("Last"));
        assert!(!post.text.contains("After") && !post.text.contains("Beta"));
    }

    #[test]
    fn errors_for_bad_range_or_no_club_matches() {
        let rows = vec![row("05/03/2025", "Serie D", "Gamma", "Delta", "3-0", "")];
        assert_eq!(
            weekly_post(&rows, &config(), d(2025, 3, 10), d(2025, 3, 3)),
            Err(PostError::InvalidRange { start: d(2025, 3, 10), end: d(2025, 3, 3) })
        );
        assert_eq!(
            weekly_post(&rows, &config(), d(2025, 3, 3), d(2025, 3, 10)),
            Err(PostError::NoMatches { in_range: 1, tracked: 0 })
        );
    }

    #[test]
    fn default_week_ends_today() {
        assert_eq!(default_week(d(2025, 3, 10)), (d(2025, 3, 3), d(2025, 3, 10)));
    }
}
