//! Read-only views over rows and aggregated stats used by the dashboard.
//!
//! Nothing here reads the wall clock; callers pass `today` / `now`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::date::{self, MissingDatePolicy};
use crate::resolver::is_tracked_team;
use crate::score::{Outcome, match_result};
use crate::status::MatchStatus;
use crate::{ClubConfig, MatchRow, TeamStats, TeamStatsMap};

/// Sort key for rows without a kickoff time: after every timed match of the day.
const LATE_KICKOFF: &str = "23:59";

pub const RECENT_RESULTS_LIMIT: usize = 8;
pub const TIMELINE_LIMIT: usize = 10;

const LIVE_LEAD: Duration = Duration::minutes(10);
const CHAT_LEAD: Duration = Duration::hours(12);
const MATCH_LENGTH: Duration = Duration::hours(2);

pub fn todays_matches(rows: &[MatchRow], today: NaiveDate) -> Vec<&MatchRow> {
    let mut todays: Vec<&MatchRow> =
        rows.iter().filter(|row| row.parsed_date() == Some(today)).collect();
    todays.sort_by(|a, b| kickoff_sort_key(a).cmp(kickoff_sort_key(b)));
    todays
}

fn kickoff_sort_key(row: &MatchRow) -> &str {
    let time = row.time.trim();
    if time.is_empty() { LATE_KICKOFF } else { time }
}

/// Row date plus kickoff time; midnight when the time is missing or unreadable.
pub fn kickoff(row: &MatchRow) -> Option<NaiveDateTime> {
    let date = row.parsed_date()?;
    Some(date.and_time(row.parsed_time().unwrap_or(NaiveTime::MIN)))
}

pub fn is_live(row: &MatchRow, now: NaiveDateTime) -> bool {
    within(row, now, LIVE_LEAD)
}

pub fn chat_available(row: &MatchRow, now: NaiveDateTime) -> bool {
    within(row, now, CHAT_LEAD)
}

fn within(row: &MatchRow, now: NaiveDateTime, lead: Duration) -> bool {
    kickoff(row).is_some_and(|start| now >= start - lead && now <= start + MATCH_LENGTH)
}

/// Earliest fixture dated after `today` that isn't already ratified.
pub fn next_match(rows: &[MatchRow], today: NaiveDate) -> Option<&MatchRow> {
    rows.iter()
        .filter(|row| row.status() != MatchStatus::Ratified)
        .filter_map(|row| row.parsed_date().filter(|d| *d > today).map(|d| (d, row)))
        .min_by_key(|(d, _)| *d)
        .map(|(_, row)| row)
}

pub fn recent_results(rows: &[MatchRow], limit: usize, policy: MissingDatePolicy) -> Vec<&MatchRow> {
    let mut played: Vec<&MatchRow> = rows
        .iter()
        .filter(|row| row.status() != MatchStatus::ToBePlayed && row.has_result())
        .collect();
    date::sort_by_date_desc(&mut played, policy, |row| row.parsed_date());
    played.truncate(limit);
    played
}

/// Outcome from the tracked side's point of view, home side first.
pub fn result_badge(row: &MatchRow, config: &ClubConfig) -> Option<Outcome> {
    if is_tracked_team(&row.home_team, config) {
        match_result(row, &row.home_team, config)
    } else if is_tracked_team(&row.away_team, config) {
        match_result(row, &row.away_team, config)
    } else {
        None
    }
}

pub fn involves_tracked_team(row: &MatchRow, config: &ClubConfig) -> bool {
    is_tracked_team(&row.home_team, config) || is_tracked_team(&row.away_team, config)
}

// ---------------------------------------------------------------------------
// Match list filtering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Exact home or away team name.
    pub team: Option<String>,
    pub status: Option<MatchStatus>,
    /// Case-insensitive substring of home, away or venue.
    pub search: String,
}

impl MatchFilter {
    pub fn matches(&self, row: &MatchRow) -> bool {
        if let Some(team) = &self.team
            && row.home_team != *team
            && row.away_team != *team
        {
            return false;
        }
        if let Some(status) = &self.status
            && row.status() != *status
        {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || [&row.home_team, &row.away_team, &row.venue]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Rows passing `filter`; upcoming fixtures oldest first, everything else newest first.
pub fn filter_matches<'a>(
    rows: &'a [MatchRow],
    filter: &MatchFilter,
    policy: MissingDatePolicy,
) -> Vec<&'a MatchRow> {
    let mut filtered: Vec<&MatchRow> = rows.iter().filter(|row| filter.matches(row)).collect();
    if filter.status == Some(MatchStatus::ToBePlayed) {
        date::sort_by_date_asc(&mut filtered, policy, |row| row.parsed_date());
    } else {
        date::sort_by_date_desc(&mut filtered, policy, |row| row.parsed_date());
    }
    filtered
}

// ---------------------------------------------------------------------------
// Team figures
// ---------------------------------------------------------------------------

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        (f64::from(part) * 100.0 / f64::from(whole)).round() as u32
    }
}

impl TeamStats {
    pub fn win_rate_pct(&self) -> u32 {
        percent(self.wins, self.played)
    }

    pub fn set_rate_pct(&self) -> u32 {
        percent(self.sets_won, self.total_sets())
    }

    pub fn points_per_set(&self) -> f64 {
        let sets = self.total_sets();
        if sets == 0 { 0.0 } else { f64::from(self.points_scored) / f64::from(sets) }
    }

    pub fn to_play(&self) -> u32 {
        self.total_matches.saturating_sub(self.played)
    }

    fn total_sets(&self) -> u32 {
        self.sets_won.saturating_add(self.sets_lost)
    }

    fn win_ratio(&self) -> f64 {
        if self.played == 0 { 0.0 } else { f64::from(self.wins) / f64::from(self.played) }
    }
}

/// Teams by win ratio, best first; ties keep name order.
pub fn rank_by_win_rate(stats: &TeamStatsMap) -> Vec<&TeamStats> {
    let mut ranked: Vec<&TeamStats> = stats.values().collect();
    ranked.sort_by(|a, b| b.win_ratio().total_cmp(&a.win_ratio()));
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry<'a> {
    pub row: &'a MatchRow,
    pub opponent: &'a str,
    pub is_home: bool,
    pub outcome: Option<Outcome>,
}

/// Most recent played matches of a team, newest first.
pub fn team_timeline(team: &TeamStats, limit: usize) -> Vec<TimelineEntry<'_>> {
    team.matches
        .iter()
        .filter(|m| m.row.status() != MatchStatus::ToBePlayed && m.row.has_result())
        .take(limit)
        .map(|m| TimelineEntry {
            row: &m.row,
            opponent: m.opponent(),
            is_home: m.is_home,
            outcome: m.row.set_result().map(|r| Outcome::for_side(r, m.side())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;

    fn row(date: &str, time: &str, home: &str, away: &str, status: &str, result: &str) -> MatchRow {
        MatchRow {
            date: date.into(),
            time: time.into(),
            home_team: home.into(),
            away_team: away.into(),
            status_label: status.into(),
            result: result.into(),
            ..MatchRow::default()
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        date.and_hms_opt(h, min, 0).unwrap()
    }

    fn config() -> ClubConfig {
        ClubConfig::with_patterns(["RM VOLLEY"])
    }

    #[test]
    fn todays_matches_sorted_by_time_with_untimed_last() {
        let rows = vec![
            row("01/02/2025", "", "A", "B", "Da disputare", ""),
            row("01/02/2025", "20:30", "C", "D", "Da disputare", ""),
            row("02/02/2025", "10:00", "E", "F", "Da disputare", ""),
            row("01/02/2025", "18:00", "G", "H", "Da disputare", ""),
        ];
        let today: Vec<_> = todays_matches(&rows, d(2025, 2, 1)).iter().map(|r| &r.home_team).collect();
        assert_eq!(today, vec!["G", "C", "A"]);
    }

    #[test]
    fn live_window_opens_ten_minutes_early() {
        let match_row = row("01/02/2025", "20:30", "A", "B", "Da disputare", "");
        let day = d(2025, 2, 1);
        assert!(!is_live(&match_row, at(day, 20, 19)));
        assert!(is_live(&match_row, at(day, 20, 20)));
        assert!(is_live(&match_row, at(day, 22, 30)));
        assert!(!is_live(&match_row, at(day, 22, 31)));
    }

    #[test]
    fn chat_window_opens_twelve_hours_early() {
        let match_row = row("01/02/2025", "20:30", "A", "B", "Da disputare", "");
        let day = d(2025, 2, 1);
        assert!(chat_available(&match_row, at(day, 8, 30)));
        assert!(!chat_available(&match_row, at(day, 8, 29)));
        assert!(!chat_available(&row("", "20:30", "A", "B", "", ""), at(day, 20, 30)));
    }

    #[test]
    fn untimed_kickoff_is_midnight() {
        let match_row = row("01/02/2025", "", "A", "B", "Da disputare", "");
        assert_eq!(kickoff(&match_row), Some(at(d(2025, 2, 1), 0, 0)));
        assert!(is_live(&match_row, at(d(2025, 1, 31), 23, 55)));
    }

    #[test]
    fn next_match_skips_today_and_ratified() {
        let rows = vec![
            row("01/02/2025", "", "today", "x", "Da disputare", ""),
            row("05/02/2025", "", "ratified", "x", "gara omologata", "3-0"),
            row("09/02/2025", "", "later", "x", "Da disputare", ""),
            row("07/02/2025", "", "next", "x", "Da disputare", ""),
        ];
        let next = next_match(&rows, d(2025, 2, 1)).unwrap();
        assert_eq!(next.home_team, "next");
        assert!(next_match(&rows, d(2025, 3, 1)).is_none());
    }

    #[test]
    fn recent_results_newest_first_and_limited() {
        let mut rows: Vec<_> = (1..=10)
            .map(|day| row(&format!("{day:02}/01/2025"), "", &format!("T{day}"), "x", "gara omologata", "3-0"))
            .collect();
        rows.push(row("20/01/2025", "", "future", "x", "Da disputare", ""));
        rows.push(row("21/01/2025", "", "no result", "x", "risultato ufficioso", ""));

        let recent = recent_results(&rows, RECENT_RESULTS_LIMIT, MissingDatePolicy::Last);
        assert_eq!(recent.len(), 8);
        assert_eq!(recent[0].home_team, "T10");
        assert_eq!(recent[7].home_team, "T3");
    }

    #[test]
    fn badge_uses_tracked_side() {
        let config = config();
        let away_win = row("", "", "Other", "RM VOLLEY #12", "gara omologata", "1-3");
        assert_eq!(result_badge(&away_win, &config), Some(Outcome::Win));
        let home_loss = row("", "", "RM VOLLEY #12", "Other", "gara omologata", "1-3");
        assert_eq!(result_badge(&home_loss, &config), Some(Outcome::Loss));
        let internal = row("", "", "RM VOLLEY #12", "RM VOLLEY #18", "gara omologata", "1-3");
        assert_eq!(result_badge(&internal, &config), Some(Outcome::Loss));
        let foreign = row("", "", "A", "B", "gara omologata", "1-3");
        assert_eq!(result_badge(&foreign, &config), None);
    }

    #[test]
    fn filter_combines_team_status_and_search() {
        let mut rows = vec![
            row("01/01/2025", "", "RM VOLLEY #12", "Alfa", "gara omologata", "3-0"),
            row("08/01/2025", "", "Beta", "RM VOLLEY #12", "Da disputare", ""),
            row("03/01/2025", "", "RM VOLLEY #12", "Gamma", "Da disputare", ""),
            row("02/01/2025", "", "RM VOLLEY #18", "Alfa", "Da disputare", ""),
        ];
        rows[3].venue = "Palestra Gamma".into();

        let by_team = MatchFilter { team: Some("RM VOLLEY #12".into()), ..MatchFilter::default() };
        let found: Vec<_> = filter_matches(&rows, &by_team, MissingDatePolicy::Last)
            .iter()
            .map(|r| r.date.as_str())
            .collect();
        assert_eq!(found, vec!["08/01/2025", "03/01/2025", "01/01/2025"]);

        let upcoming = MatchFilter { status: Some(MatchStatus::ToBePlayed), ..by_team.clone() };
        let found: Vec<_> = filter_matches(&rows, &upcoming, MissingDatePolicy::Last)
            .iter()
            .map(|r| r.date.as_str())
            .collect();
        assert_eq!(found, vec!["03/01/2025", "08/01/2025"]);

        let search = MatchFilter { search: "GAMMA".into(), ..MatchFilter::default() };
        assert_eq!(filter_matches(&rows, &search, MissingDatePolicy::Last).len(), 2);
    }

    #[test]
    fn derived_figures_guard_zero_denominators() {
        let empty = TeamStats::new("RM VOLLEY #12", "");
        assert_eq!(empty.win_rate_pct(), 0);
        assert_eq!(empty.set_rate_pct(), 0);
        assert_eq!(empty.points_per_set(), 0.0);

        let team = TeamStats {
            total_matches: 5,
            played: 3,
            wins: 2,
            sets_won: 7,
            sets_lost: 5,
            points_scored: 270,
            ..TeamStats::new("RM VOLLEY #12", "")
        };
        assert_eq!(team.win_rate_pct(), 67);
        assert_eq!(team.set_rate_pct(), 58);
        assert_eq!(team.points_per_set(), 22.5);
        assert_eq!(team.to_play(), 2);
    }

    #[test]
    fn set_figures_saturate_on_huge_counts() {
        let team = TeamStats {
            sets_won: u32::MAX,
            sets_lost: 5,
            points_scored: 10,
            ..TeamStats::new("RM VOLLEY #12", "")
        };
        assert_eq!(team.set_rate_pct(), 100);
        assert!(team.points_per_set() < 1.0);
    }

    #[test]
    fn ranking_is_stable_over_names() {
        let rows = vec![
            row("", "", "RM VOLLEY C", "x", "gara omologata", "3-0"),
            row("", "", "RM VOLLEY A", "x", "gara omologata", "0-3"),
            row("", "", "RM VOLLEY B", "x", "gara omologata", "3-1"),
            row("", "", "RM VOLLEY D", "x", "Da disputare", ""),
        ];
        let stats = aggregate(&rows, &config());
        let ranked: Vec<_> = rank_by_win_rate(&stats).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(ranked, vec!["RM VOLLEY B", "RM VOLLEY C", "RM VOLLEY A", "RM VOLLEY D"]);
    }

    #[test]
    fn timeline_lists_played_matches_from_team_side() {
        let rows = vec![
            row("01/01/2025", "", "RM VOLLEY #12", "Alfa", "gara omologata", "3-0"),
            row("08/01/2025", "", "Beta", "RM VOLLEY #12", "gara omologata", "3-2"),
            row("15/01/2025", "", "RM VOLLEY #12", "Gamma", "Da disputare", ""),
        ];
        let stats = aggregate(&rows, &config());
        let timeline = team_timeline(&stats["RM VOLLEY #12"], TIMELINE_LIMIT);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].opponent, "Beta");
        assert!(!timeline[0].is_home);
        assert_eq!(timeline[0].outcome, Some(Outcome::Loss));
        assert_eq!(timeline[1].outcome, Some(Outcome::Win));
    }
}
