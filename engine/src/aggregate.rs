use log::{debug, warn};

use crate::date::{self, MissingDatePolicy};
use crate::resolver::{derive_category, is_tracked_team};
use crate::score::{Outcome, Side};
use crate::{ClubConfig, Form, MatchRow, TeamMatch, TeamStats, TeamStatsMap};

/// Rows per accumulation batch when the caller wants to yield between batches.
pub const BATCH_SIZE: usize = 50;

/// Length `recent_form` is cut to once all rows are in.
pub const RECENT_FORM_LEN: usize = 5;

/// How a fixture between two tracked teams is attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InternalFixturePolicy {
    /// `homeSidePriorityOnInternalFixtures`: only the home team is credited; the
    /// away team's participation is dropped. Matches the dashboard's historical
    /// numbers.
    #[default]
    HomeSidePriority,
    /// Credit the row to both teams, each from its own side.
    BothSides,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub internal_fixtures: InternalFixturePolicy,
    pub missing_dates: MissingDatePolicy,
}

/// Fold `rows` into per-team statistics for every tracked team.
pub fn aggregate(rows: &[MatchRow], config: &ClubConfig) -> TeamStatsMap {
    aggregate_with(rows, config, AggregateOptions::default())
}

pub fn aggregate_with(
    rows: &[MatchRow],
    config: &ClubConfig,
    options: AggregateOptions,
) -> TeamStatsMap {
    let mut aggregator = StatsAggregator::new(config, options);
    aggregator.discover(rows);
    for batch in rows.chunks(BATCH_SIZE) {
        aggregator.accumulate(batch);
    }
    aggregator.finish()
}

/// Streaming form of [`aggregate`]: discover, feed batches in row order, finish.
///
/// Streaks and recent form depend on the order batches are fed in; batches must
/// be given in the original row order and never in parallel.
#[derive(Debug)]
pub struct StatsAggregator<'a> {
    config: &'a ClubConfig,
    options: AggregateOptions,
    teams: TeamStatsMap,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(config: &'a ClubConfig, options: AggregateOptions) -> Self {
        if !config.tracks_anything() {
            warn!("club config has no match patterns; no team will be tracked");
        }
        Self { config, options, teams: TeamStatsMap::new() }
    }

    /// Phase 1: create an empty entry for every tracked name on either side of any row.
    pub fn discover(&mut self, rows: &[MatchRow]) {
        for row in rows {
            for name in [&row.home_team, &row.away_team] {
                if is_tracked_team(name, self.config) {
                    self.ensure_team(name);
                }
            }
        }
        debug!("discovered {} tracked teams", self.teams.len());
    }

    /// Phase 2: fold one batch of rows, in order.
    pub fn accumulate(&mut self, batch: &[MatchRow]) {
        for row in batch {
            self.accumulate_row(row);
        }
    }

    /// Phase 3: trim recent form and sort each team's matches newest first.
    pub fn finish(mut self) -> TeamStatsMap {
        let policy = self.options.missing_dates;
        for team in self.teams.values_mut() {
            let excess = team.recent_form.len().saturating_sub(RECENT_FORM_LEN);
            team.recent_form.drain(..excess);
            date::sort_by_date_desc(&mut team.matches, policy, |m| m.row.parsed_date());
        }
        self.teams
    }

    fn ensure_team(&mut self, name: &str) -> &mut TeamStats {
        let config = self.config;
        self.teams
            .entry(name.to_string())
            .or_insert_with(|| TeamStats::new(name, derive_category(name, config)))
    }

    fn accumulate_row(&mut self, row: &MatchRow) {
        let is_home_tracked = is_tracked_team(&row.home_team, self.config);
        let is_away_tracked = is_tracked_team(&row.away_team, self.config);

        match (is_home_tracked, is_away_tracked) {
            (false, false) => {}
            (true, false) => self.credit(row, Side::Home),
            (false, true) => self.credit(row, Side::Away),
            (true, true) => match self.options.internal_fixtures {
                InternalFixturePolicy::HomeSidePriority => self.credit(row, Side::Home),
                InternalFixturePolicy::BothSides => {
                    self.credit(row, Side::Home);
                    self.credit(row, Side::Away);
                }
            },
        }
    }

    fn credit(&mut self, row: &MatchRow, side: Side) {
        let name = match side {
            Side::Home => &row.home_team,
            Side::Away => &row.away_team,
        };
        let team = self.ensure_team(name);
        let is_home = side == Side::Home;

        team.total_matches += 1;
        team.matches.push(TeamMatch { row: row.clone(), is_home });

        let Some(result) = row.set_result() else {
            if row.has_result() {
                debug!("ignoring malformed result {:?} in {}", row.result, row.describe());
            }
            return;
        };

        team.played += 1;
        let (own_sets, opp_sets) = result.for_side(side);
        // Sheet values are unbounded; saturate rather than overflow.
        team.sets_won = team.sets_won.saturating_add(own_sets);
        team.sets_lost = team.sets_lost.saturating_add(opp_sets);

        for set in row.set_points() {
            let (own, opp) = set.for_side(side);
            team.points_scored = team.points_scored.saturating_add(own);
            team.points_conceded = team.points_conceded.saturating_add(opp);
        }

        if result.is_tie() {
            warn!(
                "equal set count {} in {}; counted as a loss for {}",
                row.result,
                row.describe(),
                team.name
            );
        }

        let outcome = Outcome::for_side(result, side);
        match (outcome, side) {
            (Outcome::Win, Side::Home) => team.home_wins += 1,
            (Outcome::Win, Side::Away) => team.away_wins += 1,
            (Outcome::Loss, Side::Home) => team.home_losses += 1,
            (Outcome::Loss, Side::Away) => team.away_losses += 1,
        }
        match outcome {
            Outcome::Win => {
                team.wins += 1;
                team.current_streak = team.current_streak.max(0) + 1;
            }
            Outcome::Loss => {
                team.losses += 1;
                team.current_streak = team.current_streak.min(0) - 1;
            }
        }
        team.recent_form.push(Form::from(outcome));
        team.longest_win_streak = team.longest_win_streak.max(team.current_streak.max(0) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClubConfig {
        ClubConfig::with_patterns(["RM VOLLEY"]).with_category("12", "Under 12 F")
    }

    fn row(home: &str, away: &str, result: &str, sets: &str) -> MatchRow {
        MatchRow {
            home_team: home.into(),
            away_team: away.into(),
            result: result.into(),
            set_scores: sets.into(),
            status_label: if result.is_empty() { "Da disputare" } else { "gara omologata" }.into(),
            ..MatchRow::default()
        }
    }

    fn dated(mut row: MatchRow, date: &str) -> MatchRow {
        row.date = date.into();
        row
    }

    fn scenario_a_row() -> MatchRow {
        row("RM VOLLEY #12", "Team X", "3-1", "(25-20) (25-18) (20-25) (25-22)")
    }

    #[test]
    fn scenario_a_single_home_win() {
        let stats = aggregate(&[scenario_a_row()], &config());
        assert_eq!(stats.len(), 1);
        let team = &stats["RM VOLLEY #12"];
        assert_eq!(team.category, "Under 12 F");
        assert_eq!(team.total_matches, 1);
        assert_eq!(team.played, 1);
        assert_eq!(team.wins, 1);
        assert_eq!(team.losses, 0);
        assert_eq!(team.home_wins, 1);
        assert_eq!(team.sets_won, 3);
        assert_eq!(team.sets_lost, 1);
        assert_eq!(team.points_scored, 95);
        assert_eq!(team.points_conceded, 85);
        assert_eq!(team.current_streak, 1);
        assert_eq!(team.longest_win_streak, 1);
        assert_eq!(team.recent_form, vec![Form::W]);
        assert!(team.matches[0].is_home);
    }

    #[test]
    fn scenario_b_win_then_home_loss() {
        let rows = [scenario_a_row(), row("RM VOLLEY #12", "Team Y", "1-3", "")];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.played, 2);
        assert_eq!(team.wins, 1);
        assert_eq!(team.losses, 1);
        assert_eq!(team.home_losses, 1);
        assert_eq!(team.current_streak, -1);
        assert_eq!(team.longest_win_streak, 1);
        assert_eq!(team.recent_form, vec![Form::W, Form::L]);
    }

    #[test]
    fn scenario_c_unplayed_row_counts_only_as_fixture() {
        let rows = [row("RM VOLLEY #12", "Team X", "", "")];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.total_matches, 1);
        assert_eq!(team.played, 0);
        assert_eq!(team.matches.len(), 1);
        assert!(team.recent_form.is_empty());
    }

    // Documents existing behavior: an impossible equal-sets result is scored as
    // a loss for the evaluated side rather than rejected.
    #[test]
    fn scenario_d_equal_sets_counts_as_loss_existing_behavior() {
        let rows = [row("RM VOLLEY #12", "Team X", "2-2", "")];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.played, 1);
        assert_eq!(team.losses, 1);
        assert_eq!(team.home_losses, 1);
        assert_eq!(team.wins, 0);
        assert_eq!(team.current_streak, -1);
    }

    #[test]
    fn scenario_e_internal_fixture_credits_home_side_only() {
        let rows = [row("RM VOLLEY #12", "RM VOLLEY #18", "3-0", "")];
        let stats = aggregate(&rows, &config());
        assert_eq!(stats.len(), 2, "both tracked teams are still discovered");
        assert_eq!(stats["RM VOLLEY #12"].total_matches, 1);
        assert_eq!(stats["RM VOLLEY #12"].wins, 1);
        let away = &stats["RM VOLLEY #18"];
        assert_eq!(away.total_matches, 0);
        assert_eq!(away.played, 0);
        assert!(away.matches.is_empty());
    }

    #[test]
    fn internal_fixture_can_credit_both_sides() {
        let rows = [row("RM VOLLEY #12", "RM VOLLEY #18", "3-0", "(25-10) (25-10) (25-10)")];
        let options = AggregateOptions {
            internal_fixtures: InternalFixturePolicy::BothSides,
            ..AggregateOptions::default()
        };
        let stats = aggregate_with(&rows, &config(), options);
        let home = &stats["RM VOLLEY #12"];
        let away = &stats["RM VOLLEY #18"];
        assert_eq!((home.wins, home.points_scored), (1, 75));
        assert_eq!((away.losses, away.away_losses, away.points_scored), (1, 1, 30));
        assert!(!away.matches[0].is_home);
    }

    #[test]
    fn away_side_attribution() {
        let rows = [row("Team X", "RM VOLLEY #12", "1-3", "(20-25) (25-23) (18-25) (22-25)")];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.away_wins, 1);
        assert_eq!((team.sets_won, team.sets_lost), (3, 1));
        assert_eq!((team.points_scored, team.points_conceded), (98, 85));
        assert!(!team.matches[0].is_home);
    }

    #[test]
    fn untracked_rows_contribute_nothing() {
        let rows = [row("Team X", "Team Y", "3-0", "")];
        assert!(aggregate(&rows, &config()).is_empty());
    }

    #[test]
    fn empty_config_yields_empty_map() {
        let rows = [scenario_a_row()];
        assert!(aggregate(&rows, &ClubConfig::default()).is_empty());
    }

    #[test]
    fn malformed_result_and_set_tokens_degrade_gracefully() {
        let rows = [
            row("RM VOLLEY #12", "Team X", "3-", "(25-20)"),
            row("RM VOLLEY #12", "Team X", "3-0", "(25-20) (abc) (25-1x) (25-18)"),
        ];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.total_matches, 2);
        assert_eq!(team.played, 1);
        assert_eq!((team.points_scored, team.points_conceded), (50, 38));
    }

    #[test]
    fn oversized_counts_saturate() {
        let rows = [
            row("RM VOLLEY #12", "Team X", "3-0", "(4294967295-1)"),
            row("RM VOLLEY #12", "Team X", "3-0", "(25-20)"),
        ];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.points_scored, u32::MAX);
        assert_eq!(team.points_conceded, 21);
        assert_eq!(team.wins, 2);

        let rows = [
            row("RM VOLLEY #12", "Team X", "4294967295-0", ""),
            row("RM VOLLEY #12", "Team X", "3-0", ""),
        ];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.sets_won, u32::MAX);
        assert_eq!(team.played, 2);
        assert_eq!(team.set_rate_pct(), 100);
        assert!(team.points_per_set() == 0.0);
    }

    #[test]
    fn streaks_follow_row_order_not_dates() {
        let rows = [
            dated(row("RM VOLLEY #12", "A", "3-0", ""), "10/01/2025"),
            dated(row("RM VOLLEY #12", "B", "3-1", ""), "01/01/2025"),
            dated(row("RM VOLLEY #12", "C", "3-2", ""), "20/01/2025"),
            dated(row("RM VOLLEY #12", "D", "0-3", ""), "05/01/2025"),
        ];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.longest_win_streak, 3);
        assert_eq!(team.current_streak, -1);
        assert_eq!(team.recent_form_string(), "WWWL");
    }

    #[test]
    fn recent_form_keeps_last_five() {
        let results = ["3-0", "0-3", "3-1", "3-2", "1-3", "3-0", "3-0"];
        let rows: Vec<_> = results.iter().map(|r| row("RM VOLLEY #12", "X", r, "")).collect();
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        assert_eq!(team.recent_form_string(), "WWLWW");
        assert_eq!(team.current_streak, 2);
        assert_eq!(team.longest_win_streak, 2);
    }

    #[test]
    fn matches_sorted_newest_first_with_undated_last() {
        let rows = [
            dated(row("RM VOLLEY #12", "A", "3-0", ""), "10/01/2025"),
            dated(row("RM VOLLEY #12", "B", "", ""), ""),
            dated(row("RM VOLLEY #12", "C", "3-2", ""), "20/01/2025"),
        ];
        let team = &aggregate(&rows, &config())["RM VOLLEY #12"];
        let opponents: Vec<_> = team.matches.iter().map(|m| m.opponent()).collect();
        assert_eq!(opponents, vec!["C", "A", "B"]);
    }

    #[test]
    fn batched_accumulation_matches_one_shot() {
        let rows: Vec<_> = (0..137)
            .map(|i| {
                let result = if i % 3 == 0 { "0-3" } else { "3-1" };
                let team = if i % 2 == 0 { "RM VOLLEY #12" } else { "RM VOLLEY #18" };
                row(team, "Opp", result, "(25-20)")
            })
            .collect();
        let config = config();
        let expected = aggregate(&rows, &config);

        let mut streaming = StatsAggregator::new(&config, AggregateOptions::default());
        streaming.discover(&rows);
        for batch in rows.chunks(7) {
            streaming.accumulate(batch);
        }
        assert_eq!(streaming.finish(), expected);
    }

    #[test]
    fn accumulate_without_discover_still_creates_teams() {
        let config = config();
        let mut aggregator = StatsAggregator::new(&config, AggregateOptions::default());
        aggregator.accumulate(&[scenario_a_row()]);
        let stats = aggregator.finish();
        assert_eq!(stats["RM VOLLEY #12"].category, "Under 12 F");
    }

    #[test]
    fn aggregate_is_idempotent() {
        let rows = [
            scenario_a_row(),
            row("Team Z", "RM VOLLEY #18", "3-2", "(25-20)"),
            row("RM VOLLEY #12", "RM VOLLEY #18", "", ""),
        ];
        let config = config();
        assert_eq!(aggregate(&rows, &config), aggregate(&rows, &config));
    }

    #[test]
    fn invariants_hold_over_mixed_input() {
        let config = config();
        let results = ["3-0", "", "2-3", "x", "1-3", "3-2", "2-2", "3-1"];
        let rows: Vec<_> = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                if i % 2 == 0 {
                    row("RM VOLLEY #12", "Opp", r, "(25-20) (18-25)")
                } else {
                    row("Opp", "rm  volley #12", r, "25-23")
                }
            })
            .collect();
        let stats = aggregate(&rows, &config);
        for (name, team) in &stats {
            assert!(is_tracked_team(name, &config));
            assert_eq!(team.wins + team.losses, team.played);
            assert!(team.played <= team.total_matches);
            assert_eq!(team.home_wins + team.away_wins, team.wins);
            assert_eq!(team.home_losses + team.away_losses, team.losses);
            assert!(team.recent_form.len() <= RECENT_FORM_LEN);
            assert_eq!(team.recent_form.len(), (team.played as usize).min(RECENT_FORM_LEN));
            assert!(team.longest_win_streak as i32 >= team.current_streak.max(0));
        }
    }
}
